//! Payment vocabulary shared by the aggregate, rules, and gateway.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reward::Currency;

/// Supported payout rails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    WechatPay,
    Alipay,
    BankTransfer,
    /// Operator settles by hand; anything payable qualifies.
    Manual,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::WechatPay => "wechat_pay",
            PaymentMethod::Alipay => "alipay",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of asking the aggregate to settle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentExecution {
    pub success: bool,
    pub amount: f64,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub error: Option<String>,
}

impl PaymentExecution {
    pub fn settled(
        amount: f64,
        currency: Currency,
        payment_method: PaymentMethod,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            amount,
            currency,
            payment_method,
            transaction_id: Some(transaction_id.into()),
            error: None,
        }
    }

    pub fn refused(
        amount: f64,
        currency: Currency,
        payment_method: PaymentMethod,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            amount,
            currency,
            payment_method,
            transaction_id: None,
            error: Some(error.into()),
        }
    }
}
