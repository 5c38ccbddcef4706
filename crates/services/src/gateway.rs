//! Payment gateway boundary and the scripted mock used in tests.
//!
//! The gateway is one opaque async call that moves money. Retries, rail
//! selection quirks, and provider latency all live behind it; the service
//! layer only sees accepted or declined.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use incentive_core::{Currency, PaymentMethod};

pub type DynPaymentGateway = Arc<dyn PaymentGateway + Send + Sync>;

/// One transfer order handed to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    pub amount: f64,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    /// Payable handle for the recipient on the chosen rail.
    pub recipient_info: String,
    /// Caller reference echoed back by the provider; the incentive id.
    pub reference: String,
}

/// Provider verdict for one transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayResponse {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub error: Option<String>,
}

impl GatewayResponse {
    pub fn accepted(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
            error: None,
        }
    }

    pub fn declined(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            error: Some(error.into()),
        }
    }
}

/// The call that moves money.
#[async_trait]
pub trait PaymentGateway {
    async fn charge(&self, request: PaymentRequest) -> anyhow::Result<GatewayResponse>;
}

/// Scripted gateway for tests: per-reference outcomes, an optional blanket
/// failure, and a log of every request it saw. Unscripted references get a
/// fresh accepted transaction.
#[derive(Default)]
pub struct MockPaymentGateway {
    scripted: Mutex<HashMap<String, GatewayResponse>>,
    decline_all: Mutex<Option<String>>,
    requests: Mutex<Vec<PaymentRequest>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the outcome for one reference.
    pub fn script(&self, reference: &str, response: GatewayResponse) {
        self.scripted
            .lock()
            .expect("gateway mutex poisoned")
            .insert(reference.to_string(), response);
    }

    /// Decline everything with the given provider error.
    pub fn decline_all(&self, error: &str) {
        *self.decline_all.lock().expect("gateway mutex poisoned") = Some(error.to_string());
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().expect("gateway mutex poisoned").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("gateway mutex poisoned").len()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, request: PaymentRequest) -> anyhow::Result<GatewayResponse> {
        let reference = request.reference.clone();
        self.requests
            .lock()
            .expect("gateway mutex poisoned")
            .push(request);

        if let Some(error) = self
            .decline_all
            .lock()
            .expect("gateway mutex poisoned")
            .clone()
        {
            return Ok(GatewayResponse::declined(error));
        }
        if let Some(response) = self
            .scripted
            .lock()
            .expect("gateway mutex poisoned")
            .get(&reference)
        {
            return Ok(response.clone());
        }
        Ok(GatewayResponse::accepted(format!(
            "TXN-{}",
            Uuid::new_v4().simple()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(reference: &str) -> PaymentRequest {
        PaymentRequest {
            amount: 5.0,
            currency: Currency::Cny,
            payment_method: PaymentMethod::WechatPay,
            recipient_info: "wx_user_01".into(),
            reference: reference.into(),
        }
    }

    #[tokio::test]
    async fn test_unscripted_references_are_accepted() {
        let gateway = MockPaymentGateway::new();
        let response = gateway.charge(request("INC-1")).await.unwrap();
        assert!(response.success);
        assert!(response.transaction_id.unwrap().starts_with("TXN-"));
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_decline_wins_over_default() {
        let gateway = MockPaymentGateway::new();
        gateway.script("INC-1", GatewayResponse::declined("insufficient balance"));

        let declined = gateway.charge(request("INC-1")).await.unwrap();
        assert!(!declined.success);
        assert_eq!(declined.error.as_deref(), Some("insufficient balance"));

        let other = gateway.charge(request("INC-2")).await.unwrap();
        assert!(other.success);
    }

    #[tokio::test]
    async fn test_decline_all_applies_to_every_reference() {
        let gateway = MockPaymentGateway::new();
        gateway.decline_all("provider outage");

        for reference in ["INC-1", "INC-2"] {
            let response = gateway.charge(request(reference)).await.unwrap();
            assert!(!response.success);
            assert_eq!(response.error.as_deref(), Some("provider outage"));
        }
        assert_eq!(gateway.requests().len(), 2);
    }
}
