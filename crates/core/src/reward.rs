//! Reward amounts and how they are derived.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MAX_REWARD_AMOUNT, REFERRAL_REWARD_AMOUNT};

/// Settlement currency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Cny,
    Usd,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Cny => "CNY",
            Currency::Usd => "USD",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Cny
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a reward was granted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    QuestionnaireCompletion,
    Referral,
    Promotion,
}

/// Tiered payout for a completed questionnaire, by quality score.
/// Scores below the creation minimum map to zero.
pub fn quality_reward_amount(score: u8) -> f64 {
    if score >= 90 {
        8.0
    } else if score >= 70 {
        5.0
    } else if score >= 50 {
        3.0
    } else {
        0.0
    }
}

fn quality_tier_label(score: u8) -> &'static str {
    if score >= 90 {
        "excellent"
    } else if score >= 70 {
        "standard"
    } else if score >= 50 {
        "basic"
    } else {
        "below_minimum"
    }
}

/// A granted reward. The amount is fixed when the reward is computed and
/// never changes afterwards; adjustments mean a new incentive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reward {
    pub amount: f64,
    pub currency: Currency,
    pub reward_type: RewardType,
    /// Human-readable note on how the amount was derived.
    pub calculation_method: String,
}

impl Reward {
    pub fn new(
        amount: f64,
        currency: Currency,
        reward_type: RewardType,
        calculation_method: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            currency,
            reward_type,
            calculation_method: calculation_method.into(),
        }
    }

    /// Reward for a questionnaire completion at the given quality score.
    pub fn for_quality_score(score: u8) -> Self {
        Self::new(
            quality_reward_amount(score),
            Currency::Cny,
            RewardType::QuestionnaireCompletion,
            format!(
                "quality score {} -> {} tier",
                score,
                quality_tier_label(score)
            ),
        )
    }

    /// Flat reward for a confirmed referral.
    pub fn for_referral() -> Self {
        Self::new(
            REFERRAL_REWARD_AMOUNT,
            Currency::Cny,
            RewardType::Referral,
            "fixed referral bonus",
        )
    }

    /// Amount is non-negative and within the program ceiling.
    pub fn is_valid(&self) -> bool {
        self.amount >= 0.0 && self.amount <= MAX_REWARD_AMOUNT
    }
}
