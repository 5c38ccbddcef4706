//! Creation-time eligibility rules.
//!
//! Pure functions over explicit inputs. Anything that needs persisted
//! state (daily counts, duplicate referrals) arrives as a parameter,
//! looked up by the caller.

use serde::{Deserialize, Serialize};
use validator::validate_ip_v4;

use incentive_core::constants::{
    MAX_DAILY_INCENTIVES_PER_IP, MIN_QUALITY_SCORE, REFERRAL_REWARD_AMOUNT,
};
use incentive_core::reward::quality_reward_amount;

/// What a caller wants to create, before any aggregate exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreationRequest {
    Questionnaire {
        ip: String,
        questionnaire_id: String,
        quality_score: u8,
    },
    Referral {
        referrer_ip: String,
        referred_ip: String,
    },
}

impl CreationRequest {
    /// The IP that would own the incentive, and the key for daily quotas.
    pub fn source_ip(&self) -> &str {
        match self {
            CreationRequest::Questionnaire { ip, .. } => ip,
            CreationRequest::Referral { referrer_ip, .. } => referrer_ip,
        }
    }
}

/// Verdict of the creation rules. `expected_reward` is zero whenever any
/// error is present, so callers can't accidentally bank an amount from an
/// ineligible request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreationEligibility {
    pub is_eligible: bool,
    pub errors: Vec<String>,
    pub expected_reward: f64,
}

/// Decide whether an incentive may be created for this request.
/// `todays_count` is how many incentives the source IP already earned
/// today. Violations accumulate; nothing short-circuits.
pub fn evaluate_creation(request: &CreationRequest, todays_count: u32) -> CreationEligibility {
    let mut errors = Vec::new();

    if !validate_ip_v4(request.source_ip()) {
        errors.push(format!("Invalid IPv4 address: {}", request.source_ip()));
    }
    if todays_count >= MAX_DAILY_INCENTIVES_PER_IP {
        errors.push(format!(
            "Daily limit reached: {todays_count} of {MAX_DAILY_INCENTIVES_PER_IP} incentives for this IP today"
        ));
    }

    let reward = match request {
        CreationRequest::Questionnaire {
            questionnaire_id,
            quality_score,
            ..
        } => {
            if questionnaire_id.is_empty() {
                errors.push("Questionnaire id is required".to_string());
            }
            if *quality_score > 100 {
                errors.push(format!("Quality score {quality_score} is out of range 0-100"));
            } else if *quality_score < MIN_QUALITY_SCORE {
                errors.push(format!(
                    "Quality score {quality_score} is below the minimum of {MIN_QUALITY_SCORE}"
                ));
            }
            quality_reward_amount(*quality_score)
        }
        CreationRequest::Referral {
            referrer_ip,
            referred_ip,
        } => {
            if referred_ip.is_empty() {
                errors.push("Referred IP is required".to_string());
            } else if !validate_ip_v4(referred_ip) {
                errors.push(format!("Invalid referred IPv4 address: {referred_ip}"));
            }
            if referrer_ip == referred_ip {
                errors.push("Self-referral is not allowed".to_string());
            }
            REFERRAL_REWARD_AMOUNT
        }
    };

    let is_eligible = errors.is_empty();
    CreationEligibility {
        is_eligible,
        errors,
        expected_reward: if is_eligible { reward } else { 0.0 },
    }
}
