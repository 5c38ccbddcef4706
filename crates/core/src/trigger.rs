//! What earned the incentive.

use serde::{Deserialize, Serialize};

/// The business event that justified an incentive. Frozen at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    QuestionnaireCompletion {
        questionnaire_id: String,
        /// 0-100 quality grade assigned by the survey pipeline.
        quality_score: u8,
    },
    Referral {
        referred_ip: String,
    },
    SystemPromotion,
}

impl Trigger {
    /// Wire token for the trigger type, as carried in events and audit
    /// payloads.
    pub fn trigger_type(&self) -> &'static str {
        match self {
            Trigger::QuestionnaireCompletion { .. } => "questionnaire_completion",
            Trigger::Referral { .. } => "referral",
            Trigger::SystemPromotion => "system_promotion",
        }
    }

    /// Payload completeness per variant. Cross-record rules (self-referral,
    /// duplicates) belong to the rule engine, not the value object.
    pub fn is_valid(&self) -> bool {
        match self {
            Trigger::QuestionnaireCompletion {
                questionnaire_id,
                quality_score,
            } => !questionnaire_id.is_empty() && *quality_score <= 100,
            Trigger::Referral { referred_ip } => !referred_ip.is_empty(),
            Trigger::SystemPromotion => true,
        }
    }
}
