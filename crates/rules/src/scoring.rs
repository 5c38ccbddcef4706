//! Processing priority and abuse-risk scoring.
//!
//! Both scores are additive 0-100 with banded levels. They order work and
//! flag review candidates; neither blocks an operation by itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use incentive_core::constants::{
    INCENTIVE_EXPIRY_DAYS, MAX_REWARD_AMOUNT, RISK_HIGH_DAILY_USAGE, RISK_HIGH_WEEKLY_USAGE,
    RISK_SUSTAINED_ACTIVITY_DAYS,
};
use incentive_core::{Incentive, IncentiveStatus};

/// Activity snapshot for one IP, supplied by whoever tracks usage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageHistory {
    pub incentives_today: u32,
    pub incentives_this_week: u32,
    pub incentives_this_month: u32,
    pub consecutive_days_active: u32,
}

// ─── Processing Priority ────────────────────────────────────────────────────

/// Priority bands for payment-queue ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityScore {
    /// 0-100, higher processes first.
    pub score: u8,
    pub level: PriorityLevel,
}

/// Rank one incentive for the processing queue at `now`.
///
/// Additive components: reward amount (up to 30), time waiting (up to 25),
/// status (up to 20), and proximity to the payment deadline (up to 25).
pub fn processing_priority(incentive: &Incentive, now: DateTime<Utc>) -> PriorityScore {
    let mut score: u32 = 0;

    let amount = incentive.reward().amount;
    score += if amount >= 8.0 {
        30
    } else if amount >= 5.0 {
        20
    } else {
        10
    };

    let age_days = (now - incentive.created_at()).num_days();
    score += if age_days >= 7 {
        25
    } else if age_days >= 3 {
        15
    } else {
        5
    };

    score += match incentive.status() {
        IncentiveStatus::Approved => 20,
        IncentiveStatus::PendingValidation => 10,
        _ => 0,
    };

    let days_until_expiry = INCENTIVE_EXPIRY_DAYS - age_days;
    score += if days_until_expiry <= 3 {
        25
    } else if days_until_expiry <= 7 {
        15
    } else {
        0
    };

    let score = score.min(100) as u8;
    PriorityScore {
        score,
        level: priority_level(score),
    }
}

fn priority_level(score: u8) -> PriorityLevel {
    if score >= 80 {
        PriorityLevel::Urgent
    } else if score >= 60 {
        PriorityLevel::High
    } else if score >= 40 {
        PriorityLevel::Medium
    } else {
        PriorityLevel::Low
    }
}

// ─── Risk Assessment ────────────────────────────────────────────────────────

/// Abuse-likelihood bands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskAssessment {
    /// 0-100, higher means more suspicious.
    pub score: u8,
    pub level: RiskLevel,
    pub recommended_actions: Vec<String>,
}

/// Estimate how suspicious one incentive looks at `now`.
///
/// History-derived factors only fire when a snapshot is supplied; with
/// `None` the assessment works from the incentive alone.
pub fn assess_risk(
    incentive: &Incentive,
    history: Option<&UsageHistory>,
    now: DateTime<Utc>,
) -> RiskAssessment {
    let mut score: u32 = 0;

    if incentive.reward().amount >= MAX_REWARD_AMOUNT / 2.0 {
        score += 30;
    }

    if let Some(history) = history {
        if history.incentives_today >= RISK_HIGH_DAILY_USAGE {
            score += 25;
        }
        if history.incentives_this_week >= RISK_HIGH_WEEKLY_USAGE {
            score += 20;
        }
        if history.consecutive_days_active >= RISK_SUSTAINED_ACTIVITY_DAYS {
            score += 15;
        }
    }

    // Last-minute payment pressure invites gaming.
    let age_days = (now - incentive.created_at()).num_days();
    if INCENTIVE_EXPIRY_DAYS - age_days <= INCENTIVE_EXPIRY_DAYS / 10 {
        score += 10;
    }

    let score = score.min(100) as u8;
    let level = risk_level(score);
    RiskAssessment {
        score,
        level,
        recommended_actions: recommended_actions(level),
    }
}

fn risk_level(score: u8) -> RiskLevel {
    if score >= 75 {
        RiskLevel::Critical
    } else if score >= 50 {
        RiskLevel::High
    } else if score >= 25 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn recommended_actions(level: RiskLevel) -> Vec<String> {
    let actions: &[&str] = match level {
        RiskLevel::Critical => &[
            "Hold payment for manual review",
            "Verify recipient identity",
            "Audit all incentives from this IP",
        ],
        RiskLevel::High => &[
            "Require manual approval before payment",
            "Check usage history for this IP",
        ],
        RiskLevel::Medium => &["Flag for periodic review"],
        RiskLevel::Low => &["No action required"],
    };
    actions.iter().map(|a| a.to_string()).collect()
}
