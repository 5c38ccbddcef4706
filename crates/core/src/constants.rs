//! Program-level business constants.
//!
//! Every threshold the incentive program runs on lives here, so the
//! aggregate and the rule functions in `incentive-rules` agree on one set
//! of numbers. Amounts are in yuan unless a reward says otherwise.

/// Quality score at or above which a questionnaire incentive is
/// auto-approved at creation.
pub const STANDARD_QUALITY_THRESHOLD: u8 = 70;

/// Minimum quality score for a questionnaire incentive to be created at all.
pub const MIN_QUALITY_SCORE: u8 = 50;

/// How many incentives a single IP may earn per calendar day.
pub const MAX_DAILY_INCENTIVES_PER_IP: u32 = 3;

/// Smallest amount worth pushing through a payment rail.
pub const MIN_PAYOUT_AMOUNT: f64 = 5.0;

/// Hard ceiling on any single reward.
pub const MAX_REWARD_AMOUNT: f64 = 100.0;

/// An unpaid incentive lapses this many days after creation.
pub const INCENTIVE_EXPIRY_DAYS: i64 = 30;

/// Fixed reward for a confirmed referral.
pub const REFERRAL_REWARD_AMOUNT: f64 = 3.0;

// ─── Batch Payments ─────────────────────────────────────────────────────────

/// Upper bound on the number of items in one payment batch.
pub const MAX_BATCH_SIZE: usize = 100;

/// Batch totals above this get flagged for review before release.
pub const BATCH_TOTAL_WARNING_THRESHOLD: f64 = 10_000.0;

// ─── Risk Scoring ───────────────────────────────────────────────────────────

/// Daily incentive count at which an IP's activity reads as heavy.
pub const RISK_HIGH_DAILY_USAGE: u32 = 2;

/// Weekly incentive count at which an IP's activity reads as heavy.
pub const RISK_HIGH_WEEKLY_USAGE: u32 = 15;

/// Consecutive active days at which activity reads as farming.
pub const RISK_SUSTAINED_ACTIVITY_DAYS: u32 = 5;
