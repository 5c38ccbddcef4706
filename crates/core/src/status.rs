//! Incentive lifecycle states and the transition table that guards them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an incentive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncentiveStatus {
    /// Created, waiting for validation or manual approval.
    PendingValidation,
    /// Cleared for payment.
    Approved,
    /// Declined; re-rejection is a no-op rather than an error.
    Rejected,
    /// Money left the building. Terminal.
    Paid,
    /// Payment window lapsed before settlement.
    Expired,
}

/// Every transition the lifecycle permits, as `(from, to)` pairs. All
/// operations consult this table; none carries its own guard logic.
/// `Paid` has no outgoing edges. Any non-paid state may expire, and
/// rejection is legal from any non-paid state (including `Rejected`
/// itself, so repeated rejects stay idempotent).
const ALLOWED_TRANSITIONS: &[(IncentiveStatus, IncentiveStatus)] = &[
    (
        IncentiveStatus::PendingValidation,
        IncentiveStatus::Approved,
    ),
    (
        IncentiveStatus::PendingValidation,
        IncentiveStatus::Rejected,
    ),
    (IncentiveStatus::PendingValidation, IncentiveStatus::Expired),
    (IncentiveStatus::Approved, IncentiveStatus::Paid),
    (IncentiveStatus::Approved, IncentiveStatus::Rejected),
    (IncentiveStatus::Approved, IncentiveStatus::Expired),
    (IncentiveStatus::Rejected, IncentiveStatus::Rejected),
    (IncentiveStatus::Rejected, IncentiveStatus::Expired),
    (IncentiveStatus::Expired, IncentiveStatus::Rejected),
    (IncentiveStatus::Expired, IncentiveStatus::Expired),
];

impl IncentiveStatus {
    /// Returns `true` if the lifecycle permits moving from `self` to `to`.
    pub fn can_transition_to(self, to: IncentiveStatus) -> bool {
        ALLOWED_TRANSITIONS
            .iter()
            .any(|(from, target)| *from == self && *target == to)
    }

    /// Whether a payment can still settle this incentive.
    pub fn is_payable(self) -> bool {
        matches!(self, IncentiveStatus::Approved)
    }

    /// Wire token, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            IncentiveStatus::PendingValidation => "pending_validation",
            IncentiveStatus::Approved => "approved",
            IncentiveStatus::Rejected => "rejected",
            IncentiveStatus::Paid => "paid",
            IncentiveStatus::Expired => "expired",
        }
    }
}

impl Default for IncentiveStatus {
    fn default() -> Self {
        IncentiveStatus::PendingValidation
    }
}

impl fmt::Display for IncentiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
