use thiserror::Error;

use crate::status::IncentiveStatus;

pub type IncentiveResult<T> = Result<T, IncentiveError>;

/// Domain-rule violations raised by the incentive aggregate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error("Cannot approve incentive in {status} status")]
    ApprovalNotAllowed { status: IncentiveStatus },

    #[error("Cannot reject already paid incentive")]
    RejectPaidIncentive,

    #[error("Cannot transition incentive from {from} to {to}")]
    InvalidTransition {
        from: IncentiveStatus,
        to: IncentiveStatus,
    },
}
