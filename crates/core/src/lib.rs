pub mod constants;
pub mod contact;
pub mod error;
pub mod events;
pub mod id;
pub mod incentive;
pub mod payment;
pub mod recipient;
pub mod reward;
pub mod status;
pub mod trigger;

pub use contact::ContactInfo;
pub use error::{IncentiveError, IncentiveResult};
pub use events::{CapturePublisher, EventPublisher, IncentiveEvent, IncentiveEventKind, NoOpPublisher};
pub use id::IncentiveId;
pub use incentive::{EligibilityCheck, Incentive, IncentiveSummary};
pub use payment::{PaymentExecution, PaymentMethod};
pub use recipient::{Recipient, VerificationStatus};
pub use reward::{Currency, Reward, RewardType};
pub use status::IncentiveStatus;
pub use trigger::Trigger;
