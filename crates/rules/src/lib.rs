//! Business rules for the incentive program.
//!
//! Everything here is a pure function over explicit inputs: aggregates,
//! counts, and timestamps go in, verdicts come out. No I/O, no clocks read
//! behind the caller's back, no mutation. The numbers all come from
//! `incentive_core::constants`.

pub mod eligibility;
pub mod payment;
pub mod scoring;

pub use eligibility::{evaluate_creation, CreationEligibility, CreationRequest};
pub use payment::{
    check_method_compatibility, evaluate_payment, validate_batch, BatchValidation,
    PaymentEligibility,
};
pub use scoring::{
    assess_risk, processing_priority, PriorityLevel, PriorityScore, RiskAssessment, RiskLevel,
    UsageHistory,
};
