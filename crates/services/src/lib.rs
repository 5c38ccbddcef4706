//! Application services for the incentive lifecycle.
//!
//! Ports (repository, payment gateway, audit sink) are traits; the in-memory
//! and mock implementations here back the test suites and local runs. The
//! [`IncentiveService`] facade wires validation, payment, and lifecycle
//! operations together over those ports.

pub mod audit;
pub mod gateway;
pub mod incentive_service;
pub mod payment;
pub mod repository;
pub mod validation;

pub use audit::{AuditLog, CaptureAuditLog, DynAuditLog, TracingAuditLog};
pub use gateway::{DynPaymentGateway, GatewayResponse, MockPaymentGateway, PaymentGateway, PaymentRequest};
pub use incentive_service::{
    CreateIncentiveResult, IncentiveService, IncentiveStatistics, PendingIncentive, ServiceError,
};
pub use payment::{BatchPaymentResult, PaymentResult, PaymentService};
pub use repository::{
    DynIncentiveRepository, InMemoryIncentiveRepository, IncentiveRepository, TimeRange,
};
pub use validation::ValidationService;
