//! Domain events and the publisher boundary.
//!
//! Lifecycle operations on the aggregate return the events they caused;
//! nothing queues inside the aggregate. The service layer persists state
//! first and then hands the returned events to an `Arc<dyn EventPublisher>`,
//! which gives at-least-once delivery. Consumers dedup on `event_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::id::IncentiveId;
use crate::payment::PaymentMethod;
use crate::reward::Currency;

/// Immutable fact: one lifecycle transition of one incentive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncentiveEvent {
    pub event_id: Uuid,
    pub incentive_id: IncentiveId,
    pub recipient_ip: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: IncentiveEventKind,
}

/// Transition-specific payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum IncentiveEventKind {
    Created {
        trigger_type: String,
        reward_amount: f64,
        currency: Currency,
    },
    Validated,
    ValidationFailed {
        errors: Vec<String>,
    },
    Approved {
        reason: String,
        reward_amount: f64,
    },
    Rejected {
        reason: String,
    },
    Paid {
        amount: f64,
        currency: Currency,
        payment_method: PaymentMethod,
        transaction_id: String,
    },
    PaymentFailed {
        reason: String,
    },
}

impl IncentiveEventKind {
    /// Wire token, matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            IncentiveEventKind::Created { .. } => "created",
            IncentiveEventKind::Validated => "validated",
            IncentiveEventKind::ValidationFailed { .. } => "validation_failed",
            IncentiveEventKind::Approved { .. } => "approved",
            IncentiveEventKind::Rejected { .. } => "rejected",
            IncentiveEventKind::Paid { .. } => "paid",
            IncentiveEventKind::PaymentFailed { .. } => "payment_failed",
        }
    }
}

impl IncentiveEvent {
    /// Stamp a fresh event for the given incentive.
    pub fn new(incentive_id: &IncentiveId, recipient_ip: &str, kind: IncentiveEventKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            incentive_id: incentive_id.clone(),
            recipient_ip: recipient_ip.to_string(),
            occurred_at: Utc::now(),
            kind,
        }
    }
}

/// Trait for handing domain events to the outside world. Implementations
/// route events to message brokers, analytics pipelines, or webhooks.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: IncentiveEvent);
}

/// No-op publisher for wiring that doesn't care about events.
pub struct NoOpPublisher;

impl EventPublisher for NoOpPublisher {
    fn publish(&self, _event: IncentiveEvent) {}
}

/// In-memory publisher that captures events for testing.
#[derive(Default)]
pub struct CapturePublisher {
    events: Mutex<Vec<IncentiveEvent>>,
}

impl CapturePublisher {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<IncentiveEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event mutex poisoned").len()
    }

    pub fn count_kind(&self, name: &str) -> usize {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .iter()
            .filter(|e| e.kind.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event mutex poisoned").clear();
    }
}

impl EventPublisher for CapturePublisher {
    fn publish(&self, event: IncentiveEvent) {
        self.events.lock().expect("event mutex poisoned").push(event);
    }
}

/// Convenience: publisher for wiring that discards events.
pub fn noop_publisher() -> Arc<dyn EventPublisher> {
    Arc::new(NoOpPublisher)
}

/// Convenience: capturing publisher for tests.
pub fn capture_publisher() -> Arc<CapturePublisher> {
    Arc::new(CapturePublisher::new())
}
