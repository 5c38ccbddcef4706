//! Audit trail boundary.
//!
//! Services record business facts, security incidents, and internal errors
//! here. The trait is fire-and-forget on purpose: an audit sink outage must
//! never fail the operation being audited.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{error, info, warn};

pub type DynAuditLog = Arc<dyn AuditLog + Send + Sync>;

/// Sink for audit entries. `name` is an UPPER_SNAKE token identifying the
/// fact, `payload` carries its details.
pub trait AuditLog: Send + Sync {
    fn business_event(&self, name: &str, payload: Value);
    fn security_event(&self, name: &str, payload: Value);
    fn log_error(&self, name: &str, payload: Value);
}

/// Routes audit entries into the structured log stream.
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn business_event(&self, name: &str, payload: Value) {
        info!(target: "audit", event = name, payload = %payload, "business event");
    }

    fn security_event(&self, name: &str, payload: Value) {
        warn!(target: "audit", event = name, payload = %payload, "security event");
    }

    fn log_error(&self, name: &str, payload: Value) {
        error!(target: "audit", event = name, payload = %payload, "error event");
    }
}

/// Audit channel an entry was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditChannel {
    Business,
    Security,
    Error,
}

/// One captured audit entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub channel: AuditChannel,
    pub name: String,
    pub payload: Value,
}

/// In-memory audit log that captures entries for testing.
#[derive(Default)]
pub struct CaptureAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl CaptureAuditLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }

    pub fn count_name(&self, name: &str) -> usize {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .iter()
            .filter(|entry| entry.name == name)
            .count()
    }

    fn record(&self, channel: AuditChannel, name: &str, payload: Value) {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .push(AuditEntry {
                channel,
                name: name.to_string(),
                payload,
            });
    }
}

impl AuditLog for CaptureAuditLog {
    fn business_event(&self, name: &str, payload: Value) {
        self.record(AuditChannel::Business, name, payload);
    }

    fn security_event(&self, name: &str, payload: Value) {
        self.record(AuditChannel::Security, name, payload);
    }

    fn log_error(&self, name: &str, payload: Value) {
        self.record(AuditChannel::Error, name, payload);
    }
}

/// Convenience: audit log that writes to tracing.
pub fn tracing_audit_log() -> DynAuditLog {
    Arc::new(TracingAuditLog)
}

/// Convenience: capturing audit log for tests.
pub fn capture_audit_log() -> Arc<CaptureAuditLog> {
    Arc::new(CaptureAuditLog::new())
}
