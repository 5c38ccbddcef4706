//! The orchestrating service: one entry point per use case.
//!
//! Each operation runs the same shape: check rules, mutate the aggregate,
//! persist, publish the returned events, audit. Domain refusals surface as
//! typed errors; infrastructure trouble is audited and comes back as a
//! generic internal error so callers never see collaborator details.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use incentive_core::constants::INCENTIVE_EXPIRY_DAYS;
use incentive_core::{
    ContactInfo, EligibilityCheck, EventPublisher, Incentive, IncentiveError, IncentiveId,
    IncentiveStatus, IncentiveSummary, PaymentMethod,
};
use incentive_rules::{processing_priority, CreationRequest, PriorityScore};

use crate::audit::DynAuditLog;
use crate::gateway::DynPaymentGateway;
use crate::payment::{BatchPaymentResult, PaymentResult, PaymentService};
use crate::repository::{DynIncentiveRepository, TimeRange};
use crate::validation::ValidationService;

/// Errors surfaced by the orchestrating service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Incentive {0} not found")]
    NotFound(IncentiveId),

    #[error(transparent)]
    Domain(#[from] IncentiveError),

    #[error("{0}")]
    Internal(String),
}

/// Outcome of a create request: either the stored incentive's summary or
/// the eligibility errors that blocked it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateIncentiveResult {
    pub created: bool,
    pub incentive: Option<IncentiveSummary>,
    pub errors: Vec<String>,
}

/// Aggregate counters over stored incentives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IncentiveStatistics {
    pub total: usize,
    pub pending_validation: usize,
    pub approved: usize,
    pub rejected: usize,
    pub paid: usize,
    pub expired: usize,
    /// Sum of rewards already paid out.
    pub total_paid_amount: f64,
    /// Sum of approved rewards still waiting for payment.
    pub total_approved_amount: f64,
    /// Paid incentives over all incentives, 0.0 when empty.
    pub payment_rate: f64,
}

/// One processing-queue entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingIncentive {
    pub summary: IncentiveSummary,
    pub priority: PriorityScore,
}

/// Facade over the incentive lifecycle.
pub struct IncentiveService {
    repository: DynIncentiveRepository,
    publisher: Arc<dyn EventPublisher>,
    audit: DynAuditLog,
    validation: ValidationService,
    payments: PaymentService,
}

impl IncentiveService {
    pub fn new(
        repository: DynIncentiveRepository,
        gateway: DynPaymentGateway,
        publisher: Arc<dyn EventPublisher>,
        audit: DynAuditLog,
    ) -> Self {
        let validation = ValidationService::new(repository.clone());
        let payments = PaymentService::new(
            repository.clone(),
            gateway,
            publisher.clone(),
            audit.clone(),
        );
        Self {
            repository,
            publisher,
            audit,
            validation,
            payments,
        }
    }

    // ─── Creation ───────────────────────────────────────────────────────────

    /// Incentive for a completed questionnaire. Blocked requests return the
    /// rule errors; nothing is stored for them.
    pub async fn create_questionnaire_incentive(
        &self,
        ip: &str,
        questionnaire_id: &str,
        quality_score: u8,
        contact: ContactInfo,
    ) -> Result<CreateIncentiveResult, ServiceError> {
        let request = CreationRequest::Questionnaire {
            ip: ip.to_string(),
            questionnaire_id: questionnaire_id.to_string(),
            quality_score,
        };
        self.create_incentive(request, contact).await
    }

    /// Incentive for referring a new participant.
    pub async fn create_referral_incentive(
        &self,
        referrer_ip: &str,
        referred_ip: &str,
        contact: ContactInfo,
    ) -> Result<CreateIncentiveResult, ServiceError> {
        let request = CreationRequest::Referral {
            referrer_ip: referrer_ip.to_string(),
            referred_ip: referred_ip.to_string(),
        };
        self.create_incentive(request, contact).await
    }

    async fn create_incentive(
        &self,
        request: CreationRequest,
        contact: ContactInfo,
    ) -> Result<CreateIncentiveResult, ServiceError> {
        let eligibility = self
            .validation
            .check_creation(&request)
            .await
            .map_err(|err| self.internal("creating incentive", err))?;

        if !eligibility.is_eligible {
            self.audit.security_event(
                "INCENTIVE_CREATION_BLOCKED",
                json!({ "ip": request.source_ip(), "errors": eligibility.errors }),
            );
            metrics::counter!("incentive.creations_blocked").increment(1);
            return Ok(CreateIncentiveResult {
                created: false,
                incentive: None,
                errors: eligibility.errors,
            });
        }

        let (incentive, events) = match &request {
            CreationRequest::Questionnaire {
                ip,
                questionnaire_id,
                quality_score,
            } => Incentive::from_questionnaire(
                ip.clone(),
                questionnaire_id.clone(),
                *quality_score,
                contact,
            ),
            CreationRequest::Referral {
                referrer_ip,
                referred_ip,
            } => Incentive::from_referral(referrer_ip.clone(), referred_ip.clone(), contact),
        };

        self.repository
            .save(&incentive)
            .await
            .map_err(|err| self.internal("creating incentive", err))?;
        for event in events {
            self.publisher.publish(event);
        }
        self.audit.business_event(
            "INCENTIVE_CREATED",
            json!({
                "incentive_id": incentive.id().as_str(),
                "ip": incentive.recipient().ip,
                "trigger": incentive.trigger().trigger_type(),
                "amount": incentive.reward().amount,
                "status": incentive.status().as_str(),
            }),
        );
        metrics::counter!("incentive.created").increment(1);
        info!(
            incentive_id = %incentive.id(),
            trigger = incentive.trigger().trigger_type(),
            amount = incentive.reward().amount,
            "incentive created"
        );

        Ok(CreateIncentiveResult {
            created: true,
            incentive: Some(incentive.summary()),
            errors: Vec::new(),
        })
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Re-run the aggregate's own invariants and publish the verdict event.
    /// Read-only with respect to storage.
    pub async fn validate_incentive(
        &self,
        id: &IncentiveId,
    ) -> Result<EligibilityCheck, ServiceError> {
        let incentive = self.load(id).await?;
        let (check, event) = incentive.validate_eligibility();
        self.publisher.publish(event);
        Ok(check)
    }

    pub async fn approve_incentive(
        &self,
        id: &IncentiveId,
        reason: &str,
    ) -> Result<IncentiveSummary, ServiceError> {
        let mut incentive = self.load(id).await?;
        let event = incentive.approve_for_processing(reason)?;
        self.repository
            .save(&incentive)
            .await
            .map_err(|err| self.internal("approving incentive", err))?;
        self.publisher.publish(event);
        self.audit.business_event(
            "INCENTIVE_APPROVED",
            json!({ "incentive_id": id.as_str(), "reason": reason }),
        );
        metrics::counter!("incentive.approved").increment(1);
        Ok(incentive.summary())
    }

    pub async fn reject_incentive(
        &self,
        id: &IncentiveId,
        reason: &str,
    ) -> Result<IncentiveSummary, ServiceError> {
        let mut incentive = self.load(id).await?;
        let event = incentive.reject(reason)?;
        self.repository
            .save(&incentive)
            .await
            .map_err(|err| self.internal("rejecting incentive", err))?;
        self.publisher.publish(event);
        self.audit.business_event(
            "INCENTIVE_REJECTED",
            json!({ "incentive_id": id.as_str(), "reason": reason }),
        );
        metrics::counter!("incentive.rejected").increment(1);
        Ok(incentive.summary())
    }

    pub async fn pay_incentive(&self, id: &IncentiveId, method: PaymentMethod) -> PaymentResult {
        self.payments.process_payment(id, method).await
    }

    pub async fn pay_batch(
        &self,
        ids: &[IncentiveId],
        method: PaymentMethod,
    ) -> BatchPaymentResult {
        self.payments.process_batch_payment(ids, method).await
    }

    /// Flip every overdue, still-unsettled incentive to expired. Returns
    /// how many changed.
    pub async fn expire_overdue_incentives(&self) -> Result<usize, ServiceError> {
        let all = self
            .repository
            .find_all(None)
            .await
            .map_err(|err| self.internal("sweeping for expiry", err))?;

        let mut expired = 0;
        for mut incentive in all {
            let settled = matches!(
                incentive.status(),
                IncentiveStatus::Paid | IncentiveStatus::Expired
            );
            if settled || !incentive.is_overdue() {
                continue;
            }
            if incentive.mark_expired().is_ok() {
                self.repository
                    .save(&incentive)
                    .await
                    .map_err(|err| self.internal("sweeping for expiry", err))?;
                expired += 1;
            }
        }

        if expired > 0 {
            self.audit.business_event(
                "INCENTIVES_EXPIRED",
                json!({ "count": expired, "window_days": INCENTIVE_EXPIRY_DAYS }),
            );
            metrics::counter!("incentive.expired").increment(expired as u64);
            info!(count = expired, "expired overdue incentives");
        }
        Ok(expired)
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub async fn get_incentive(&self, id: &IncentiveId) -> Result<IncentiveSummary, ServiceError> {
        Ok(self.load(id).await?.summary())
    }

    /// Counters over everything stored, optionally narrowed to a creation
    /// window.
    pub async fn get_statistics(
        &self,
        range: Option<TimeRange>,
    ) -> Result<IncentiveStatistics, ServiceError> {
        let all = self
            .repository
            .find_all(range)
            .await
            .map_err(|err| self.internal("computing statistics", err))?;

        let mut stats = IncentiveStatistics {
            total: all.len(),
            ..Default::default()
        };
        for incentive in &all {
            let amount = incentive.reward().amount;
            match incentive.status() {
                IncentiveStatus::PendingValidation => stats.pending_validation += 1,
                IncentiveStatus::Approved => {
                    stats.approved += 1;
                    stats.total_approved_amount += amount;
                }
                IncentiveStatus::Rejected => stats.rejected += 1,
                IncentiveStatus::Paid => {
                    stats.paid += 1;
                    stats.total_paid_amount += amount;
                }
                IncentiveStatus::Expired => stats.expired += 1,
            }
        }
        if stats.total > 0 {
            stats.payment_rate = stats.paid as f64 / stats.total as f64;
        }
        Ok(stats)
    }

    /// Unsettled incentives ranked by processing priority, highest first.
    pub async fn get_pending_incentives(
        &self,
        limit: usize,
    ) -> Result<Vec<PendingIncentive>, ServiceError> {
        let pending = self
            .repository
            .find_pending(None, limit)
            .await
            .map_err(|err| self.internal("listing pending incentives", err))?;

        let now = Utc::now();
        let mut entries: Vec<PendingIncentive> = pending
            .iter()
            .map(|incentive| PendingIncentive {
                summary: incentive.summary(),
                priority: processing_priority(incentive, now),
            })
            .collect();
        entries.sort_by(|a, b| b.priority.score.cmp(&a.priority.score));
        Ok(entries)
    }

    // ─── Helpers ────────────────────────────────────────────────────────────

    async fn load(&self, id: &IncentiveId) -> Result<Incentive, ServiceError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|err| self.internal("loading incentive", err))?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    fn internal(&self, action: &str, err: anyhow::Error) -> ServiceError {
        self.audit.log_error(
            "INCENTIVE_INTERNAL_ERROR",
            json!({ "action": action, "error": err.to_string() }),
        );
        ServiceError::Internal(format!("Internal error occurred while {action}"))
    }
}
