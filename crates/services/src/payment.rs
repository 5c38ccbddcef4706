//! Payment execution: single payouts and batches.
//!
//! Every failure mode comes back as a result, not an `Err`: callers always
//! get a verdict per incentive, and one bad item never unwinds a batch.
//! Persist-then-publish ordering holds throughout; state is saved before
//! any event leaves the process.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use incentive_core::{EventPublisher, IncentiveId, PaymentMethod};
use incentive_rules::{check_method_compatibility, evaluate_payment, validate_batch};

use crate::audit::DynAuditLog;
use crate::gateway::{DynPaymentGateway, PaymentRequest};
use crate::repository::DynIncentiveRepository;

/// Outcome of one payment attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentResult {
    pub incentive_id: IncentiveId,
    pub success: bool,
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
    pub error: Option<String>,
}

impl PaymentResult {
    fn settled(incentive_id: IncentiveId, transaction_id: String, amount: f64) -> Self {
        Self {
            incentive_id,
            success: true,
            transaction_id: Some(transaction_id),
            amount: Some(amount),
            error: None,
        }
    }

    fn failed(incentive_id: IncentiveId, error: impl Into<String>) -> Self {
        Self {
            incentive_id,
            success: false,
            transaction_id: None,
            amount: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a batch run. `success` reflects batch validity, not item
/// outcomes: a valid batch with failed items is a legal terminal state,
/// and the paid items stay paid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchPaymentResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub items: Vec<PaymentResult>,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_paid_amount: f64,
}

impl BatchPaymentResult {
    fn invalid(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
            warnings,
            items: Vec::new(),
            success_count: 0,
            failure_count: 0,
            total_paid_amount: 0.0,
        }
    }
}

/// Executes payouts against the gateway and keeps the books straight.
pub struct PaymentService {
    repository: DynIncentiveRepository,
    gateway: DynPaymentGateway,
    publisher: Arc<dyn EventPublisher>,
    audit: DynAuditLog,
}

impl PaymentService {
    pub fn new(
        repository: DynIncentiveRepository,
        gateway: DynPaymentGateway,
        publisher: Arc<dyn EventPublisher>,
        audit: DynAuditLog,
    ) -> Self {
        Self {
            repository,
            gateway,
            publisher,
            audit,
        }
    }

    /// Pay one incentive end to end: rules, rail compatibility, gateway,
    /// then the aggregate settles and is persisted before its events go
    /// out. Collaborator errors surface as a generic failure result.
    pub async fn process_payment(
        &self,
        id: &IncentiveId,
        method: PaymentMethod,
    ) -> PaymentResult {
        match self.try_process(id, method).await {
            Ok(result) => result,
            Err(err) => {
                warn!(incentive_id = %id, error = %err, "payment hit an internal error");
                self.audit.log_error(
                    "INCENTIVE_PAYMENT_ERROR",
                    json!({ "incentive_id": id.as_str(), "error": err.to_string() }),
                );
                metrics::counter!("incentive.payment_internal_errors").increment(1);
                PaymentResult::failed(
                    id.clone(),
                    "Internal error occurred while processing payment",
                )
            }
        }
    }

    async fn try_process(
        &self,
        id: &IncentiveId,
        method: PaymentMethod,
    ) -> anyhow::Result<PaymentResult> {
        let Some(mut incentive) = self.repository.find_by_id(id).await? else {
            return Ok(PaymentResult::failed(id.clone(), "Incentive not found"));
        };

        // Rules first: nothing reaches the gateway unless it could settle.
        let eligibility = evaluate_payment(&incentive, Utc::now());
        if !eligibility.is_eligible {
            return Ok(PaymentResult::failed(
                id.clone(),
                eligibility.errors.join("; "),
            ));
        }
        if let Err(reason) = check_method_compatibility(method, &incentive.recipient().contact) {
            return Ok(PaymentResult::failed(id.clone(), reason));
        }

        let recipient_info = incentive
            .recipient()
            .contact
            .primary_contact()
            .unwrap_or_default()
            .to_string();
        let response = self
            .gateway
            .charge(PaymentRequest {
                amount: incentive.reward().amount,
                currency: incentive.reward().currency,
                payment_method: method,
                recipient_info,
                reference: id.as_str().to_string(),
            })
            .await?;

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "Payment gateway declined the transfer".to_string());
            warn!(incentive_id = %id, reason = %reason, "gateway declined payment");
            self.audit.business_event(
                "INCENTIVE_PAYMENT_FAILED",
                json!({ "incentive_id": id.as_str(), "reason": reason, "stage": "gateway" }),
            );
            metrics::counter!("incentive.payments_failed").increment(1);
            return Ok(PaymentResult::failed(id.clone(), reason));
        }
        let Some(transaction_id) = response.transaction_id else {
            anyhow::bail!("gateway accepted the transfer without a transaction id");
        };

        let (execution, events) = incentive.execute_payment(method, transaction_id.clone());
        if !execution.success {
            // The aggregate refused after the checks passed; state raced.
            // Money may have moved, so this is loud in the audit trail.
            let reason = execution
                .error
                .unwrap_or_else(|| "Payment refused by incentive".to_string());
            for event in events {
                self.publisher.publish(event);
            }
            self.audit.business_event(
                "INCENTIVE_PAYMENT_FAILED",
                json!({
                    "incentive_id": id.as_str(),
                    "reason": reason,
                    "stage": "settlement",
                    "transaction_id": transaction_id,
                }),
            );
            metrics::counter!("incentive.payments_failed").increment(1);
            return Ok(PaymentResult::failed(id.clone(), reason));
        }

        self.repository.save(&incentive).await?;
        for event in events {
            self.publisher.publish(event);
        }
        self.audit.business_event(
            "INCENTIVE_PAID",
            json!({
                "incentive_id": id.as_str(),
                "amount": execution.amount,
                "currency": execution.currency.as_str(),
                "method": method.as_str(),
                "transaction_id": transaction_id,
            }),
        );
        metrics::counter!("incentive.payments_succeeded").increment(1);
        info!(
            incentive_id = %id,
            amount = execution.amount,
            method = %method,
            "incentive paid"
        );

        Ok(PaymentResult::settled(
            id.clone(),
            transaction_id,
            execution.amount,
        ))
    }

    /// Pay a set of incentives. The batch is validated as a whole first;
    /// a valid batch then settles item by item, each isolated from its
    /// neighbours' failures.
    pub async fn process_batch_payment(
        &self,
        ids: &[IncentiveId],
        method: PaymentMethod,
    ) -> BatchPaymentResult {
        let loaded = match self.repository.find_by_ids(ids).await {
            Ok(loaded) => loaded,
            Err(err) => {
                self.audit.log_error(
                    "INCENTIVE_BATCH_ERROR",
                    json!({ "error": err.to_string(), "batch_size": ids.len() }),
                );
                return BatchPaymentResult::invalid(
                    vec!["Internal error occurred while loading the batch".to_string()],
                    Vec::new(),
                );
            }
        };

        let validation = validate_batch(&loaded, Utc::now());
        if !validation.is_valid {
            return BatchPaymentResult::invalid(validation.errors, validation.warnings);
        }

        let mut items = Vec::with_capacity(ids.len());
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_paid_amount = 0.0;

        for id in ids {
            let item = self.process_payment(id, method).await;
            if item.success {
                success_count += 1;
                total_paid_amount += item.amount.unwrap_or(0.0);
            } else {
                failure_count += 1;
            }
            items.push(item);
        }

        metrics::counter!("incentive.batch_payments").increment(1);
        info!(
            batch_size = ids.len(),
            succeeded = success_count,
            failed = failure_count,
            total_paid = total_paid_amount,
            "batch payment finished"
        );
        self.audit.business_event(
            "INCENTIVE_BATCH_PAID",
            json!({
                "batch_size": ids.len(),
                "succeeded": success_count,
                "failed": failure_count,
                "total_paid": total_paid_amount,
            }),
        );

        BatchPaymentResult {
            success: true,
            errors: Vec::new(),
            warnings: validation.warnings,
            items,
            success_count,
            failure_count,
            total_paid_amount,
        }
    }
}
