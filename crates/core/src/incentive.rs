//! The incentive aggregate: one reward grant moving through its lifecycle.
//!
//! All mutation goes through the methods here, every transition is checked
//! against the table in [`IncentiveStatus`], and each operation returns the
//! events it caused so callers can persist first and publish after.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{INCENTIVE_EXPIRY_DAYS, STANDARD_QUALITY_THRESHOLD};
use crate::contact::ContactInfo;
use crate::error::IncentiveError;
use crate::events::{IncentiveEvent, IncentiveEventKind};
use crate::id::IncentiveId;
use crate::payment::{PaymentExecution, PaymentMethod};
use crate::recipient::Recipient;
use crate::reward::{Currency, Reward};
use crate::status::IncentiveStatus;
use crate::trigger::Trigger;

/// Verdict of re-running the construction invariants over a live aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EligibilityCheck {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Read-only projection for display and list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncentiveSummary {
    pub id: IncentiveId,
    pub recipient_ip: String,
    pub amount: f64,
    pub currency: Currency,
    pub trigger_type: String,
    pub status: IncentiveStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub can_be_paid: bool,
    pub days_since_creation: i64,
}

/// A single reward grant. Identity is the `id`; recipient, reward, and
/// trigger are frozen at creation, and only `status` plus its companion
/// timestamps ever change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incentive {
    id: IncentiveId,
    recipient: Recipient,
    reward: Reward,
    trigger: Trigger,
    status: IncentiveStatus,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
}

impl Incentive {
    // ─── Factories ──────────────────────────────────────────────────────────

    /// Incentive for a completed questionnaire. Scores at or above the
    /// standard threshold are approved on the spot; the returned events
    /// then carry both the creation and the automatic approval.
    pub fn from_questionnaire(
        ip: impl Into<String>,
        questionnaire_id: impl Into<String>,
        quality_score: u8,
        contact: ContactInfo,
    ) -> (Self, Vec<IncentiveEvent>) {
        let recipient = Recipient::new(ip, contact);
        let reward = Reward::for_quality_score(quality_score);
        let trigger = Trigger::QuestionnaireCompletion {
            questionnaire_id: questionnaire_id.into(),
            quality_score,
        };
        let mut incentive = Self::fresh(recipient, reward, trigger);
        let mut events = vec![incentive.created_event()];

        if quality_score >= STANDARD_QUALITY_THRESHOLD {
            incentive.status = IncentiveStatus::Approved;
            incentive.processed_at = Some(Utc::now());
            events.push(incentive.event(IncentiveEventKind::Approved {
                reason: format!(
                    "auto-approved: quality score {quality_score} meets threshold {STANDARD_QUALITY_THRESHOLD}"
                ),
                reward_amount: incentive.reward.amount,
            }));
        }

        (incentive, events)
    }

    /// Incentive for referring a new participant. Referrals always start
    /// pending; someone looks at them before money moves.
    pub fn from_referral(
        referrer_ip: impl Into<String>,
        referred_ip: impl Into<String>,
        contact: ContactInfo,
    ) -> (Self, Vec<IncentiveEvent>) {
        let recipient = Recipient::new(referrer_ip, contact);
        let reward = Reward::for_referral();
        let trigger = Trigger::Referral {
            referred_ip: referred_ip.into(),
        };
        let incentive = Self::fresh(recipient, reward, trigger);
        let events = vec![incentive.created_event()];
        (incentive, events)
    }

    /// Rebuild an aggregate from persisted state. Storage adapters own the
    /// integrity of what they pass in here.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: IncentiveId,
        recipient: Recipient,
        reward: Reward,
        trigger: Trigger,
        status: IncentiveStatus,
        created_at: DateTime<Utc>,
        processed_at: Option<DateTime<Utc>>,
        paid_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            recipient,
            reward,
            trigger,
            status,
            created_at,
            processed_at,
            paid_at,
        }
    }

    fn fresh(recipient: Recipient, reward: Reward, trigger: Trigger) -> Self {
        Self {
            id: IncentiveId::generate(),
            recipient,
            reward,
            trigger,
            status: IncentiveStatus::PendingValidation,
            created_at: Utc::now(),
            processed_at: None,
            paid_at: None,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn id(&self) -> &IncentiveId {
        &self.id
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn reward(&self) -> &Reward {
        &self.reward
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn status(&self) -> IncentiveStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Whole days elapsed since creation.
    pub fn days_since_creation(&self) -> i64 {
        (Utc::now() - self.created_at).num_days()
    }

    /// Past the payment window, whatever the current status says.
    pub fn is_overdue(&self) -> bool {
        self.days_since_creation() > INCENTIVE_EXPIRY_DAYS
    }

    // ─── Lifecycle Operations ───────────────────────────────────────────────

    /// Re-run the invariants creation promised: trigger payload, recipient
    /// identity and contact, reward bounds, timestamp consistency. Returns
    /// the verdict plus the matching validated / validation-failed event.
    pub fn validate_eligibility(&self) -> (EligibilityCheck, IncentiveEvent) {
        let mut errors = Vec::new();

        if !self.trigger.is_valid() {
            errors.push("Trigger payload is incomplete or out of range".to_string());
        }
        if !self.recipient.is_valid() {
            errors.push("Recipient IP or contact info is invalid".to_string());
        }
        if !self.reward.is_valid() {
            errors.push(format!(
                "Reward amount {} is outside the allowed range",
                self.reward.amount
            ));
        }
        let processed = matches!(
            self.status,
            IncentiveStatus::Approved | IncentiveStatus::Rejected | IncentiveStatus::Paid
        );
        if processed && self.processed_at.is_none() {
            errors.push("Processed incentive is missing its processing timestamp".to_string());
        }
        if self.status == IncentiveStatus::Paid && self.paid_at.is_none() {
            errors.push("Paid incentive is missing its payment timestamp".to_string());
        }

        let event = if errors.is_empty() {
            self.event(IncentiveEventKind::Validated)
        } else {
            self.event(IncentiveEventKind::ValidationFailed {
                errors: errors.clone(),
            })
        };
        let check = EligibilityCheck {
            is_valid: errors.is_empty(),
            errors,
        };
        (check, event)
    }

    /// Clear the incentive for payment. Only pending incentives can be
    /// approved; anything else is a caller mistake worth surfacing.
    pub fn approve_for_processing(
        &mut self,
        reason: impl Into<String>,
    ) -> Result<IncentiveEvent, IncentiveError> {
        if !self.status.can_transition_to(IncentiveStatus::Approved) {
            return Err(IncentiveError::ApprovalNotAllowed {
                status: self.status,
            });
        }
        self.status = IncentiveStatus::Approved;
        self.processed_at = Some(Utc::now());
        Ok(self.event(IncentiveEventKind::Approved {
            reason: reason.into(),
            reward_amount: self.reward.amount,
        }))
    }

    /// Decline the incentive. Legal from any non-paid state; rejecting an
    /// already rejected incentive just records another rejection event.
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<IncentiveEvent, IncentiveError> {
        if !self.status.can_transition_to(IncentiveStatus::Rejected) {
            // Paid is the only state without a rejection edge.
            return Err(IncentiveError::RejectPaidIncentive);
        }
        self.status = IncentiveStatus::Rejected;
        self.processed_at = Some(Utc::now());
        Ok(self.event(IncentiveEventKind::Rejected {
            reason: reason.into(),
        }))
    }

    /// Settle the incentive with a completed gateway transaction.
    ///
    /// A wrong status yields a refusal and no event at all. A violated
    /// payment condition (amount, contact, age) yields a refusal plus a
    /// payment-failed event. Success flips the status to paid and returns
    /// the paid event. State is untouched on every refusal path.
    pub fn execute_payment(
        &mut self,
        method: PaymentMethod,
        transaction_id: impl Into<String>,
    ) -> (PaymentExecution, Vec<IncentiveEvent>) {
        if self.status != IncentiveStatus::Approved {
            let refusal = self.refusal(
                method,
                format!("Cannot pay incentive in {} status", self.status),
            );
            return (refusal, Vec::new());
        }

        let mut violations = Vec::new();
        if self.reward.amount <= 0.0 {
            violations.push("Reward amount must be positive".to_string());
        }
        if !self.recipient.contact.is_valid() {
            violations.push("Recipient contact info is missing or invalid".to_string());
        }
        if self.is_overdue() {
            violations.push(format!(
                "Incentive is {} days old, payment window is {INCENTIVE_EXPIRY_DAYS} days",
                self.days_since_creation()
            ));
        }
        if !violations.is_empty() {
            let reason = violations.join("; ");
            let event = self.event(IncentiveEventKind::PaymentFailed {
                reason: reason.clone(),
            });
            return (self.refusal(method, reason), vec![event]);
        }

        let transaction_id = transaction_id.into();
        self.status = IncentiveStatus::Paid;
        self.paid_at = Some(Utc::now());
        let event = self.event(IncentiveEventKind::Paid {
            amount: self.reward.amount,
            currency: self.reward.currency,
            payment_method: method,
            transaction_id: transaction_id.clone(),
        });
        let execution = PaymentExecution::settled(
            self.reward.amount,
            self.reward.currency,
            method,
            transaction_id,
        );
        (execution, vec![event])
    }

    /// Expire the incentive. A status sweep, not a business event, so no
    /// event comes back.
    pub fn mark_expired(&mut self) -> Result<(), IncentiveError> {
        if !self.status.can_transition_to(IncentiveStatus::Expired) {
            return Err(IncentiveError::InvalidTransition {
                from: self.status,
                to: IncentiveStatus::Expired,
            });
        }
        self.status = IncentiveStatus::Expired;
        Ok(())
    }

    // ─── Projections ────────────────────────────────────────────────────────

    pub fn summary(&self) -> IncentiveSummary {
        IncentiveSummary {
            id: self.id.clone(),
            recipient_ip: self.recipient.ip.clone(),
            amount: self.reward.amount,
            currency: self.reward.currency,
            trigger_type: self.trigger.trigger_type().to_string(),
            status: self.status,
            created_at: self.created_at,
            processed_at: self.processed_at,
            paid_at: self.paid_at,
            can_be_paid: self.can_be_paid(),
            days_since_creation: self.days_since_creation(),
        }
    }

    /// Payable right now: approved, with a usable contact and real money.
    pub fn can_be_paid(&self) -> bool {
        self.status.is_payable() && self.recipient.contact.is_valid() && self.reward.amount > 0.0
    }

    fn refusal(&self, method: PaymentMethod, reason: String) -> PaymentExecution {
        PaymentExecution::refused(self.reward.amount, self.reward.currency, method, reason)
    }

    fn created_event(&self) -> IncentiveEvent {
        self.event(IncentiveEventKind::Created {
            trigger_type: self.trigger.trigger_type().to_string(),
            reward_amount: self.reward.amount,
            currency: self.reward.currency,
        })
    }

    fn event(&self, kind: IncentiveEventKind) -> IncentiveEvent {
        IncentiveEvent::new(&self.id, &self.recipient.ip, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::RewardType;
    use chrono::Duration;

    fn contact() -> ContactInfo {
        ContactInfo::new().with_wechat("wx_user_01")
    }

    fn backdated(days: i64, status: IncentiveStatus) -> Incentive {
        let created = Utc::now() - Duration::days(days);
        Incentive::restore(
            IncentiveId::generate(),
            Recipient::new("10.0.0.1", contact()),
            Reward::for_quality_score(85),
            Trigger::QuestionnaireCompletion {
                questionnaire_id: "Q-1".into(),
                quality_score: 85,
            },
            status,
            created,
            Some(created),
            None,
        )
    }

    #[test]
    fn test_high_score_auto_approves() {
        let (incentive, events) =
            Incentive::from_questionnaire("10.0.0.1", "Q-1", 85, contact());

        assert_eq!(incentive.status(), IncentiveStatus::Approved);
        assert!(incentive.processed_at().is_some());
        assert_eq!(incentive.reward().amount, 5.0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind.name(), "created");
        assert_eq!(events[1].kind.name(), "approved");
        match &events[1].kind {
            IncentiveEventKind::Approved { reason, .. } => {
                assert!(reason.contains("auto-approved"));
            }
            other => panic!("expected approved event, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_boundary_for_auto_approval() {
        let (at, events_at) = Incentive::from_questionnaire("10.0.0.1", "Q-1", 70, contact());
        assert_eq!(at.status(), IncentiveStatus::Approved);
        assert_eq!(events_at.len(), 2);

        let (below, events_below) =
            Incentive::from_questionnaire("10.0.0.1", "Q-1", 69, contact());
        assert_eq!(below.status(), IncentiveStatus::PendingValidation);
        assert!(below.processed_at().is_none());
        assert_eq!(events_below.len(), 1);
        assert_eq!(events_below[0].kind.name(), "created");
    }

    #[test]
    fn test_referral_starts_pending_with_flat_reward() {
        let (incentive, events) = Incentive::from_referral("10.0.0.1", "10.0.0.2", contact());

        assert_eq!(incentive.status(), IncentiveStatus::PendingValidation);
        assert_eq!(incentive.reward().amount, 3.0);
        assert_eq!(incentive.reward().reward_type, RewardType::Referral);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            IncentiveEventKind::Created { trigger_type, .. } => {
                assert_eq!(trigger_type, "referral");
            }
            other => panic!("expected created event, got {other:?}"),
        }
    }

    #[test]
    fn test_approve_from_pending() {
        let (mut incentive, _) = Incentive::from_referral("10.0.0.1", "10.0.0.2", contact());
        let event = incentive.approve_for_processing("manual review passed").unwrap();

        assert_eq!(incentive.status(), IncentiveStatus::Approved);
        assert!(incentive.processed_at().is_some());
        match event.kind {
            IncentiveEventKind::Approved {
                reason,
                reward_amount,
            } => {
                assert_eq!(reason, "manual review passed");
                assert_eq!(reward_amount, 3.0);
            }
            other => panic!("expected approved event, got {other:?}"),
        }
    }

    #[test]
    fn test_approve_twice_fails_with_status_in_message() {
        let (mut incentive, _) = Incentive::from_questionnaire("10.0.0.1", "Q-1", 85, contact());
        let err = incentive.approve_for_processing("again").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot approve incentive in approved status"
        );
        assert_eq!(incentive.status(), IncentiveStatus::Approved);
    }

    #[test]
    fn test_reject_is_idempotent() {
        let (mut incentive, _) = Incentive::from_referral("10.0.0.1", "10.0.0.2", contact());
        incentive.reject("first").unwrap();
        let event = incentive.reject("second").unwrap();

        assert_eq!(incentive.status(), IncentiveStatus::Rejected);
        match event.kind {
            IncentiveEventKind::Rejected { reason } => assert_eq!(reason, "second"),
            other => panic!("expected rejected event, got {other:?}"),
        }
    }

    #[test]
    fn test_cannot_reject_paid_incentive() {
        let (mut incentive, _) = Incentive::from_questionnaire("10.0.0.1", "Q-1", 85, contact());
        incentive.execute_payment(PaymentMethod::WechatPay, "TXN-1");
        assert_eq!(incentive.status(), IncentiveStatus::Paid);

        let err = incentive.reject("too late").unwrap_err();
        assert_eq!(err.to_string(), "Cannot reject already paid incentive");
        assert_eq!(incentive.status(), IncentiveStatus::Paid);
    }

    #[test]
    fn test_payment_succeeds_from_approved() {
        let (mut incentive, _) = Incentive::from_questionnaire("10.0.0.1", "Q-1", 92, contact());
        let (execution, events) = incentive.execute_payment(PaymentMethod::WechatPay, "TXN-7");

        assert!(execution.success);
        assert_eq!(execution.amount, 8.0);
        assert_eq!(execution.transaction_id.as_deref(), Some("TXN-7"));
        assert_eq!(incentive.status(), IncentiveStatus::Paid);
        assert!(incentive.paid_at().is_some());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind.name(), "paid");
    }

    #[test]
    fn test_payment_refused_outside_approved_status() {
        let (mut incentive, _) = Incentive::from_referral("10.0.0.1", "10.0.0.2", contact());
        let (execution, events) = incentive.execute_payment(PaymentMethod::Manual, "TXN-1");

        assert!(!execution.success);
        assert!(execution
            .error
            .as_deref()
            .unwrap()
            .contains("pending_validation"));
        // Wrong status is a caller mistake, not a lifecycle fact.
        assert!(events.is_empty());
        assert_eq!(incentive.status(), IncentiveStatus::PendingValidation);
    }

    #[test]
    fn test_payment_refused_when_contact_unusable() {
        let (mut incentive, _) =
            Incentive::from_questionnaire("10.0.0.1", "Q-1", 85, ContactInfo::new());
        let (execution, events) = incentive.execute_payment(PaymentMethod::WechatPay, "TXN-1");

        assert!(!execution.success);
        assert!(execution.error.as_deref().unwrap().contains("contact"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind.name(), "payment_failed");
        assert_eq!(incentive.status(), IncentiveStatus::Approved);
        assert!(incentive.paid_at().is_none());
    }

    #[test]
    fn test_payment_refused_past_expiry_window() {
        let mut incentive = backdated(INCENTIVE_EXPIRY_DAYS + 5, IncentiveStatus::Approved);
        let (execution, events) = incentive.execute_payment(PaymentMethod::WechatPay, "TXN-1");

        assert!(!execution.success);
        assert!(execution
            .error
            .as_deref()
            .unwrap()
            .contains(&INCENTIVE_EXPIRY_DAYS.to_string()));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind.name(), "payment_failed");
        assert_eq!(incentive.status(), IncentiveStatus::Approved);
    }

    #[test]
    fn test_payment_at_window_edge_still_settles() {
        let mut incentive = backdated(INCENTIVE_EXPIRY_DAYS, IncentiveStatus::Approved);
        let (execution, _) = incentive.execute_payment(PaymentMethod::WechatPay, "TXN-1");
        assert!(execution.success);
    }

    #[test]
    fn test_mark_expired() {
        let (mut incentive, _) = Incentive::from_referral("10.0.0.1", "10.0.0.2", contact());
        incentive.mark_expired().unwrap();
        assert_eq!(incentive.status(), IncentiveStatus::Expired);

        let (mut paid, _) = Incentive::from_questionnaire("10.0.0.1", "Q-1", 85, contact());
        paid.execute_payment(PaymentMethod::WechatPay, "TXN-1");
        assert!(paid.mark_expired().is_err());
    }

    #[test]
    fn test_validate_eligibility_round_trip() {
        let (incentive, _) = Incentive::from_questionnaire("10.0.0.1", "Q-1", 85, contact());
        let (check, event) = incentive.validate_eligibility();
        assert!(check.is_valid);
        assert!(check.errors.is_empty());
        assert_eq!(event.kind.name(), "validated");
        // Read-only: running it twice changes nothing.
        let (again, _) = incentive.validate_eligibility();
        assert!(again.is_valid);
    }

    #[test]
    fn test_validate_eligibility_collects_all_errors() {
        let incentive = Incentive::restore(
            IncentiveId::generate(),
            Recipient::new("not-an-ip", ContactInfo::new()),
            Reward::new(150.0, Currency::Cny, RewardType::Promotion, "manual"),
            Trigger::Referral {
                referred_ip: String::new(),
            },
            IncentiveStatus::Paid,
            Utc::now(),
            None,
            None,
        );
        let (check, event) = incentive.validate_eligibility();

        assert!(!check.is_valid);
        assert_eq!(check.errors.len(), 5);
        assert_eq!(event.kind.name(), "validation_failed");
        match &event.kind {
            IncentiveEventKind::ValidationFailed { errors } => {
                assert_eq!(errors, &check.errors);
            }
            other => panic!("expected validation_failed event, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_reflects_payability() {
        let (incentive, _) = Incentive::from_questionnaire("10.0.0.1", "Q-1", 85, contact());
        let summary = incentive.summary();
        assert!(summary.can_be_paid);
        assert_eq!(summary.trigger_type, "questionnaire_completion");
        assert_eq!(summary.amount, 5.0);
        assert_eq!(summary.days_since_creation, 0);

        let (pending, _) = Incentive::from_referral("10.0.0.1", "10.0.0.2", contact());
        assert!(!pending.summary().can_be_paid);
    }
}
