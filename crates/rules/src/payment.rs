//! Payment-time rules: single-payout eligibility, rail compatibility,
//! and batch validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use incentive_core::constants::{
    BATCH_TOTAL_WARNING_THRESHOLD, INCENTIVE_EXPIRY_DAYS, MAX_BATCH_SIZE, MAX_REWARD_AMOUNT,
    MIN_PAYOUT_AMOUNT,
};
use incentive_core::{ContactInfo, Incentive, IncentiveStatus, PaymentMethod};

/// Verdict of the single-payment rules. Violations accumulate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentEligibility {
    pub is_eligible: bool,
    pub errors: Vec<String>,
}

/// Check one incentive against the payout rules at `now`: approved status,
/// amount within the payable band, and inside the payment window.
pub fn evaluate_payment(incentive: &Incentive, now: DateTime<Utc>) -> PaymentEligibility {
    let mut errors = Vec::new();

    if incentive.status() != IncentiveStatus::Approved {
        errors.push(format!(
            "Incentive must be approved before payment, current status is {}",
            incentive.status()
        ));
    }

    let amount = incentive.reward().amount;
    if amount < MIN_PAYOUT_AMOUNT {
        errors.push(format!(
            "Amount {amount} is below the minimum payout of {MIN_PAYOUT_AMOUNT}"
        ));
    }
    if amount > MAX_REWARD_AMOUNT {
        errors.push(format!(
            "Amount {amount} exceeds the maximum reward of {MAX_REWARD_AMOUNT}"
        ));
    }

    let age_days = (now - incentive.created_at()).num_days();
    if age_days > INCENTIVE_EXPIRY_DAYS {
        errors.push(format!(
            "Incentive is {age_days} days old, payment window is {INCENTIVE_EXPIRY_DAYS} days"
        ));
    }

    PaymentEligibility {
        is_eligible: errors.is_empty(),
        errors,
    }
}

/// Each payout rail needs a matching contact channel before the gateway
/// is worth calling. Returns the blocking reason on mismatch.
pub fn check_method_compatibility(
    method: PaymentMethod,
    contact: &ContactInfo,
) -> Result<(), String> {
    match method {
        PaymentMethod::WechatPay if present(&contact.wechat) => Ok(()),
        PaymentMethod::WechatPay => Err("wechat_pay requires a WeChat handle".to_string()),
        PaymentMethod::Alipay if present(&contact.alipay) => Ok(()),
        PaymentMethod::Alipay => Err("alipay requires an Alipay account".to_string()),
        PaymentMethod::BankTransfer if present(&contact.phone) || present(&contact.email) => {
            Ok(())
        }
        PaymentMethod::BankTransfer => {
            Err("bank_transfer requires a phone number or email".to_string())
        }
        PaymentMethod::Manual if contact.is_valid() => Ok(()),
        PaymentMethod::Manual => Err("manual payment requires valid contact info".to_string()),
    }
}

fn present(channel: &Option<String>) -> bool {
    channel.as_deref().map(|c| !c.is_empty()).unwrap_or(false)
}

/// Aggregate verdict over a proposed payment batch.
///
/// Individually ineligible items become warnings and the batch stays
/// valid; only an empty batch, an oversized batch, or a batch with no
/// eligible items at all is an error. `total_amount` sums the eligible
/// items only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub valid_incentive_count: usize,
    pub total_amount: f64,
}

pub fn validate_batch(incentives: &[Incentive], now: DateTime<Utc>) -> BatchValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if incentives.is_empty() {
        errors.push("Batch is empty".to_string());
        return BatchValidation {
            is_valid: false,
            errors,
            warnings,
            valid_incentive_count: 0,
            total_amount: 0.0,
        };
    }
    if incentives.len() > MAX_BATCH_SIZE {
        errors.push(format!(
            "Batch of {} exceeds the maximum of {MAX_BATCH_SIZE} items",
            incentives.len()
        ));
    }

    let mut valid_count = 0;
    let mut total = 0.0;
    for incentive in incentives {
        let eligibility = evaluate_payment(incentive, now);
        if eligibility.is_eligible {
            valid_count += 1;
            total += incentive.reward().amount;
        } else {
            warnings.push(format!(
                "{}: {}",
                incentive.id(),
                eligibility.errors.join("; ")
            ));
        }
    }

    if valid_count == 0 {
        errors.push("No incentive in the batch is eligible for payment".to_string());
    }
    if total > BATCH_TOTAL_WARNING_THRESHOLD {
        warnings.push(format!(
            "Batch total {total} exceeds {BATCH_TOTAL_WARNING_THRESHOLD}, review before release"
        ));
    }

    BatchValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        valid_incentive_count: valid_count,
        total_amount: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use incentive_core::{Currency, IncentiveId, Recipient, Reward, RewardType, Trigger};

    fn contact() -> ContactInfo {
        ContactInfo::new().with_wechat("wx_user_01")
    }

    fn approved(amount: f64, age_days: i64) -> Incentive {
        let created = Utc::now() - Duration::days(age_days);
        Incentive::restore(
            IncentiveId::generate(),
            Recipient::new("10.0.0.1", contact()),
            Reward::new(
                amount,
                Currency::Cny,
                RewardType::QuestionnaireCompletion,
                "test",
            ),
            Trigger::QuestionnaireCompletion {
                questionnaire_id: "Q-1".into(),
                quality_score: 85,
            },
            IncentiveStatus::Approved,
            created,
            Some(created),
            None,
        )
    }

    #[test]
    fn test_approved_recent_payable_amount_is_eligible() {
        let verdict = evaluate_payment(&approved(8.0, 1), Utc::now());
        assert!(verdict.is_eligible);
    }

    #[test]
    fn test_minimum_payout_is_inclusive() {
        assert!(evaluate_payment(&approved(MIN_PAYOUT_AMOUNT, 1), Utc::now()).is_eligible);
        let below = evaluate_payment(&approved(4.99, 1), Utc::now());
        assert!(!below.is_eligible);
        assert!(below.errors[0].contains("minimum payout"));
    }

    #[test]
    fn test_expiry_window_is_inclusive() {
        assert!(evaluate_payment(&approved(8.0, INCENTIVE_EXPIRY_DAYS), Utc::now()).is_eligible);
        let stale = evaluate_payment(&approved(8.0, INCENTIVE_EXPIRY_DAYS + 1), Utc::now());
        assert!(!stale.is_eligible);
        assert!(stale.errors[0].contains("payment window"));
    }

    #[test]
    fn test_violations_accumulate() {
        let mut incentive = approved(3.0, 40);
        incentive.mark_expired().unwrap();
        let verdict = evaluate_payment(&incentive, Utc::now());
        // Status, amount, and age all wrong at once.
        assert_eq!(verdict.errors.len(), 3);
    }

    #[test]
    fn test_method_compatibility() {
        let wechat_only = ContactInfo::new().with_wechat("wx_user_01");
        assert!(check_method_compatibility(PaymentMethod::WechatPay, &wechat_only).is_ok());
        assert!(check_method_compatibility(PaymentMethod::Alipay, &wechat_only).is_err());
        assert!(check_method_compatibility(PaymentMethod::BankTransfer, &wechat_only).is_err());
        assert!(check_method_compatibility(PaymentMethod::Manual, &wechat_only).is_ok());

        let phone_only = ContactInfo::new().with_phone("13812345678");
        assert!(check_method_compatibility(PaymentMethod::BankTransfer, &phone_only).is_ok());

        let email_only = ContactInfo::new().with_email("user@example.com");
        assert!(check_method_compatibility(PaymentMethod::BankTransfer, &email_only).is_ok());
        assert!(check_method_compatibility(PaymentMethod::WechatPay, &email_only).is_err());

        assert!(check_method_compatibility(PaymentMethod::Manual, &ContactInfo::new()).is_err());
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let verdict = validate_batch(&[], Utc::now());
        assert!(!verdict.is_valid);
        assert_eq!(verdict.errors, vec!["Batch is empty".to_string()]);
    }

    #[test]
    fn test_oversized_batch_is_an_error() {
        let batch: Vec<Incentive> = (0..MAX_BATCH_SIZE + 1).map(|_| approved(8.0, 1)).collect();
        let verdict = validate_batch(&batch, Utc::now());
        assert!(!verdict.is_valid);
        assert!(verdict.errors[0].contains("exceeds the maximum"));
    }

    #[test]
    fn test_mixed_batch_stays_valid_with_warnings() {
        let mut rejected = approved(8.0, 1);
        rejected.reject("fraud").unwrap();
        let batch = vec![approved(8.0, 1), rejected, approved(5.0, 2)];

        let verdict = validate_batch(&batch, Utc::now());
        assert!(verdict.is_valid);
        assert_eq!(verdict.valid_incentive_count, 2);
        assert_eq!(verdict.total_amount, 13.0);
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_all_ineligible_batch_is_an_error() {
        let mut a = approved(8.0, 1);
        a.reject("fraud").unwrap();
        let mut b = approved(5.0, 1);
        b.reject("fraud").unwrap();

        let verdict = validate_batch(&[a, b], Utc::now());
        assert!(!verdict.is_valid);
        assert!(verdict.errors[0].contains("No incentive"));
        assert_eq!(verdict.total_amount, 0.0);
    }

    #[test]
    fn test_total_at_threshold_does_not_warn() {
        // A full batch of max-value rewards lands exactly on the review
        // threshold, which is exclusive.
        let batch: Vec<Incentive> = (0..MAX_BATCH_SIZE)
            .map(|_| approved(MAX_REWARD_AMOUNT, 1))
            .collect();
        let verdict = validate_batch(&batch, Utc::now());
        assert!(verdict.is_valid);
        assert_eq!(verdict.total_amount, BATCH_TOTAL_WARNING_THRESHOLD);
        assert!(verdict.warnings.is_empty());
    }

    #[test]
    fn test_total_over_threshold_warns() {
        let batch: Vec<Incentive> = (0..MAX_BATCH_SIZE + 1)
            .map(|_| approved(MAX_REWARD_AMOUNT, 1))
            .collect();
        let verdict = validate_batch(&batch, Utc::now());
        // Oversized and over budget: the size violation is the error, the
        // total only warns.
        assert!(!verdict.is_valid);
        assert!(verdict.errors[0].contains("exceeds the maximum"));
        assert!(verdict
            .warnings
            .iter()
            .any(|w| w.contains("review before release")));
    }
}
