//! Creation checks that need persisted state.
//!
//! The pure rules in `incentive-rules` take counts as parameters; this
//! service looks those counts up and layers on the cross-record checks a
//! pure function cannot do, like duplicate-referral detection.

use tracing::debug;

use incentive_rules::{evaluate_creation, CreationEligibility, CreationRequest};

use crate::repository::DynIncentiveRepository;

/// Read-only eligibility checks against the repository. Never mutates.
pub struct ValidationService {
    repository: DynIncentiveRepository,
}

impl ValidationService {
    pub fn new(repository: DynIncentiveRepository) -> Self {
        Self { repository }
    }

    /// Full creation verdict for a request: pure rules plus the daily
    /// quota and, for referrals, a duplicate check.
    pub async fn check_creation(
        &self,
        request: &CreationRequest,
    ) -> anyhow::Result<CreationEligibility> {
        let todays_count = self.repository.count_today(request.source_ip()).await?;
        let mut eligibility = evaluate_creation(request, todays_count);

        if let CreationRequest::Referral {
            referrer_ip,
            referred_ip,
        } = request
        {
            let duplicate = self
                .repository
                .find_referral(referrer_ip, referred_ip)
                .await?;
            if duplicate.is_some() {
                eligibility.is_eligible = false;
                eligibility.expected_reward = 0.0;
                eligibility.errors.push(format!(
                    "Referral from {referrer_ip} crediting {referred_ip} already exists"
                ));
            }
        }

        debug!(
            ip = request.source_ip(),
            eligible = eligibility.is_eligible,
            todays_count = todays_count,
            "creation eligibility checked"
        );
        Ok(eligibility)
    }
}
