//! Persistence boundary for incentives, plus the DashMap-backed reference
//! implementation used by tests and local wiring.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use dashmap::DashMap;

use incentive_core::{Incentive, IncentiveId, IncentiveStatus, Trigger};

pub type DynIncentiveRepository = Arc<dyn IncentiveRepository + Send + Sync>;

/// Inclusive window over `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The last `days` days up to now.
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Storage contract for incentive aggregates.
///
/// `save` is an upsert keyed on the incentive id. Implementations own their
/// concurrency control; the service layer assumes at most one concurrent
/// writer per id.
#[async_trait]
pub trait IncentiveRepository {
    async fn save(&self, incentive: &Incentive) -> anyhow::Result<()>;

    async fn find_by_id(&self, id: &IncentiveId) -> anyhow::Result<Option<Incentive>>;

    /// Load the subset of `ids` that exist. Order follows storage, not the
    /// input; missing ids are silently absent.
    async fn find_by_ids(&self, ids: &[IncentiveId]) -> anyhow::Result<Vec<Incentive>>;

    async fn find_by_ip(
        &self,
        ip: &str,
        range: Option<TimeRange>,
    ) -> anyhow::Result<Vec<Incentive>>;

    async fn find_all(&self, range: Option<TimeRange>) -> anyhow::Result<Vec<Incentive>>;

    /// Incentives awaiting action, oldest first. `status` narrows to one
    /// state; `None` means anything not yet settled (pending or approved).
    async fn find_pending(
        &self,
        status: Option<IncentiveStatus>,
        limit: usize,
    ) -> anyhow::Result<Vec<Incentive>>;

    /// An existing referral incentive from `referrer_ip` crediting
    /// `referred_ip`, if one was ever recorded.
    async fn find_referral(
        &self,
        referrer_ip: &str,
        referred_ip: &str,
    ) -> anyhow::Result<Option<Incentive>>;

    /// How many incentives this IP earned since UTC midnight.
    async fn count_today(&self, ip: &str) -> anyhow::Result<u32>;

    /// Drop expired records older than `older_than_days`, returning how
    /// many went. Retention cleanup, not lifecycle.
    async fn delete_expired(&self, older_than_days: i64) -> anyhow::Result<u64>;
}

/// In-memory store for tests and development.
#[derive(Default)]
pub struct InMemoryIncentiveRepository {
    incentives: DashMap<IncentiveId, Incentive>,
}

impl InMemoryIncentiveRepository {
    pub fn new() -> Self {
        Self {
            incentives: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.incentives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incentives.is_empty()
    }
}

#[async_trait]
impl IncentiveRepository for InMemoryIncentiveRepository {
    async fn save(&self, incentive: &Incentive) -> anyhow::Result<()> {
        self.incentives
            .insert(incentive.id().clone(), incentive.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &IncentiveId) -> anyhow::Result<Option<Incentive>> {
        Ok(self.incentives.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_ids(&self, ids: &[IncentiveId]) -> anyhow::Result<Vec<Incentive>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.incentives.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn find_by_ip(
        &self,
        ip: &str,
        range: Option<TimeRange>,
    ) -> anyhow::Result<Vec<Incentive>> {
        Ok(self
            .incentives
            .iter()
            .filter(|entry| entry.value().recipient().ip == ip)
            .filter(|entry| {
                range
                    .map(|r| r.contains(entry.value().created_at()))
                    .unwrap_or(true)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_all(&self, range: Option<TimeRange>) -> anyhow::Result<Vec<Incentive>> {
        Ok(self
            .incentives
            .iter()
            .filter(|entry| {
                range
                    .map(|r| r.contains(entry.value().created_at()))
                    .unwrap_or(true)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_pending(
        &self,
        status: Option<IncentiveStatus>,
        limit: usize,
    ) -> anyhow::Result<Vec<Incentive>> {
        let mut pending: Vec<Incentive> = self
            .incentives
            .iter()
            .filter(|entry| match status {
                Some(wanted) => entry.value().status() == wanted,
                None => matches!(
                    entry.value().status(),
                    IncentiveStatus::PendingValidation | IncentiveStatus::Approved
                ),
            })
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_by_key(|incentive| incentive.created_at());
        pending.truncate(limit);
        Ok(pending)
    }

    async fn find_referral(
        &self,
        referrer_ip: &str,
        referred_ip: &str,
    ) -> anyhow::Result<Option<Incentive>> {
        Ok(self
            .incentives
            .iter()
            .find(|entry| {
                let incentive = entry.value();
                incentive.recipient().ip == referrer_ip
                    && matches!(
                        incentive.trigger(),
                        Trigger::Referral { referred_ip: r } if r == referred_ip
                    )
            })
            .map(|entry| entry.value().clone()))
    }

    async fn count_today(&self, ip: &str) -> anyhow::Result<u32> {
        let midnight = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        Ok(self
            .incentives
            .iter()
            .filter(|entry| {
                entry.value().recipient().ip == ip && entry.value().created_at() >= midnight
            })
            .count() as u32)
    }

    async fn delete_expired(&self, older_than_days: i64) -> anyhow::Result<u64> {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let before = self.incentives.len();
        self.incentives.retain(|_, incentive| {
            !(incentive.status() == IncentiveStatus::Expired && incentive.created_at() < cutoff)
        });
        Ok((before - self.incentives.len()) as u64)
    }
}
