//! Performance attainment and sales targets

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use incentive_authz::{
    decide, filter_visible, record_or_warn, AnonymousPolicy, AuditRecord, AuditSink, Requestor,
};
use incentive_core::directory::IdentityDirectory;
use incentive_core::store::{DealStore, TargetStore};
use incentive_core::types::{Owned, Ownership, SalesTarget, UserId};

use crate::error::{AggregationError, Result};
use crate::leaderboard::Period;

/// Derived monthly attainment; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Measured identity
    pub user: UserId,

    /// Monthly target amount
    pub target: Decimal,

    /// Approved deal volume closed this month
    pub closed: Decimal,

    /// `closed / target` in percent
    pub attainment_pct: Decimal,

    /// Approved deals closed this month
    pub deal_count: usize,
}

/// Attainment and target routines
pub struct PerformanceService {
    deals: Arc<dyn DealStore>,
    targets: Arc<dyn TargetStore>,
    directory: Arc<dyn IdentityDirectory>,
    audit: Arc<dyn AuditSink>,
    // Serializes first-touch target creation per identity
    provisioning: DashMap<UserId, Arc<Mutex<()>>>,
}

impl PerformanceService {
    pub fn new(
        deals: Arc<dyn DealStore>,
        targets: Arc<dyn TargetStore>,
        directory: Arc<dyn IdentityDirectory>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            deals,
            targets,
            directory,
            audit,
            provisioning: DashMap::new(),
        }
    }

    /// The identity's target, creating the default record on first
    /// touch.
    ///
    /// Creation happens at most once per identity: concurrent callers
    /// queue on a per-user guard and re-check before writing.
    pub async fn ensure_target(&self, user: UserId) -> Result<SalesTarget> {
        if let Some(existing) = self.targets.find_by_user(user).await? {
            return Ok(existing);
        }

        let guard = self
            .provisioning
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _held = guard.lock().await;

        if let Some(existing) = self.targets.find_by_user(user).await? {
            drop(_held);
            self.provisioning.remove(&user);
            return Ok(existing);
        }

        let mut target = SalesTarget::default_for(0, user);
        if let Some(identity) = self.directory.find(user).await? {
            if let Some(org) = identity.organization {
                target = target.with_organization(org);
            }
        }
        let saved = self.targets.save(target).await?;
        info!(user, "default sales target provisioned");

        // Guard entries are transient; pruned once the record exists
        drop(_held);
        self.provisioning.remove(&user);
        Ok(saved)
    }

    /// Monthly attainment for one identity
    pub async fn performance_summary(
        &self,
        requestor: &Requestor,
        user: UserId,
        as_of: DateTime<Utc>,
    ) -> Result<PerformanceSummary> {
        let subject = self.directory.find(user).await?;
        let ownership = match &subject {
            Some(identity) => identity.ownership(),
            None => Ownership::of_owner(user),
        };
        let decision = decide(requestor, Some(&ownership), AnonymousPolicy::AllowUnfiltered);
        if !decision.allowed {
            return Err(AggregationError::Forbidden(format!(
                "no visibility into user {user}"
            )));
        }

        let target = self.ensure_target(user).await?;
        let window = Period::ThisMonth;

        let mut closed = Decimal::ZERO;
        let mut deal_count = 0;
        for deal in self.deals.list(ownership.organization.as_deref()).await? {
            if deal.owner != user || !deal.is_approved() {
                continue;
            }
            let in_window = window
                .bounds(as_of)
                .map(|(start, end)| start <= deal.closed_at && deal.closed_at < end)
                .unwrap_or(true);
            if in_window {
                closed += deal.amount;
                deal_count += 1;
            }
        }

        let attainment_pct = if target.monthly_target.is_zero() {
            Decimal::ZERO
        } else {
            closed / target.monthly_target * dec!(100)
        };

        Ok(PerformanceSummary {
            user,
            target: target.monthly_target,
            closed,
            attainment_pct,
            deal_count,
        })
    }

    /// Targets visible to the requestor
    pub async fn list_targets(&self, requestor: &Requestor) -> Result<Vec<SalesTarget>> {
        let decision = decide(requestor, None, AnonymousPolicy::AllowUnfiltered);
        let targets = self.targets.list().await?;
        Ok(filter_visible(&decision, targets))
    }

    /// Create or update a target.
    ///
    /// Permitted for global admins, admins of the target identity's
    /// organization, and the identity itself.
    pub async fn upsert_target(
        &self,
        requestor: &Requestor,
        mut target: SalesTarget,
    ) -> Result<SalesTarget> {
        if target.organization.is_none() {
            if let Some(identity) = self.directory.find(target.user).await? {
                target.organization = identity.organization;
            }
        }

        let decision = decide(requestor, Some(&target.ownership()), AnonymousPolicy::DenyAll);
        if !decision.allowed {
            return Err(AggregationError::Forbidden(format!(
                "cannot set target for user {}",
                target.user
            )));
        }

        // One target per identity: an upsert replaces the existing
        // record rather than inserting alongside it
        if let Some(existing) = self.targets.find_by_user(target.user).await? {
            target.id = existing.id;
        }

        let saved = self.targets.save(target).await?;
        let record = AuditRecord::new("TARGET_UPDATED", "TARGET")
            .by_requestor(requestor)
            .entity(saved.id)
            .detail(format!(
                "user {} monthly target {}",
                saved.user, saved.monthly_target
            ));
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(saved)
    }
}
