//! Alerting rule listing and bootstrap

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;
use tracing::info;

use incentive_authz::{
    decide, record_or_warn, AnonymousPolicy, AuditRecord, AuditSink, Requestor, ScopeFilter,
};
use incentive_core::store::RuleStore;
use incentive_core::types::{Owned, RuleAction, RuleConfig, RuleMetric, RuleOperator};

use crate::error::{AggregationError, Result};

/// Rule routines, including the first-touch default bootstrap
pub struct RuleService {
    rules: Arc<dyn RuleStore>,
    audit: Arc<dyn AuditSink>,
    // Serializes bootstrap per organization
    bootstraps: DashMap<String, Arc<Mutex<()>>>,
}

fn default_rules(organization: &str) -> Vec<RuleConfig> {
    vec![
        RuleConfig::new(
            0,
            "Big Deal Alert",
            RuleMetric::DealAmount,
            RuleOperator::GreaterThan,
            dec!(100_000),
            RuleAction::NotifyAdmin,
            organization,
        ),
        RuleConfig::new(
            0,
            "High Discount Warning",
            RuleMetric::DiscountRate,
            RuleOperator::GreaterThan,
            dec!(15),
            RuleAction::FlagRisk,
            organization,
        ),
    ]
}

impl RuleService {
    pub fn new(rules: Arc<dyn RuleStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            rules,
            audit,
            bootstraps: DashMap::new(),
        }
    }

    /// Rules visible to the requestor.
    ///
    /// An organization-scoped requestor whose organization has no
    /// rules yet gets the defaults created first; the stored set is
    /// always what comes back.
    pub async fn list_rules(&self, requestor: &Requestor) -> Result<Vec<RuleConfig>> {
        let decision = decide(requestor, None, AnonymousPolicy::AllowUnfiltered);
        if !decision.allowed {
            return Ok(Vec::new());
        }

        match &decision.scope {
            ScopeFilter::All => Ok(self.rules.list_all().await?),
            ScopeFilter::Nothing => Ok(Vec::new()),
            ScopeFilter::Org(org) => {
                self.ensure_bootstrapped(org).await?;
                Ok(self.rules.list_by_org(org).await?)
            }
        }
    }

    /// Create the default rule set for an organization with none.
    ///
    /// Creation happens at most once: concurrent callers queue on a
    /// per-organization guard and re-check before writing.
    async fn ensure_bootstrapped(&self, organization: &str) -> Result<()> {
        if !self.rules.list_by_org(organization).await?.is_empty() {
            return Ok(());
        }

        let guard = self
            .bootstraps
            .entry(organization.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _held = guard.lock().await;

        if !self.rules.list_by_org(organization).await?.is_empty() {
            drop(_held);
            self.bootstraps.remove(organization);
            return Ok(());
        }

        for rule in default_rules(organization) {
            self.rules.save(rule).await?;
        }
        info!(organization, "default rules bootstrapped");
        let record = AuditRecord::new("RULES_BOOTSTRAPPED", "RULE")
            .in_org(organization)
            .detail("default rule set created");
        record_or_warn(self.audit.as_ref(), record).await;

        // Guard entries are transient; pruned once the rules exist
        drop(_held);
        self.bootstraps.remove(organization);
        Ok(())
    }

    /// Create or update a rule.
    ///
    /// Non-global requestors always write into their own organization,
    /// whatever the submitted rule claims.
    pub async fn save_rule(&self, requestor: &Requestor, mut rule: RuleConfig) -> Result<RuleConfig> {
        let Some(actor) = requestor.identity() else {
            return Err(AggregationError::Forbidden("rule writes require an identity".into()));
        };

        if !actor.is_global_admin() {
            match &actor.organization {
                Some(org) => rule.organization = org.clone(),
                None => {
                    return Err(AggregationError::Forbidden(
                        "requestor has no organization to write rules into".into(),
                    ))
                }
            }
        }
        if rule.organization.is_empty() {
            return Err(AggregationError::InvalidInput(
                "rule must belong to an organization".into(),
            ));
        }

        let saved = self.rules.save(rule).await?;
        let record = AuditRecord::new("RULE_SAVED", "RULE")
            .by_requestor(requestor)
            .entity(saved.id)
            .in_org(saved.organization.clone())
            .detail(saved.name.clone());
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(saved)
    }

    /// Remove a rule within the requestor's scope
    pub async fn delete_rule(&self, requestor: &Requestor, id: i64) -> Result<()> {
        let rule = self
            .rules
            .list_all()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AggregationError::NotFound(format!("rule {id}")))?;

        let decision = decide(requestor, Some(&rule.ownership()), AnonymousPolicy::DenyAll);
        if !decision.allowed {
            return Err(AggregationError::Forbidden(format!(
                "rule {id} is outside the requestor's scope"
            )));
        }

        self.rules.delete(id).await?;
        let record = AuditRecord::new("RULE_DELETED", "RULE")
            .by_requestor(requestor)
            .entity(id)
            .in_org(rule.organization.clone())
            .detail(rule.name);
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(())
    }
}
