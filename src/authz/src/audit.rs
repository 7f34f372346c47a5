//! Audit Sink
//!
//! Append-only record of privileged mutations. Writers never let an
//! audit failure abort the operation being audited; readers get the
//! same organization scoping as every other listing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use incentive_core::types::{Identity, Owned, Ownership, UserId};

use crate::decision::{decide, AnonymousPolicy};
use crate::error::Result;
use crate::filter::filter_visible;
use crate::requestor::Requestor;

/// Actor label recorded when no identity is attached to a mutation
pub const SYSTEM_ACTOR: &str = "SYSTEM";

/// One audited mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record id
    pub id: Uuid,

    /// Acting identity, when one was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,

    /// Actor's email, or [`SYSTEM_ACTOR`] for anonymous mutations.
    ///
    /// Denormalized so records stay readable after the identity is
    /// deleted from the directory.
    pub actor_email: String,

    /// What happened, e.g. `DEAL_MARKED_PAID`
    pub action: String,

    /// Kind of entity acted on
    pub entity_type: String,

    /// Id of the entity acted on, when it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<i64>,

    /// Free-form human-readable detail
    #[serde(default)]
    pub detail: String,

    /// Organization the mutation happened in, denormalized like the
    /// actor email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a record with the system actor
    pub fn new(action: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor: None,
            actor_email: SYSTEM_ACTOR.to_string(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            detail: String::new(),
            organization: None,
            recorded_at: Utc::now(),
        }
    }

    /// Attribute the record to a resolved identity
    pub fn by(mut self, identity: &Identity) -> Self {
        self.actor = Some(identity.id);
        self.actor_email = identity.email.clone();
        if self.organization.is_none() {
            self.organization = identity.organization.clone();
        }
        self
    }

    /// Attribute the record to a requestor, falling back to the system
    /// actor for anonymous or unresolved callers
    pub fn by_requestor(self, requestor: &Requestor) -> Self {
        match requestor.identity() {
            Some(identity) => self.by(identity),
            None => self,
        }
    }

    pub fn entity(mut self, id: i64) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn in_org(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

impl Owned for AuditRecord {
    fn ownership(&self) -> Ownership {
        Ownership::new(self.organization.clone(), self.actor)
    }
}

/// Criteria for searching the audit log; all fields are conjunctive
#[derive(Debug, Clone, Default)]
pub struct AuditSearch {
    pub actor: Option<UserId>,
    pub actor_email: Option<String>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub organization: Option<String>,
    /// Inclusive lower bound on `recorded_at`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `recorded_at`
    pub until: Option<DateTime<Utc>>,
}

impl AuditSearch {
    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(actor) = self.actor {
            if record.actor != Some(actor) {
                return false;
            }
        }
        if let Some(email) = &self.actor_email {
            if &record.actor_email != email {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &record.action != action {
                return false;
            }
        }
        if let Some(entity_type) = &self.entity_type {
            if &record.entity_type != entity_type {
                return false;
            }
        }
        if let Some(org) = &self.organization {
            if record.organization.as_deref() != Some(org.as_str()) {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.recorded_at < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.recorded_at >= until {
                return false;
            }
        }
        true
    }
}

/// Write side of the audit log
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append a record
    async fn record(&self, record: AuditRecord) -> Result<()>;
}

/// Read side of the audit log
#[async_trait]
pub trait AuditQuery: Send + Sync {
    /// All records, newest first
    async fn list(&self) -> Result<Vec<AuditRecord>>;

    /// Records matching the search, newest first
    async fn search(&self, search: &AuditSearch) -> Result<Vec<AuditRecord>>;
}

/// Append a record, downgrading failure to a warning.
///
/// Audit writes ride along privileged mutations; the mutation's
/// outcome must not depend on the sink being healthy.
pub async fn record_or_warn(sink: &dyn AuditSink, record: AuditRecord) {
    let action = record.action.clone();
    if let Err(e) = sink.record(record).await {
        warn!(action = %action, error = %e, "audit record dropped");
    }
}

/// In-memory audit log
pub struct InMemoryAuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, record: AuditRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }
}

#[async_trait]
impl AuditQuery for InMemoryAuditLog {
    async fn list(&self) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().await;
        let mut out: Vec<_> = records.iter().cloned().collect();
        out.reverse();
        Ok(out)
    }

    async fn search(&self, search: &AuditSearch) -> Result<Vec<AuditRecord>> {
        let records = self.records.read().await;
        let mut out: Vec<_> = records.iter().filter(|r| search.matches(r)).cloned().collect();
        out.reverse();
        Ok(out)
    }
}

/// Requestor-scoped view over an audit log.
///
/// Global admins see the full trail; org admins and members see their
/// organization's slice. The legacy reporting endpoint is open, so
/// anonymous callers get the unfiltered trail.
pub struct AuditTrail {
    log: Arc<dyn AuditQuery>,
}

impl AuditTrail {
    pub fn new(log: Arc<dyn AuditQuery>) -> Self {
        Self { log }
    }

    /// Records visible to the requestor, newest first
    pub async fn list(&self, requestor: &Requestor) -> Result<Vec<AuditRecord>> {
        let decision = decide(requestor, None, AnonymousPolicy::AllowUnfiltered);
        let records = self.log.list().await?;
        Ok(filter_visible(&decision, records))
    }

    /// Matching records visible to the requestor, newest first
    pub async fn search(
        &self,
        requestor: &Requestor,
        search: &AuditSearch,
    ) -> Result<Vec<AuditRecord>> {
        let decision = decide(requestor, None, AnonymousPolicy::AllowUnfiltered);
        let records = self.log.search(search).await?;
        Ok(filter_visible(&decision, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use incentive_core::types::{AdminScope, Role};

    async fn seeded_log() -> InMemoryAuditLog {
        let log = InMemoryAuditLog::new();
        let acme_admin = Identity::new(1, "A", "a@acme.test", Role::Admin).with_organization("Acme");
        let globex_admin =
            Identity::new(2, "B", "b@globex.test", Role::Admin).with_organization("Globex");

        log.record(
            AuditRecord::new("DEAL_MARKED_PAID", "DEAL")
                .by(&acme_admin)
                .entity(10),
        )
        .await
        .unwrap();
        log.record(
            AuditRecord::new("USER_DISABLED", "USER")
                .by(&globex_admin)
                .entity(7),
        )
        .await
        .unwrap();
        log.record(AuditRecord::new("RULES_BOOTSTRAPPED", "RULE").in_org("Acme"))
            .await
            .unwrap();
        log
    }

    #[test]
    fn test_system_actor_fallback() {
        let record = AuditRecord::new("RULES_BOOTSTRAPPED", "RULE").by_requestor(&Requestor::Anonymous);
        assert_eq!(record.actor, None);
        assert_eq!(record.actor_email, SYSTEM_ACTOR);
    }

    #[test]
    fn test_actor_denormalization() {
        let admin = Identity::new(5, "Eve", "eve@acme.test", Role::Admin).with_organization("Acme");
        let record = AuditRecord::new("TARGET_UPDATED", "TARGET").by(&admin);
        assert_eq!(record.actor, Some(5));
        assert_eq!(record.actor_email, "eve@acme.test");
        assert_eq!(record.organization.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let log = InMemoryAuditLog::new();
        log.record(AuditRecord::new("FIRST", "X")).await.unwrap();
        log.record(AuditRecord::new("SECOND", "X")).await.unwrap();

        let records = log.list().await.unwrap();
        assert_eq!(records[0].action, "SECOND");
        assert_eq!(records[1].action, "FIRST");
    }

    #[tokio::test]
    async fn test_trail_scopes_to_org() {
        let trail = AuditTrail::new(Arc::new(seeded_log().await));
        let acme_admin = Requestor::Known(
            Identity::new(1, "A", "a@acme.test", Role::Admin).with_organization("Acme"),
        );

        let visible = trail.list(&acme_admin).await.unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible
            .iter()
            .all(|r| r.organization.as_deref() == Some("Acme")));
    }

    #[tokio::test]
    async fn test_trail_global_and_anonymous_unfiltered() {
        let trail = AuditTrail::new(Arc::new(seeded_log().await));
        let root = Requestor::Known(
            Identity::new(9, "R", "r@hq.test", Role::Admin).with_scope(AdminScope::Global),
        );

        assert_eq!(trail.list(&root).await.unwrap().len(), 3);
        assert_eq!(trail.list(&Requestor::Anonymous).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_filters_conjunctively() {
        let log = seeded_log().await;
        let search = AuditSearch {
            organization: Some("Acme".into()),
            action: Some("DEAL_MARKED_PAID".into()),
            ..Default::default()
        };
        let hits = log.search(&search).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, Some(10));

        let by_email = log
            .search(&AuditSearch {
                actor_email: Some("b@globex.test".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].action, "USER_DISABLED");
    }

    #[tokio::test]
    async fn test_search_time_window() {
        let log = seeded_log().await;
        let future = Utc::now() + chrono::Duration::hours(1);

        let hits = log
            .search(&AuditSearch {
                from: Some(future),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(hits.is_empty());

        let hits = log
            .search(&AuditSearch {
                until: Some(future),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_record_or_warn_swallows_errors() {
        struct FailingSink;

        #[async_trait]
        impl AuditSink for FailingSink {
            async fn record(&self, _record: AuditRecord) -> Result<()> {
                Err(crate::error::AuthzError::InvalidInput("sink down".into()))
            }
        }

        record_or_warn(&FailingSink, AuditRecord::new("X", "Y")).await;
    }
}
