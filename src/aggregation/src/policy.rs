//! Policy document views

use std::sync::Arc;

use chrono::Utc;

use incentive_authz::{
    decide, filter_visible, record_or_warn, AnonymousPolicy, AuditRecord, AuditSink, Requestor,
};
use incentive_core::store::{PolicyDocFilter, PolicyDocStore};
use incentive_core::types::PolicyDoc;

use crate::error::{AggregationError, Result};

/// Requestor-scoped views over incentive policy documents
pub struct PolicyDocService {
    docs: Arc<dyn PolicyDocStore>,
    audit: Arc<dyn AuditSink>,
}

impl PolicyDocService {
    pub fn new(docs: Arc<dyn PolicyDocStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { docs, audit }
    }

    async fn list_scoped(
        &self,
        requestor: &Requestor,
        doc_type: Option<&str>,
        active_only: bool,
    ) -> Result<Vec<PolicyDoc>> {
        let decision = decide(requestor, None, AnonymousPolicy::AllowUnfiltered);
        let fetched = self
            .docs
            .list(PolicyDocFilter {
                organization: decision.org_filter(),
                doc_type,
                active_only,
            })
            .await?;
        Ok(filter_visible(&decision, fetched))
    }

    /// Live documents visible to the requestor
    pub async fn list_active(
        &self,
        requestor: &Requestor,
        doc_type: Option<&str>,
    ) -> Result<Vec<PolicyDoc>> {
        self.list_scoped(requestor, doc_type, true).await
    }

    /// All documents visible to the requestor, drafts included
    pub async fn list_all(
        &self,
        requestor: &Requestor,
        doc_type: Option<&str>,
    ) -> Result<Vec<PolicyDoc>> {
        self.list_scoped(requestor, doc_type, false).await
    }

    /// Create or update a document.
    ///
    /// Non-global admins always write into their own organization and
    /// the modification time is stamped here, not taken from the
    /// submitted document.
    pub async fn upsert(&self, requestor: &Requestor, mut doc: PolicyDoc) -> Result<PolicyDoc> {
        let Some(actor) = requestor.identity() else {
            return Err(AggregationError::Forbidden(
                "policy document writes require an identity".into(),
            ));
        };
        if !actor.is_global_admin() {
            if !actor.administers(actor.organization.as_deref()) {
                return Err(AggregationError::Forbidden(
                    "policy document writes require administrative scope".into(),
                ));
            }
            doc.organization = actor.organization.clone();
        }

        doc.last_updated = Utc::now();
        let saved = self.docs.save(doc).await?;

        let record = AuditRecord::new("POLICY_DOC_SAVED", "POLICY_DOC")
            .by_requestor(requestor)
            .entity(saved.id)
            .detail(saved.title.clone());
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(saved)
    }

    /// Remove a document within the requestor's scope
    pub async fn delete(&self, requestor: &Requestor, id: i64) -> Result<()> {
        let doc = self
            .docs
            .get(id)
            .await?
            .ok_or_else(|| AggregationError::NotFound(format!("policy document {id}")))?;

        let allowed = requestor
            .identity()
            .map(|actor| actor.administers(doc.organization.as_deref()))
            .unwrap_or(false);
        if !allowed {
            return Err(AggregationError::Forbidden(format!(
                "policy document {id} is outside the requestor's scope"
            )));
        }

        self.docs.delete(id).await?;
        let record = AuditRecord::new("POLICY_DOC_DELETED", "POLICY_DOC")
            .by_requestor(requestor)
            .entity(id)
            .detail(doc.title);
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(())
    }
}
