//! Policy document storage seam

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::PolicyDoc;

/// Filters applied when listing policy documents
#[derive(Debug, Clone, Default)]
pub struct PolicyDocFilter<'a> {
    /// Restrict to one owning organization
    pub organization: Option<&'a str>,
    /// Restrict to one document category
    pub doc_type: Option<&'a str>,
    /// Exclude inactive drafts
    pub active_only: bool,
}

/// Read/write access to policy documents
#[async_trait]
pub trait PolicyDocStore: Send + Sync {
    /// Look up a document by id
    async fn get(&self, id: i64) -> Result<Option<PolicyDoc>>;

    /// List documents matching the filter
    async fn list(&self, filter: PolicyDocFilter<'_>) -> Result<Vec<PolicyDoc>>;

    /// Persist a document, assigning an id when none is set
    async fn save(&self, doc: PolicyDoc) -> Result<PolicyDoc>;

    /// Remove a document
    async fn delete(&self, id: i64) -> Result<()>;
}

/// In-memory policy document store
pub struct InMemoryPolicyDocStore {
    records: RwLock<BTreeMap<i64, PolicyDoc>>,
    next_id: AtomicI64,
}

impl InMemoryPolicyDocStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryPolicyDocStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyDocStore for InMemoryPolicyDocStore {
    async fn get(&self, id: i64) -> Result<Option<PolicyDoc>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn list(&self, filter: PolicyDocFilter<'_>) -> Result<Vec<PolicyDoc>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|d| match filter.organization {
                Some(org) => d.organization.as_deref() == Some(org),
                None => true,
            })
            .filter(|d| match filter.doc_type {
                Some(t) => d.doc_type == t,
                None => true,
            })
            .filter(|d| !filter.active_only || d.active)
            .cloned()
            .collect())
    }

    async fn save(&self, mut doc: PolicyDoc) -> Result<PolicyDoc> {
        let mut records = self.records.write().await;
        if doc.id == 0 {
            doc.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        } else {
            self.next_id.fetch_max(doc.id + 1, Ordering::SeqCst);
        }
        records.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&id);
        Ok(())
    }
}
