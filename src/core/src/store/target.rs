//! Sales target storage seam

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{SalesTarget, UserId};

/// Read/write access to sales targets
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Look up the target for one identity
    async fn find_by_user(&self, user: UserId) -> Result<Option<SalesTarget>>;

    /// List every target
    async fn list(&self) -> Result<Vec<SalesTarget>>;

    /// Persist a target, assigning an id when none is set
    async fn save(&self, target: SalesTarget) -> Result<SalesTarget>;

    /// Remove a target
    async fn delete(&self, id: i64) -> Result<()>;
}

/// In-memory target store
pub struct InMemoryTargetStore {
    records: RwLock<BTreeMap<i64, SalesTarget>>,
    next_id: AtomicI64,
}

impl InMemoryTargetStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryTargetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetStore for InMemoryTargetStore {
    async fn find_by_user(&self, user: UserId) -> Result<Option<SalesTarget>> {
        let records = self.records.read().await;
        Ok(records.values().find(|t| t.user == user).cloned())
    }

    async fn list(&self) -> Result<Vec<SalesTarget>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn save(&self, mut target: SalesTarget) -> Result<SalesTarget> {
        let mut records = self.records.write().await;
        if target.id == 0 {
            target.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        } else {
            self.next_id.fetch_max(target.id + 1, Ordering::SeqCst);
        }
        records.insert(target.id, target.clone());
        Ok(target)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&id);
        Ok(())
    }
}
