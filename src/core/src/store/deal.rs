//! Deal storage seam

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::Deal;

/// Read/write access to deals
#[async_trait]
pub trait DealStore: Send + Sync {
    /// Look up a deal by id
    async fn get(&self, id: i64) -> Result<Option<Deal>>;

    /// Look up several deals; missing ids are skipped
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Deal>>;

    /// List deals, optionally narrowed to one owning organization
    async fn list(&self, organization: Option<&str>) -> Result<Vec<Deal>>;

    /// Persist a deal, assigning an id when none is set
    async fn save(&self, deal: Deal) -> Result<Deal>;

    /// Persist several deals
    async fn save_all(&self, deals: Vec<Deal>) -> Result<Vec<Deal>>;
}

/// In-memory deal store
pub struct InMemoryDealStore {
    records: RwLock<BTreeMap<i64, Deal>>,
    next_id: AtomicI64,
}

impl InMemoryDealStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryDealStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DealStore for InMemoryDealStore {
    async fn get(&self, id: i64) -> Result<Option<Deal>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Deal>> {
        let records = self.records.read().await;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn list(&self, organization: Option<&str>) -> Result<Vec<Deal>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|d| match organization {
                Some(org) => d.organization.as_deref() == Some(org),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn save(&self, mut deal: Deal) -> Result<Deal> {
        let mut records = self.records.write().await;
        if deal.id == 0 {
            deal.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        } else {
            self.next_id.fetch_max(deal.id + 1, Ordering::SeqCst);
        }
        records.insert(deal.id, deal.clone());
        Ok(deal)
    }

    async fn save_all(&self, deals: Vec<Deal>) -> Result<Vec<Deal>> {
        let mut saved = Vec::with_capacity(deals.len());
        for deal in deals {
            saved.push(self.save(deal).await?);
        }
        Ok(saved)
    }
}
