//! Rule configuration storage seam

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::RuleConfig;

/// Read/write access to alerting rules
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// List every rule
    async fn list_all(&self) -> Result<Vec<RuleConfig>>;

    /// List the rules owned by one organization
    async fn list_by_org(&self, organization: &str) -> Result<Vec<RuleConfig>>;

    /// Persist a rule, assigning an id when none is set
    async fn save(&self, rule: RuleConfig) -> Result<RuleConfig>;

    /// Remove a rule
    async fn delete(&self, id: i64) -> Result<()>;
}

/// In-memory rule store
pub struct InMemoryRuleStore {
    records: RwLock<BTreeMap<i64, RuleConfig>>,
    next_id: AtomicI64,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn list_all(&self) -> Result<Vec<RuleConfig>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn list_by_org(&self, organization: &str) -> Result<Vec<RuleConfig>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.organization == organization)
            .cloned()
            .collect())
    }

    async fn save(&self, mut rule: RuleConfig) -> Result<RuleConfig> {
        let mut records = self.records.write().await;
        if rule.id == 0 {
            rule.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        } else {
            self.next_id.fetch_max(rule.id + 1, Ordering::SeqCst);
        }
        records.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&id);
        Ok(())
    }
}
