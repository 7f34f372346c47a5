//! Identity Directory: lookups of identity records
//!
//! Decision code consumes snapshots from this seam; it never reaches
//! back into the directory mid-decision. The in-memory implementation
//! backs tests and single-node deployments.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{Identity, UserId};

/// Read/write access to identity records
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up an identity by id
    async fn find(&self, id: UserId) -> Result<Option<Identity>>;

    /// List identities, optionally narrowed to one organization
    async fn list(&self, organization: Option<&str>) -> Result<Vec<Identity>>;

    /// Persist an identity, assigning an id when none is set
    async fn save(&self, identity: Identity) -> Result<Identity>;

    /// Remove an identity
    async fn delete(&self, id: UserId) -> Result<()>;
}

/// In-memory identity directory
///
/// Iteration order is by id, so listings are deterministic.
pub struct InMemoryDirectory {
    records: RwLock<BTreeMap<UserId, Identity>>,
    next_id: AtomicI64,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn find(&self, id: UserId) -> Result<Option<Identity>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn list(&self, organization: Option<&str>) -> Result<Vec<Identity>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|i| match organization {
                Some(org) => i.organization.as_deref() == Some(org),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn save(&self, mut identity: Identity) -> Result<Identity> {
        let mut records = self.records.write().await;
        if identity.id == 0 {
            identity.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        } else {
            // Keep the generator ahead of explicitly chosen ids
            self.next_id.fetch_max(identity.id + 1, Ordering::SeqCst);
        }
        records.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn delete(&self, id: UserId) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[tokio::test]
    async fn test_save_and_find() {
        let dir = InMemoryDirectory::new();
        let saved = dir
            .save(Identity::new(0, "Alice", "alice@acme.test", Role::Sales))
            .await
            .unwrap();
        assert!(saved.id > 0);

        let found = dir.find(saved.id).await.unwrap();
        assert_eq!(found.unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn test_list_by_organization() {
        let dir = InMemoryDirectory::new();
        dir.save(Identity::new(1, "A", "a@x.test", Role::Sales).with_organization("Acme"))
            .await
            .unwrap();
        dir.save(Identity::new(2, "B", "b@x.test", Role::Sales).with_organization("Globex"))
            .await
            .unwrap();
        dir.save(Identity::new(3, "C", "c@x.test", Role::Sales))
            .await
            .unwrap();

        let acme = dir.list(Some("Acme")).await.unwrap();
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].id, 1);

        let all = dir.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
