//! Notification storage seam

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{Notification, UserId};

/// Read/write access to notifications
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Look up a notification by id
    async fn get(&self, id: i64) -> Result<Option<Notification>>;

    /// List one identity's notifications, newest first
    async fn list_by_user(&self, user: UserId) -> Result<Vec<Notification>>;

    /// Persist a notification, assigning an id when none is set
    async fn save(&self, notification: Notification) -> Result<Notification>;

    /// Persist several notifications
    async fn save_all(&self, notifications: Vec<Notification>) -> Result<Vec<Notification>>;

    /// Remove a notification
    async fn delete(&self, id: i64) -> Result<()>;

    /// Remove every notification addressed to one identity
    async fn delete_by_user(&self, user: UserId) -> Result<()>;
}

/// In-memory notification store
pub struct InMemoryNotificationStore {
    records: RwLock<BTreeMap<i64, Notification>>,
    next_id: AtomicI64,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn get(&self, id: i64) -> Result<Option<Notification>> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn list_by_user(&self, user: UserId) -> Result<Vec<Notification>> {
        let records = self.records.read().await;
        let mut list: Vec<Notification> = records
            .values()
            .filter(|n| n.user == user)
            .cloned()
            .collect();
        // Newest first, id as the stable tie-break
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn save(&self, mut notification: Notification) -> Result<Notification> {
        let mut records = self.records.write().await;
        if notification.id == 0 {
            notification.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        } else {
            self.next_id.fetch_max(notification.id + 1, Ordering::SeqCst);
        }
        records.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn save_all(&self, notifications: Vec<Notification>) -> Result<Vec<Notification>> {
        let mut saved = Vec::with_capacity(notifications.len());
        for notification in notifications {
            saved.push(self.save(notification).await?);
        }
        Ok(saved)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&id);
        Ok(())
    }

    async fn delete_by_user(&self, user: UserId) -> Result<()> {
        let mut records = self.records.write().await;
        records.retain(|_, n| n.user != user);
        Ok(())
    }
}
