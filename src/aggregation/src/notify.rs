//! Notification listing, mutation, and broadcast

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use incentive_authz::{
    decide, filter_visible, record_or_warn, AnonymousPolicy, AuditRecord, AuditSink, Requestor,
};
use incentive_core::directory::IdentityDirectory;
use incentive_core::store::NotificationStore;
use incentive_core::types::{
    Notification, Owned, Ownership, Role, UserId, DEFAULT_NOTIFICATION_KIND,
};

use crate::error::{AggregationError, Result};

/// Explicit composition settings for generated message bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Base URL embedded in generated links
    pub frontend_url: String,

    /// Address generated mail claims to come from
    pub sender_email: String,
}

impl ComposerConfig {
    /// Title line for an administrative broadcast
    pub fn broadcast_title(&self, title: &str) -> String {
        format!("ADMIN: {title}")
    }

    /// Body for an invitation message
    pub fn invite_message(&self, recipient_name: &str) -> String {
        format!(
            "Hello {recipient_name},\n\nYou have been invited to the sales incentive portal. \
             Sign in at {} to get started.\n\n{}",
            self.frontend_url, self.sender_email
        )
    }
}

/// Notification routines
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
    directory: Arc<dyn IdentityDirectory>,
    audit: Arc<dyn AuditSink>,
    composer: ComposerConfig,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        directory: Arc<dyn IdentityDirectory>,
        audit: Arc<dyn AuditSink>,
        composer: ComposerConfig,
    ) -> Self {
        Self {
            notifications,
            directory,
            audit,
            composer,
        }
    }

    async fn target_ownership(&self, user: UserId) -> Result<Ownership> {
        Ok(match self.directory.find(user).await? {
            Some(identity) => identity.ownership(),
            None => Ownership::of_owner(user),
        })
    }

    /// One identity's notifications, newest first.
    ///
    /// Visible to the identity itself and admins of its organization;
    /// everyone else gets an empty list, not an error.
    pub async fn list(&self, requestor: &Requestor, user: UserId) -> Result<Vec<Notification>> {
        let ownership = self.target_ownership(user).await?;
        let decision = decide(requestor, Some(&ownership), AnonymousPolicy::DenyAll);
        if !decision.allowed {
            return Ok(Vec::new());
        }
        Ok(self.notifications.list_by_user(user).await?)
    }

    /// Create a notification addressed to one identity
    pub async fn create(
        &self,
        requestor: &Requestor,
        user: UserId,
        kind: Option<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Notification> {
        let ownership = self.target_ownership(user).await?;
        let decision = decide(requestor, Some(&ownership), AnonymousPolicy::DenyAll);
        if !decision.allowed {
            return Err(AggregationError::Forbidden(format!(
                "cannot notify user {user}"
            )));
        }

        let mut notification = Notification::new(
            0,
            user,
            kind.unwrap_or_else(|| DEFAULT_NOTIFICATION_KIND.to_string()),
            title,
            message,
            Utc::now(),
        );
        notification.organization = ownership.organization;
        Ok(self.notifications.save(notification).await?)
    }

    /// Mark one notification read; silently ignores non-owners
    pub async fn mark_read(&self, requestor: &Requestor, id: i64) -> Result<()> {
        let Some(mut notification) = self.notifications.get(id).await? else {
            return Ok(());
        };
        if !requestor.is(notification.user) {
            debug!(id, "ignoring mark_read from non-owner");
            return Ok(());
        }
        notification.read = true;
        self.notifications.save(notification).await?;
        Ok(())
    }

    /// Mark all of one identity's notifications read; silently ignores
    /// non-owners
    pub async fn mark_all_read(&self, requestor: &Requestor, user: UserId) -> Result<()> {
        if !requestor.is(user) {
            debug!(user, "ignoring mark_all_read from non-owner");
            return Ok(());
        }
        let mut unread: Vec<Notification> = self
            .notifications
            .list_by_user(user)
            .await?
            .into_iter()
            .filter(|n| !n.read)
            .collect();
        for notification in &mut unread {
            notification.read = true;
        }
        self.notifications.save_all(unread).await?;
        Ok(())
    }

    /// Delete one notification; silently ignores non-owners
    pub async fn delete(&self, requestor: &Requestor, id: i64) -> Result<()> {
        let Some(notification) = self.notifications.get(id).await? else {
            return Ok(());
        };
        if !requestor.is(notification.user) {
            debug!(id, "ignoring delete from non-owner");
            return Ok(());
        }
        self.notifications.delete(id).await?;
        Ok(())
    }

    /// Delete all of one identity's notifications; silently ignores
    /// non-owners
    pub async fn clear(&self, requestor: &Requestor, user: UserId) -> Result<()> {
        if !requestor.is(user) {
            debug!(user, "ignoring clear from non-owner");
            return Ok(());
        }
        self.notifications.delete_by_user(user).await?;
        Ok(())
    }

    /// Broadcast to every identity in scope, optionally narrowed to
    /// one role. Returns the number of notifications created.
    pub async fn broadcast(
        &self,
        requestor: &Requestor,
        role: Option<Role>,
        title: &str,
        message: &str,
    ) -> Result<usize> {
        let Some(actor) = requestor.identity() else {
            return Err(AggregationError::Forbidden("broadcast requires an identity".into()));
        };
        if !actor.is_global_admin() && !actor.administers(actor.organization.as_deref()) {
            return Err(AggregationError::Forbidden(
                "broadcast requires administrative scope".into(),
            ));
        }

        let decision = decide(requestor, None, AnonymousPolicy::DenyAll);
        let fetched = self.directory.list(decision.org_filter()).await?;
        let recipients = filter_visible(&decision, fetched);

        let now = Utc::now();
        let prefixed = self.composer.broadcast_title(title);
        let batch: Vec<Notification> = recipients
            .into_iter()
            .filter(|identity| role.map_or(true, |r| identity.role == r))
            .map(|identity| {
                let mut n = Notification::new(
                    0,
                    identity.id,
                    DEFAULT_NOTIFICATION_KIND,
                    prefixed.clone(),
                    message,
                    now,
                );
                n.organization = identity.organization;
                n
            })
            .collect();

        let count = batch.len();
        self.notifications.save_all(batch).await?;

        info!(count, title, "broadcast sent");
        let record = AuditRecord::new("NOTIFICATIONS_BROADCAST", "NOTIFICATION")
            .by_requestor(requestor)
            .detail(format!("{count} recipients, title \"{title}\""));
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use incentive_authz::InMemoryAuditLog;
    use incentive_core::directory::InMemoryDirectory;
    use incentive_core::store::InMemoryNotificationStore;
    use incentive_core::types::Identity;

    fn composer() -> ComposerConfig {
        ComposerConfig {
            frontend_url: "https://portal.test".into(),
            sender_email: "noreply@portal.test".into(),
        }
    }

    async fn service() -> (NotificationService, Arc<InMemoryNotificationStore>) {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .save(Identity::new(0, "Ana", "ana@acme.test", Role::Admin).with_organization("Acme"))
            .await
            .unwrap();
        directory
            .save(Identity::new(0, "Sam", "sam@acme.test", Role::Sales).with_organization("Acme"))
            .await
            .unwrap();
        directory
            .save(Identity::new(0, "Gia", "gia@globex.test", Role::Sales).with_organization("Globex"))
            .await
            .unwrap();

        let store = Arc::new(InMemoryNotificationStore::new());
        let service = NotificationService::new(
            store.clone(),
            directory,
            Arc::new(InMemoryAuditLog::new()),
            composer(),
        );
        (service, store)
    }

    fn known(id: UserId, role: Role, org: &str) -> Requestor {
        Requestor::Known(Identity::new(id, "X", "x@test", role).with_organization(org))
    }

    #[tokio::test]
    async fn test_create_denormalizes_target_org() {
        let (service, _) = service().await;
        let ana = known(1, Role::Admin, "Acme");

        let n = service
            .create(&ana, 2, None, "Welcome", "hello")
            .await
            .unwrap();
        assert_eq!(n.kind, DEFAULT_NOTIFICATION_KIND);
        assert_eq!(n.organization.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_create_rejects_cross_org() {
        let (service, _) = service().await;
        let ana = known(1, Role::Admin, "Acme");

        let result = service.create(&ana, 3, None, "Hi", "x").await;
        assert!(matches!(result, Err(AggregationError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_owner_only_mutations_are_silent_noops() {
        let (service, store) = service().await;
        let ana = known(1, Role::Admin, "Acme");
        let n = service.create(&ana, 2, None, "Welcome", "hello").await.unwrap();

        // An admin is not the owner; nothing changes, nothing errors
        service.mark_read(&ana, n.id).await.unwrap();
        assert!(!store.get(n.id).await.unwrap().unwrap().read);
        service.delete(&ana, n.id).await.unwrap();
        assert!(store.get(n.id).await.unwrap().is_some());

        // The owner's calls take effect
        let sam = known(2, Role::Sales, "Acme");
        service.mark_read(&sam, n.id).await.unwrap();
        assert!(store.get(n.id).await.unwrap().unwrap().read);
        service.delete(&sam, n.id).await.unwrap();
        assert!(store.get(n.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_all_read_and_clear() {
        let (service, store) = service().await;
        let ana = known(1, Role::Admin, "Acme");
        let sam = known(2, Role::Sales, "Acme");

        service.create(&ana, 2, None, "a", "x").await.unwrap();
        service.create(&ana, 2, None, "b", "y").await.unwrap();

        service.mark_all_read(&sam, 2).await.unwrap();
        assert!(store.list_by_user(2).await.unwrap().iter().all(|n| n.read));

        service.clear(&sam, 2).await.unwrap();
        assert!(store.list_by_user(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_prefixes_and_scopes() {
        let (service, store) = service().await;
        let ana = known(1, Role::Admin, "Acme");

        let count = service
            .broadcast(&ana, None, "Quarter closing", "Submit your deals")
            .await
            .unwrap();
        // Ana and Sam; Gia is in another organization
        assert_eq!(count, 2);

        let sams = store.list_by_user(2).await.unwrap();
        assert_eq!(sams[0].title, "ADMIN: Quarter closing");
        assert!(store.list_by_user(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_role_filter() {
        let (service, store) = service().await;
        let ana = known(1, Role::Admin, "Acme");

        let count = service
            .broadcast(&ana, Some(Role::Sales), "Heads up", "x")
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(store.list_by_user(1).await.unwrap().is_empty());
        assert_eq!(store.list_by_user(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_requires_admin() {
        let (service, _) = service().await;
        let sam = known(2, Role::Sales, "Acme");

        let result = service.broadcast(&sam, None, "No", "x").await;
        assert!(matches!(result, Err(AggregationError::Forbidden(_))));
    }

    #[test]
    fn test_invite_message_carries_config() {
        let c = composer();
        let body = c.invite_message("Sam");
        assert!(body.contains("https://portal.test"));
        assert!(body.contains("noreply@portal.test"));
    }
}
