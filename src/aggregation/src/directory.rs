//! User administration over the identity directory

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use incentive_authz::{
    decide, filter_visible, record_or_warn, AnonymousPolicy, AuditRecord, AuditSink, Requestor,
};
use incentive_core::directory::IdentityDirectory;
use incentive_core::store::NotificationStore;
use incentive_core::types::{AccountStatus, Identity, Owned, Role, UserId};

use crate::error::{AggregationError, Result};

/// Partial update applied to an identity record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Administrative operations on identities
pub struct DirectoryService {
    directory: Arc<dyn IdentityDirectory>,
    notifications: Arc<dyn NotificationStore>,
    audit: Arc<dyn AuditSink>,
}

impl DirectoryService {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        notifications: Arc<dyn NotificationStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            directory,
            notifications,
            audit,
        }
    }

    async fn find_or_missing(&self, id: UserId) -> Result<Identity> {
        self.directory
            .find(id)
            .await?
            .ok_or_else(|| AggregationError::NotFound(format!("user {id}")))
    }

    fn require_admin_over(&self, requestor: &Requestor, subject: &Identity) -> Result<()> {
        let allowed = requestor
            .identity()
            .map(|actor| actor.administers(subject.organization.as_deref()))
            .unwrap_or(false);
        if !allowed {
            return Err(AggregationError::Forbidden(format!(
                "no administrative scope over user {}",
                subject.id
            )));
        }
        Ok(())
    }

    /// Identities visible to the requestor.
    ///
    /// This listing stays strict for anonymous callers: no identity,
    /// no data.
    pub async fn list_users(&self, requestor: &Requestor) -> Result<Vec<Identity>> {
        let decision = decide(requestor, None, AnonymousPolicy::DenyAll);
        if !decision.allowed {
            return Ok(Vec::new());
        }
        let fetched = self.directory.list(decision.org_filter()).await?;
        Ok(filter_visible(&decision, fetched))
    }

    /// Update identity fields.
    ///
    /// Permitted for global admins, admins of the subject's
    /// organization, and the subject themselves; only global admins
    /// may move an identity between organizations or change roles.
    pub async fn update_user(
        &self,
        requestor: &Requestor,
        id: UserId,
        update: IdentityUpdate,
    ) -> Result<Identity> {
        let mut subject = self.find_or_missing(id).await?;

        let decision = decide(requestor, Some(&subject.ownership()), AnonymousPolicy::DenyAll);
        if !decision.allowed {
            return Err(AggregationError::Forbidden(format!(
                "cannot update user {id}"
            )));
        }

        if update.organization.is_some() || update.role.is_some() {
            let is_global = requestor
                .identity()
                .map(Identity::is_global_admin)
                .unwrap_or(false);
            if !is_global {
                return Err(AggregationError::Forbidden(
                    "organization and role changes require global scope".into(),
                ));
            }
        }

        if let Some(name) = update.name {
            subject.name = name;
        }
        if let Some(email) = update.email {
            subject.email = email;
        }
        if let Some(organization) = update.organization {
            subject.organization = Some(organization);
        }
        if let Some(role) = update.role {
            subject.role = role;
        }

        let saved = self.directory.save(subject).await?;
        let record = AuditRecord::new("USER_UPDATED", "USER")
            .by_requestor(requestor)
            .entity(saved.id)
            .detail(saved.email.clone());
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(saved)
    }

    /// Enable or disable an account; admin-only
    pub async fn set_account_status(
        &self,
        requestor: &Requestor,
        id: UserId,
        status: AccountStatus,
    ) -> Result<Identity> {
        let mut subject = self.find_or_missing(id).await?;
        self.require_admin_over(requestor, &subject)?;

        subject.account_status = status;
        let saved = self.directory.save(subject).await?;

        info!(user = id, ?status, "account status changed");
        let record = AuditRecord::new("USER_STATUS_CHANGED", "USER")
            .by_requestor(requestor)
            .entity(id)
            .detail(format!("{status:?}"));
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(saved)
    }

    /// Remove an identity and its notifications; admin-only
    pub async fn delete_user(&self, requestor: &Requestor, id: UserId) -> Result<()> {
        let subject = self.find_or_missing(id).await?;
        self.require_admin_over(requestor, &subject)?;

        self.directory.delete(id).await?;
        self.notifications.delete_by_user(id).await?;

        let record = AuditRecord::new("USER_DELETED", "USER")
            .by_requestor(requestor)
            .entity(id)
            .detail(subject.email.clone());
        record_or_warn(self.audit.as_ref(), record).await;
        Ok(())
    }
}
