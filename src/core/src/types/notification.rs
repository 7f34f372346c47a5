//! In-app notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::UserId;
use super::ownership::{Owned, Ownership};

/// Notification kind used when the caller supplies none.
pub const DEFAULT_NOTIFICATION_KIND: &str = "ANNOUNCEMENT";

/// A notification targeted at one identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier
    pub id: i64,

    /// Identity the notification is addressed to
    pub user: UserId,

    /// Owning organization, denormalized from the target identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Notification kind (ANNOUNCEMENT, POLICY_UPDATE, ...)
    pub kind: String,

    /// Title line
    pub title: String,

    /// Body text
    pub message: String,

    /// Whether the target has read it
    #[serde(default)]
    pub read: bool,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: i64,
        user: UserId,
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user,
            organization: None,
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            read: false,
            created_at,
        }
    }

    /// Set the owning organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

impl Owned for Notification {
    fn ownership(&self) -> Ownership {
        Ownership {
            organization: self.organization.clone(),
            owner: Some(self.user),
        }
    }
}
