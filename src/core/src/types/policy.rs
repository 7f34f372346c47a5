//! Incentive policy documents

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ownership::{Owned, Ownership};

/// An incentive policy document published to an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDoc {
    /// Document identifier
    pub id: i64,

    /// Document title
    pub title: String,

    /// Document category (COMMISSION, CONDUCT, ...)
    pub doc_type: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Full document body
    #[serde(default)]
    pub content: String,

    /// Commission rate the policy defines, in percent
    #[serde(default)]
    pub commission_rate: Decimal,

    /// Whether the document is live (drafts are inactive)
    pub active: bool,

    /// Owning organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Last modification time
    pub last_updated: DateTime<Utc>,
}

impl PolicyDoc {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        doc_type: impl Into<String>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            doc_type: doc_type.into(),
            description: String::new(),
            content: String::new(),
            commission_rate: Decimal::ZERO,
            active: true,
            organization: None,
            last_updated,
        }
    }

    /// Set the owning organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Mark the document inactive (draft)
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

impl Owned for PolicyDoc {
    fn ownership(&self) -> Ownership {
        Ownership::new(self.organization.clone(), None)
    }
}
