//! Monthly sales targets

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::identity::UserId;
use super::ownership::{Owned, Ownership};

/// Monthly target auto-created for an identity that has none.
pub const DEFAULT_MONTHLY_TARGET: Decimal = dec!(100_000);

/// A sales target record for one identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTarget {
    /// Target identifier
    pub id: i64,

    /// Identity the target belongs to
    pub user: UserId,

    /// Owning organization, denormalized from the identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Target amount for the current month
    pub monthly_target: Decimal,

    /// Performance rating
    #[serde(default)]
    pub rating: Decimal,

    /// Free-text achievements
    #[serde(default)]
    pub achievements: String,
}

impl SalesTarget {
    /// Create a target with an explicit amount
    pub fn new(id: i64, user: UserId, monthly_target: Decimal) -> Self {
        Self {
            id,
            user,
            organization: None,
            monthly_target,
            rating: Decimal::ZERO,
            achievements: String::new(),
        }
    }

    /// Create the default target auto-provisioned on first access
    pub fn default_for(id: i64, user: UserId) -> Self {
        Self::new(id, user, DEFAULT_MONTHLY_TARGET)
    }

    /// Set the owning organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

impl Owned for SalesTarget {
    fn ownership(&self) -> Ownership {
        Ownership {
            organization: self.organization.clone(),
            owner: Some(self.user),
        }
    }
}
