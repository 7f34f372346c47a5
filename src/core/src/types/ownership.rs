//! The single resolvable owner of a resource
//!
//! Every resource that participates in authorization exposes exactly
//! one `Ownership`: an owning organization, an owning identity, or
//! both. Resources with neither are treated as unresolvable and are
//! excluded by any organization-scoped filter.

use serde::{Deserialize, Serialize};

use super::identity::UserId;

/// Resolved owner of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    /// Owning organization, if any
    pub organization: Option<String>,

    /// Owning identity, if any
    pub owner: Option<UserId>,
}

impl Ownership {
    /// Ownership by organization only
    pub fn of_org(organization: impl Into<String>) -> Self {
        Self {
            organization: Some(organization.into()),
            owner: None,
        }
    }

    /// Ownership by identity only
    pub fn of_owner(owner: UserId) -> Self {
        Self {
            organization: None,
            owner: Some(owner),
        }
    }

    /// Ownership by both organization and identity
    pub fn new(organization: Option<String>, owner: Option<UserId>) -> Self {
        Self { organization, owner }
    }

    /// Whether neither an organization nor an owner resolves
    pub fn is_unresolvable(&self) -> bool {
        self.organization.is_none() && self.owner.is_none()
    }
}

/// Resources that expose a resolvable owner
pub trait Owned {
    /// Resolve this resource's owner
    fn ownership(&self) -> Ownership;
}
