//! Identity records as resolved from the directory

use serde::{Deserialize, Serialize};

use super::ownership::{Owned, Ownership};

/// Numeric identity key, matching the directory's primary key
pub type UserId = i64;

/// Functional role of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Sales representative
    Sales,
    /// Organization administrator
    Admin,
}

/// Administrative visibility scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminScope {
    /// No administrative visibility
    None,
    /// Sees a single organization
    Org,
    /// Sees every organization
    Global,
}

/// Account lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    Active,
    Disabled,
}

/// An identity snapshot.
///
/// Snapshots are resolved once per request and treated as immutable for
/// the duration of that request; decision code never re-queries the
/// directory mid-request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Directory primary key
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Login email
    pub email: String,

    /// Functional role
    pub role: Role,

    /// Owning organization, if assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Administrative visibility scope
    pub admin_scope: AdminScope,

    /// Account lifecycle state
    pub account_status: AccountStatus,
}

impl Identity {
    /// Create a new active identity with no admin scope
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        let admin_scope = match role {
            Role::Admin => AdminScope::Org,
            Role::Sales => AdminScope::None,
        };

        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            organization: None,
            admin_scope,
            account_status: AccountStatus::Active,
        }
    }

    /// Assign the identity to an organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Grant an explicit admin scope
    pub fn with_scope(mut self, scope: AdminScope) -> Self {
        self.admin_scope = scope;
        self
    }

    /// Whether this identity sees every organization
    pub fn is_global_admin(&self) -> bool {
        self.admin_scope == AdminScope::Global
    }

    /// Whether this identity administers the given organization
    pub fn administers(&self, organization: Option<&str>) -> bool {
        if self.is_global_admin() {
            return true;
        }
        self.role == Role::Admin
            && self.organization.is_some()
            && self.organization.as_deref() == organization
    }
}

impl Owned for Identity {
    fn ownership(&self) -> Ownership {
        Ownership {
            organization: self.organization.clone(),
            owner: Some(self.id),
        }
    }
}
