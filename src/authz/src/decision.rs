//! Access Decision Engine
//!
//! One pure decision procedure replacing the per-endpoint
//! `isGlobalAdmin / isSameOrgAdmin` blocks. Given a requestor snapshot
//! and a target resource's ownership, it answers "may this identity
//! act here" and, for list operations, which organization slice the
//! caller must intersect the result with.

use serde::{Deserialize, Serialize};
use tracing::debug;

use incentive_core::types::{Identity, Ownership};

use crate::requestor::Requestor;

/// Behavior when no requestor identity is supplied.
///
/// The legacy callers of this system are inconsistent on purpose: some
/// reads return the unfiltered global dataset when no requestor is
/// given, others return nothing. Each operation states its policy
/// explicitly by passing one of these, so the quirk lives at the call
/// site instead of being silently unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnonymousPolicy {
    /// Anonymous callers see everything (legacy open endpoints)
    AllowUnfiltered,
    /// Anonymous callers see nothing
    DenyAll,
}

/// Organization slice a caller must intersect results with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeFilter {
    /// No narrowing; the requestor sees everything
    All,
    /// Only resources owned by this organization
    Org(String),
    /// Matches no resource at all.
    ///
    /// Produced for identities that are allowed in principle but have
    /// no organization assigned yet; they see nothing until assigned,
    /// never the global dataset.
    Nothing,
}

impl ScopeFilter {
    /// The organization constraint, if one applies
    pub fn organization(&self) -> Option<&str> {
        match self {
            ScopeFilter::Org(name) => Some(name),
            _ => None,
        }
    }
}

/// Outcome of an access decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether the operation may proceed
    pub allowed: bool,

    /// Narrowing the caller must apply before returning results
    pub scope: ScopeFilter,
}

impl AccessDecision {
    /// Allowed with no narrowing
    pub fn allow_all() -> Self {
        Self {
            allowed: true,
            scope: ScopeFilter::All,
        }
    }

    /// Allowed within one organization
    pub fn allow_org(organization: impl Into<String>) -> Self {
        Self {
            allowed: true,
            scope: ScopeFilter::Org(organization.into()),
        }
    }

    /// Allowed but matching nothing
    pub fn allow_nothing() -> Self {
        Self {
            allowed: true,
            scope: ScopeFilter::Nothing,
        }
    }

    /// Denied
    pub fn denied() -> Self {
        Self {
            allowed: false,
            scope: ScopeFilter::Nothing,
        }
    }

    /// Organization constraint to push down to a store query, if any
    pub fn org_filter(&self) -> Option<&str> {
        self.scope.organization()
    }
}

/// Decide whether `requestor` may act on `target`.
///
/// `target` is `None` for list operations; the returned scope then
/// tells the caller which slice of the dataset to produce. Precedence:
///
/// 1. anonymous requestor → per-operation [`AnonymousPolicy`]
/// 2. unresolved requestor id → denied
/// 3. global scope → allowed, unfiltered
/// 4. org admin over the target's organization → allowed
/// 5. self-access (requestor owns the target) → allowed, any role
/// 6. otherwise → denied
///
/// Pure over the supplied snapshots; no directory access happens here.
pub fn decide(
    requestor: &Requestor,
    target: Option<&Ownership>,
    anonymous: AnonymousPolicy,
) -> AccessDecision {
    let identity = match requestor {
        Requestor::Anonymous => {
            return match anonymous {
                AnonymousPolicy::AllowUnfiltered => AccessDecision::allow_all(),
                AnonymousPolicy::DenyAll => AccessDecision::denied(),
            };
        }
        Requestor::Unknown(id) => {
            debug!(requestor = id, "denying unresolved requestor");
            return AccessDecision::denied();
        }
        Requestor::Known(identity) => identity,
    };

    if identity.is_global_admin() {
        return AccessDecision::allow_all();
    }

    match target {
        Some(ownership) => decide_for_target(identity, ownership),
        None => decide_for_listing(identity),
    }
}

fn decide_for_target(identity: &Identity, ownership: &Ownership) -> AccessDecision {
    if let Some(org) = &identity.organization {
        if identity.administers(ownership.organization.as_deref()) {
            return AccessDecision::allow_org(org.clone());
        }
    }

    // Self-access is unconditional, whatever the role
    if ownership.owner == Some(identity.id) {
        return AccessDecision::allow_all();
    }

    AccessDecision::denied()
}

fn decide_for_listing(identity: &Identity) -> AccessDecision {
    match &identity.organization {
        Some(org) => AccessDecision::allow_org(org.clone()),
        // Allowed in principle, but sees nothing until assigned
        None => AccessDecision::allow_nothing(),
    }
}
