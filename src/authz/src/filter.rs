//! Scoped Query Filter
//!
//! Applies an [`AccessDecision`] to a fetched resource set. Every list
//! operation goes through here after its store query, so a decision
//! that a store-side filter failed to honor still cannot leak rows.

use incentive_core::types::Owned;

use crate::decision::{AccessDecision, ScopeFilter};

/// Narrow `resources` to what `decision` permits.
///
/// Denied decisions and [`ScopeFilter::Nothing`] yield an empty set;
/// an organization scope retains only resources owned by that
/// organization. Resources with an unresolvable owner never pass an
/// organization scope. Order is preserved and the operation is
/// idempotent.
pub fn filter_visible<T: Owned>(decision: &AccessDecision, resources: Vec<T>) -> Vec<T> {
    if !decision.allowed {
        return Vec::new();
    }

    match &decision.scope {
        ScopeFilter::All => resources,
        ScopeFilter::Nothing => Vec::new(),
        ScopeFilter::Org(org) => resources
            .into_iter()
            .filter(|r| r.ownership().organization.as_deref() == Some(org.as_str()))
            .collect(),
    }
}
