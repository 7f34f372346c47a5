//! Requestor resolution
//!
//! An identity is resolved from the directory exactly once per request
//! and carried as a snapshot for every decision made while serving that
//! request. Resolving twice would open a time-of-check/time-of-use
//! window (an admin's organization changing between two lookups).

use tracing::{debug, warn};

use incentive_core::directory::IdentityDirectory;
use incentive_core::types::{Identity, UserId};

/// The identity making a request, as seen by the decision engine
#[derive(Debug, Clone, PartialEq)]
pub enum Requestor {
    /// No identity supplied (legacy/open callers)
    Anonymous,

    /// An id was supplied but the directory has no such identity
    Unknown(UserId),

    /// A resolved identity snapshot
    Known(Identity),
}

impl Requestor {
    /// The resolved identity, if any
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Requestor::Known(identity) => Some(identity),
            _ => None,
        }
    }

    /// The supplied id, if any
    pub fn id(&self) -> Option<UserId> {
        match self {
            Requestor::Anonymous => None,
            Requestor::Unknown(id) => Some(*id),
            Requestor::Known(identity) => Some(identity.id),
        }
    }

    /// Whether this requestor is the given identity
    pub fn is(&self, user: UserId) -> bool {
        self.id() == Some(user)
    }
}

/// Resolve a requestor snapshot from the directory.
///
/// A directory failure degrades to `Unknown` (which downstream denies)
/// rather than propagating: decision paths never throw across the
/// boundary.
pub async fn resolve_requestor(
    directory: &dyn IdentityDirectory,
    id: Option<UserId>,
) -> Requestor {
    let Some(id) = id else {
        return Requestor::Anonymous;
    };

    match directory.find(id).await {
        Ok(Some(identity)) => {
            debug!(requestor = id, org = ?identity.organization, "resolved requestor");
            Requestor::Known(identity)
        }
        Ok(None) => {
            debug!(requestor = id, "requestor not found in directory");
            Requestor::Unknown(id)
        }
        Err(e) => {
            warn!(requestor = id, error = %e, "directory lookup failed, treating requestor as unknown");
            Requestor::Unknown(id)
        }
    }
}
