//! # Incentive AuthZ
//!
//! Organization-scoped authorization for the incentive back office.
//!
//! The crate collapses the permission checks that were historically
//! duplicated across every endpoint into one decision procedure:
//!
//! ```text
//! request → resolve requestor once → decide() → filter_visible()
//!              ↓                                      ↓
//!       [Identity Directory]                 scoped resource set
//! ```
//!
//! Decisions are pure functions over identity snapshots; nothing in
//! this crate re-queries the directory mid-decision, and nothing here
//! throws across the read path — denied reads resolve to empty sets.

pub mod audit;
pub mod decision;
pub mod error;
pub mod filter;
pub mod requestor;

pub use audit::{
    record_or_warn, AuditQuery, AuditRecord, AuditSearch, AuditSink, AuditTrail,
    InMemoryAuditLog, SYSTEM_ACTOR,
};
pub use decision::{decide, AccessDecision, AnonymousPolicy, ScopeFilter};
pub use error::{AuthzError, Result};
pub use filter::filter_visible;
pub use requestor::{resolve_requestor, Requestor};
