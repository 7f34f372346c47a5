//! # Incentive Core
//!
//! Shared domain types, ownership model, and store traits for the
//! sales-incentive back office. This package breaks circular
//! dependencies between the authorization and aggregation packages:
//! everything here is plain data plus pluggable persistence seams.

pub mod directory;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use directory::{IdentityDirectory, InMemoryDirectory};
pub use error::{CoreError, Result};
pub use types::{AdminScope, Identity, Owned, Ownership, Role, UserId};

/// Organization name used as the tenant key throughout the system.
pub type OrgName = String;
