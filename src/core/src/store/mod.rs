//! Resource Store seams
//!
//! One store trait per resource kind, mirroring the one-repository-
//! per-entity layout of the persistence layer this core plugs into.
//! Each trait ships with an in-memory implementation used by tests
//! and single-node deployments; iteration is id-ordered so listings
//! are deterministic.

mod deal;
mod notification;
mod policy;
mod rule;
mod target;

pub use deal::{DealStore, InMemoryDealStore};
pub use notification::{InMemoryNotificationStore, NotificationStore};
pub use policy::{InMemoryPolicyDocStore, PolicyDocFilter, PolicyDocStore};
pub use rule::{InMemoryRuleStore, RuleStore};
pub use target::{InMemoryTargetStore, TargetStore};
