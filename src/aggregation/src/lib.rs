//! # Incentive Aggregation
//!
//! Requestor-scoped aggregation routines for the incentive back
//! office: payout listings and summaries, leaderboards, performance
//! attainment, alerting-rule bootstrap, notifications, user
//! administration, and policy document views.
//!
//! Every routine follows the same shape: the caller resolves a
//! [`incentive_authz::Requestor`] once, the routine runs the decision
//! engine, pushes the resulting organization filter down to the store
//! where possible, re-applies it through the scoped query filter, and
//! only then aggregates. Mutations additionally emit audit records.

pub mod directory;
pub mod error;
pub mod leaderboard;
pub mod notify;
pub mod payout;
pub mod performance;
pub mod policy;
pub mod rules;

pub use directory::{DirectoryService, IdentityUpdate};
pub use error::{AggregationError, Result};
pub use leaderboard::{LeaderboardEntry, LeaderboardService, Period};
pub use notify::{ComposerConfig, NotificationService};
pub use payout::{PayoutService, PayoutSummary};
pub use performance::{PerformanceService, PerformanceSummary};
pub use policy::PolicyDocService;
pub use rules::RuleService;
