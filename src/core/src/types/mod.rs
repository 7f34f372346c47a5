//! Domain types for the incentive back office

mod deal;
mod identity;
mod notification;
mod ownership;
mod policy;
mod rule;
mod target;

pub use deal::{Deal, DealStatus, PayoutStatus};
pub use identity::{AccountStatus, AdminScope, Identity, Role, UserId};
pub use notification::{Notification, DEFAULT_NOTIFICATION_KIND};
pub use ownership::{Owned, Ownership};
pub use policy::PolicyDoc;
pub use rule::{RuleAction, RuleConfig, RuleMetric, RuleOperator};
pub use target::{SalesTarget, DEFAULT_MONTHLY_TARGET};
