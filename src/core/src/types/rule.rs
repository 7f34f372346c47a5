//! Per-organization alerting rules

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ownership::{Owned, Ownership};

/// Metric a rule watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleMetric {
    DealAmount,
    DiscountRate,
}

/// Comparison applied to the metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleOperator {
    #[serde(rename = "GT")]
    GreaterThan,
    #[serde(rename = "LT")]
    LessThan,
}

/// Action taken when a rule trips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    NotifyAdmin,
    FlagRisk,
}

/// A configured rule, owned by one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Rule identifier
    pub id: i64,

    /// Human-readable rule name
    pub name: String,

    /// Metric watched
    pub metric: RuleMetric,

    /// Comparison operator
    pub operator: RuleOperator,

    /// Threshold the metric is compared against
    pub threshold: Decimal,

    /// Action on trip
    pub action: RuleAction,

    /// Owning organization
    pub organization: String,
}

impl RuleConfig {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        metric: RuleMetric,
        operator: RuleOperator,
        threshold: Decimal,
        action: RuleAction,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            metric,
            operator,
            threshold,
            action,
            organization: organization.into(),
        }
    }
}

impl Owned for RuleConfig {
    fn ownership(&self) -> Ownership {
        Ownership::of_org(self.organization.clone())
    }
}
