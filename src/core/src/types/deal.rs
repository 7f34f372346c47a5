//! Sales deals and their payout lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identity::UserId;
use super::ownership::{Owned, Ownership};

/// Approval state of a deal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealStatus {
    Pending,
    Approved,
    Rejected,
}

/// Disbursement state of an approved deal's incentive.
///
/// A deal with no payout status recorded reads as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutStatus {
    Pending,
    Paid,
}

/// A sales deal assigned to one identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Deal identifier
    pub id: i64,

    /// Identity the deal is assigned to
    pub owner: UserId,

    /// Owning organization, denormalized from the owner at creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Client the deal was closed with
    pub client: String,

    /// Gross deal amount
    pub amount: Decimal,

    /// Incentive earned by the owner
    pub incentive: Decimal,

    /// Discount granted, in percent
    #[serde(default)]
    pub discount_rate: Decimal,

    /// Approval state
    pub status: DealStatus,

    /// Disbursement state, absent until first touched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_status: Option<PayoutStatus>,

    /// Date the incentive was disbursed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_date: Option<NaiveDate>,

    /// When the deal closed
    pub closed_at: DateTime<Utc>,
}

impl Deal {
    /// Create a pending deal
    pub fn new(
        id: i64,
        owner: UserId,
        client: impl Into<String>,
        amount: Decimal,
        incentive: Decimal,
        closed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            organization: None,
            client: client.into(),
            amount,
            incentive,
            discount_rate: Decimal::ZERO,
            status: DealStatus::Pending,
            payout_status: None,
            payout_date: None,
            closed_at,
        }
    }

    /// Set the owning organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Set the approval state
    pub fn with_status(mut self, status: DealStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the disbursement state
    pub fn with_payout_status(mut self, payout_status: PayoutStatus) -> Self {
        self.payout_status = Some(payout_status);
        self
    }

    /// Whether the deal has reached the payable state
    pub fn is_approved(&self) -> bool {
        self.status == DealStatus::Approved
    }

    /// Disbursement state, with absent reading as `Pending`
    pub fn effective_payout_status(&self) -> PayoutStatus {
        self.payout_status.unwrap_or(PayoutStatus::Pending)
    }
}

impl Owned for Deal {
    fn ownership(&self) -> Ownership {
        Ownership {
            organization: self.organization.clone(),
            owner: Some(self.owner),
        }
    }
}
