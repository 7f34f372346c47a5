//! Payout listing, summary, and disbursement

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use incentive_authz::{
    decide, filter_visible, record_or_warn, AnonymousPolicy, AuditRecord, AuditSink, Requestor,
};
use incentive_core::store::DealStore;
use incentive_core::types::{Deal, Owned, PayoutStatus};

use crate::error::{AggregationError, Result};

/// Derived payout totals; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayoutSummary {
    /// Sum of incentives awaiting disbursement
    pub total_pending: Decimal,

    /// Sum of incentives already disbursed
    pub total_paid: Decimal,

    /// Number of pending payouts
    pub pending_count: usize,

    /// Number of disbursed payouts
    pub paid_count: usize,
}

/// Payout routines over the requestor's visible slice of deals
pub struct PayoutService {
    deals: Arc<dyn DealStore>,
    audit: Arc<dyn AuditSink>,
}

impl PayoutService {
    pub fn new(deals: Arc<dyn DealStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { deals, audit }
    }

    /// Approved deals visible to the requestor.
    ///
    /// Only approved deals participate in payouts; pending and
    /// rejected deals never reach this layer's output.
    async fn visible_payables(&self, requestor: &Requestor) -> Result<Vec<Deal>> {
        let decision = decide(requestor, None, AnonymousPolicy::AllowUnfiltered);
        let fetched = self.deals.list(decision.org_filter()).await?;
        Ok(filter_visible(&decision, fetched)
            .into_iter()
            .filter(Deal::is_approved)
            .collect())
    }

    /// List payouts, optionally narrowed to one disbursement state.
    ///
    /// A deal with no payout status recorded matches `Pending`.
    pub async fn list_payouts(
        &self,
        requestor: &Requestor,
        status: Option<PayoutStatus>,
    ) -> Result<Vec<Deal>> {
        let payables = self.visible_payables(requestor).await?;
        Ok(match status {
            Some(wanted) => payables
                .into_iter()
                .filter(|d| d.effective_payout_status() == wanted)
                .collect(),
            None => payables,
        })
    }

    /// Totals and counts per disbursement bucket
    pub async fn payout_summary(&self, requestor: &Requestor) -> Result<PayoutSummary> {
        let payables = self.visible_payables(requestor).await?;

        let mut summary = PayoutSummary::default();
        for deal in &payables {
            match deal.effective_payout_status() {
                PayoutStatus::Pending => {
                    summary.total_pending += deal.incentive;
                    summary.pending_count += 1;
                }
                PayoutStatus::Paid => {
                    summary.total_paid += deal.incentive;
                    summary.paid_count += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Disburse the given deals, stamping the payout date.
    ///
    /// All targeted deals must exist, be approved, and fall inside the
    /// requestor's scope; a single miss rejects the whole batch.
    pub async fn mark_paid(
        &self,
        requestor: &Requestor,
        deal_ids: &[i64],
        paid_on: NaiveDate,
    ) -> Result<Vec<Deal>> {
        let mut deals = self.deals.get_many(deal_ids).await?;
        if deals.len() != deal_ids.len() {
            return Err(AggregationError::NotFound(format!(
                "{} of {} deals missing",
                deal_ids.len() - deals.len(),
                deal_ids.len()
            )));
        }

        for deal in &deals {
            if !deal.is_approved() {
                return Err(AggregationError::InvalidInput(format!(
                    "deal {} is not approved",
                    deal.id
                )));
            }
            let decision = decide(
                requestor,
                Some(&deal.ownership()),
                AnonymousPolicy::AllowUnfiltered,
            );
            if !decision.allowed {
                return Err(AggregationError::Forbidden(format!(
                    "deal {} is outside the requestor's scope",
                    deal.id
                )));
            }
        }

        for deal in &mut deals {
            deal.payout_status = Some(PayoutStatus::Paid);
            deal.payout_date = Some(paid_on);
        }
        let saved = self.deals.save_all(deals).await?;

        info!(count = saved.len(), %paid_on, "payouts disbursed");
        let record = AuditRecord::new("DEAL_MARKED_PAID", "DEAL")
            .by_requestor(requestor)
            .detail(format!("deals {:?} paid on {}", deal_ids, paid_on));
        record_or_warn(self.audit.as_ref(), record).await;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use incentive_authz::InMemoryAuditLog;
    use incentive_core::store::InMemoryDealStore;
    use incentive_core::types::{DealStatus, Identity, Role};
    use rust_decimal_macros::dec;

    async fn service_with_deals() -> (PayoutService, Arc<InMemoryDealStore>) {
        let deals = Arc::new(InMemoryDealStore::new());
        let now = Utc::now();

        // 100 paid, 200 paid, 300 pending; all approved, same org
        deals
            .save(
                Deal::new(0, 1, "Client A", dec!(2000), dec!(100), now)
                    .with_organization("Acme")
                    .with_status(DealStatus::Approved)
                    .with_payout_status(PayoutStatus::Paid),
            )
            .await
            .unwrap();
        deals
            .save(
                Deal::new(0, 2, "Client B", dec!(4000), dec!(200), now)
                    .with_organization("Acme")
                    .with_status(DealStatus::Approved)
                    .with_payout_status(PayoutStatus::Paid),
            )
            .await
            .unwrap();
        deals
            .save(
                Deal::new(0, 1, "Client C", dec!(6000), dec!(300), now)
                    .with_organization("Acme")
                    .with_status(DealStatus::Approved),
            )
            .await
            .unwrap();
        // Unapproved deal must never count
        deals
            .save(
                Deal::new(0, 1, "Client D", dec!(9000), dec!(450), now)
                    .with_organization("Acme"),
            )
            .await
            .unwrap();

        let service = PayoutService::new(deals.clone(), Arc::new(InMemoryAuditLog::new()));
        (service, deals)
    }

    fn acme_admin() -> Requestor {
        Requestor::Known(
            Identity::new(9, "Ana", "ana@acme.test", Role::Admin).with_organization("Acme"),
        )
    }

    #[tokio::test]
    async fn test_summary_buckets_incentives() {
        let (service, _) = service_with_deals().await;
        let summary = service.payout_summary(&acme_admin()).await.unwrap();

        assert_eq!(summary.total_pending, dec!(300));
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.total_paid, dec!(300));
        assert_eq!(summary.paid_count, 2);
    }

    #[tokio::test]
    async fn test_listing_treats_absent_status_as_pending() {
        let (service, _) = service_with_deals().await;
        let pending = service
            .list_payouts(&acme_admin(), Some(PayoutStatus::Pending))
            .await
            .unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].incentive, dec!(300));
    }

    #[tokio::test]
    async fn test_mark_paid_stamps_date() {
        let (service, deals) = service_with_deals().await;
        let paid_on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let saved = service.mark_paid(&acme_admin(), &[3], paid_on).await.unwrap();
        assert_eq!(saved[0].effective_payout_status(), PayoutStatus::Paid);
        assert_eq!(saved[0].payout_date, Some(paid_on));

        let stored = deals.get(3).await.unwrap().unwrap();
        assert_eq!(stored.payout_status, Some(PayoutStatus::Paid));
    }

    #[tokio::test]
    async fn test_mark_paid_rejects_cross_org_batch() {
        let (service, deals) = service_with_deals().await;
        let foreign = deals
            .save(
                Deal::new(0, 5, "Client X", dec!(1000), dec!(50), Utc::now())
                    .with_organization("Globex")
                    .with_status(DealStatus::Approved),
            )
            .await
            .unwrap();

        let result = service
            .mark_paid(
                &acme_admin(),
                &[3, foreign.id],
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            )
            .await;
        assert!(matches!(result, Err(AggregationError::Forbidden(_))));

        // The in-scope deal must not have been touched
        let untouched = deals.get(3).await.unwrap().unwrap();
        assert_eq!(untouched.payout_status, None);
    }

    #[tokio::test]
    async fn test_mark_paid_rejects_unapproved() {
        let (service, _) = service_with_deals().await;
        let result = service
            .mark_paid(
                &acme_admin(),
                &[4],
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            )
            .await;
        assert!(matches!(result, Err(AggregationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_anonymous_summary_is_unfiltered() {
        let (service, _) = service_with_deals().await;
        let summary = service.payout_summary(&Requestor::Anonymous).await.unwrap();
        assert_eq!(summary.pending_count + summary.paid_count, 3);
    }
}
