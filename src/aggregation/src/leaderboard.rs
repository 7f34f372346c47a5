//! Incentive leaderboard

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use incentive_authz::{decide, filter_visible, AnonymousPolicy, Requestor};
use incentive_core::store::DealStore;
use incentive_core::types::UserId;

use crate::error::Result;

/// Reporting window, evaluated against an explicit `as_of` instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    #[default]
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
    AllTime,
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

impl Period {
    /// Half-open `[start, end)` bounds of the window, or `None` for
    /// the unbounded window
    pub fn bounds(&self, as_of: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (year, month) = (as_of.year(), as_of.month());
        match self {
            Period::ThisMonth => {
                let (ny, nm) = next_month(year, month);
                Some((month_start(year, month), month_start(ny, nm)))
            }
            Period::LastMonth => {
                let (py, pm) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
                Some((month_start(py, pm), month_start(year, month)))
            }
            Period::ThisQuarter => {
                let quarter_month = ((month - 1) / 3) * 3 + 1;
                let (ny, nm) = if quarter_month == 10 {
                    (year + 1, 1)
                } else {
                    (year, quarter_month + 3)
                };
                Some((month_start(year, quarter_month), month_start(ny, nm)))
            }
            Period::ThisYear => Some((month_start(year, 1), month_start(year + 1, 1))),
            Period::AllTime => None,
        }
    }

    fn contains(&self, as_of: DateTime<Utc>, instant: DateTime<Utc>) -> bool {
        match self.bounds(as_of) {
            Some((start, end)) => start <= instant && instant < end,
            None => true,
        }
    }
}

/// One ranked leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Ranked identity
    pub user: UserId,

    /// 1-based position
    pub rank: u32,

    /// Approved incentive closed inside the window
    pub total_incentive: Decimal,

    /// Approved deals closed inside the window
    pub deal_count: usize,
}

/// Leaderboard over the requestor's visible slice of deals
pub struct LeaderboardService {
    deals: Arc<dyn DealStore>,
}

impl LeaderboardService {
    pub fn new(deals: Arc<dyn DealStore>) -> Self {
        Self { deals }
    }

    /// Rank identities by approved incentive closed in the window.
    ///
    /// Ordering is total descending with ties broken by ascending user
    /// id, so two runs over the same data produce identical output.
    pub async fn leaderboard(
        &self,
        requestor: &Requestor,
        period: Period,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let decision = decide(requestor, None, AnonymousPolicy::AllowUnfiltered);
        let fetched = self.deals.list(decision.org_filter()).await?;
        let visible = filter_visible(&decision, fetched);

        let mut totals: BTreeMap<UserId, (Decimal, usize)> = BTreeMap::new();
        for deal in visible {
            if !deal.is_approved() || !period.contains(as_of, deal.closed_at) {
                continue;
            }
            let entry = totals.entry(deal.owner).or_default();
            entry.0 += deal.incentive;
            entry.1 += 1;
        }

        let mut rows: Vec<LeaderboardEntry> = totals
            .into_iter()
            .map(|(user, (total_incentive, deal_count))| LeaderboardEntry {
                user,
                rank: 0,
                total_incentive,
                deal_count,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_incentive
                .cmp(&a.total_incentive)
                .then(a.user.cmp(&b.user))
        });
        for (i, row) in rows.iter_mut().enumerate() {
            row.rank = i as u32 + 1;
        }
        Ok(rows)
    }
}
