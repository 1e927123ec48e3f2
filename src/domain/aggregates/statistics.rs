//! Dashboard statistics
//!
//! Revenue only counts `SUCCESS` orders, summed by the order's creation time
//! in UTC. Every period yields a fixed set of buckets, empty ones included.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTH_LABELS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Row counts of the catalog and account tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub categories: i64,
    pub comics: i64,
    pub users: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_categories: i64,
    pub total_comics: i64,
    pub total_users: i64,
    pub pending_orders: i64,
    pub shipping_orders: i64,
    pub success_orders: i64,
    pub back_pending_orders: i64,
    pub returned_orders: i64,
}

/// Revenue contributed by one completed order.
#[derive(Clone, Debug, PartialEq)]
pub struct Sale {
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RevenueBucket {
    pub label: String,
    pub value: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RevenueSummary {
    pub daily: Vec<RevenueBucket>,
    pub weekly: Vec<RevenueBucket>,
    pub monthly: Vec<RevenueBucket>,
    pub yearly: Vec<RevenueBucket>,
}

/// A reporting window, anchored on any date inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevenuePeriod {
    /// Hourly buckets for the day.
    Day(NaiveDate),
    /// Daily buckets, Monday to Sunday.
    Week(NaiveDate),
    /// One bucket per calendar day of the month.
    Month(NaiveDate),
    /// One bucket per month.
    Year(NaiveDate),
}

impl RevenuePeriod {
    pub fn month_of(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::Month)
    }

    pub fn year_of(year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, 1, 1).map(Self::Year)
    }

    fn first_day(&self) -> Option<NaiveDate> {
        match *self {
            Self::Day(d) => Some(d),
            Self::Week(d) => d.checked_sub_days(Days::new(u64::from(d.weekday().num_days_from_monday()))),
            Self::Month(d) => d.with_day(1),
            Self::Year(d) => d.with_ordinal(1),
        }
    }

    /// Half-open `[from, until)` bounds in UTC. `None` at the edges of the
    /// representable calendar.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.first_day()?;
        let next = match self {
            Self::Day(_) => first.succ_opt(),
            Self::Week(_) => first.checked_add_days(Days::new(7)),
            Self::Month(_) => first.checked_add_months(Months::new(1)),
            Self::Year(_) => first.checked_add_months(Months::new(12)),
        }?;
        let midnight = |d: NaiveDate| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN));
        Some((midnight(first), midnight(next)))
    }

    fn labels(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<String> {
        match self {
            Self::Day(_) => (0..24).map(|h| format!("{h}:00")).collect(),
            Self::Week(_) => WEEKDAY_LABELS.iter().map(|d| d.to_string()).collect(),
            Self::Month(_) => (1..=(until - from).num_days()).map(|d| d.to_string()).collect(),
            Self::Year(_) => MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn slot(&self, from: DateTime<Utc>, at: DateTime<Utc>) -> usize {
        let slot = match self {
            Self::Day(_) => at.hour(),
            Self::Week(_) => u32::try_from((at - from).num_days()).unwrap_or(u32::MAX),
            Self::Month(_) => at.day0(),
            Self::Year(_) => at.month0(),
        };
        slot as usize
    }

    /// Sums `sales` into this period's buckets, skipping sales outside it.
    pub fn bucket(&self, sales: &[Sale]) -> Vec<RevenueBucket> {
        let Some((from, until)) = self.window() else { return Vec::new() };
        let mut buckets: Vec<RevenueBucket> =
            self.labels(from, until).into_iter().map(|label| RevenueBucket { label, value: Decimal::ZERO }).collect();
        for sale in sales.iter().filter(|s| s.created_at >= from && s.created_at < until) {
            if let Some(bucket) = buckets.get_mut(self.slot(from, sale.created_at)) {
                bucket.value += sale.total;
            }
        }
        buckets
    }
}
