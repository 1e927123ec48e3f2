use axum::extract::{Query, State};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use super::envelope::ApiResponse;
use super::{AppState, AuthUser};
use crate::domain::{Overview, RevenueBucket, RevenuePeriod, RevenueSummary};
use crate::services::statistics;
use crate::{Result, ShopError};

/// Raw revenue parameters. Missing values default to the current UTC date.
#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    pub date: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
}

fn parse<T: std::str::FromStr>(raw: Option<&str>, name: &str) -> Result<Option<T>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse().map(Some).map_err(|_| ShopError::Validation(format!("{name} is invalid"))),
        None => Ok(None),
    }
}

impl RevenueQuery {
    fn date(&self) -> Result<NaiveDate> {
        match self.date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ShopError::Validation("date must be formatted as YYYY-MM-DD".into())),
            None => Ok(Utc::now().date_naive()),
        }
    }

    fn year(&self) -> Result<i32> {
        Ok(parse(self.year.as_deref(), "year")?.unwrap_or_else(|| Utc::now().year()))
    }

    fn month(&self) -> Result<RevenuePeriod> {
        let month = parse(self.month.as_deref(), "month")?.unwrap_or_else(|| Utc::now().month());
        RevenuePeriod::month_of(self.year()?, month).ok_or_else(|| ShopError::Validation("month is invalid".into()))
    }
}

pub async fn overview(State(s): State<AppState>, AuthUser(actor): AuthUser) -> Result<ApiResponse<Overview>> {
    Ok(ApiResponse::ok(statistics::overview(s.store.as_ref(), actor).await?))
}

pub async fn daily(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<RevenueQuery>) -> Result<ApiResponse<Vec<RevenueBucket>>> {
    let period = RevenuePeriod::Day(q.date()?);
    Ok(ApiResponse::ok(statistics::revenue(s.store.as_ref(), actor, period).await?))
}

pub async fn weekly(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<RevenueQuery>) -> Result<ApiResponse<Vec<RevenueBucket>>> {
    let period = RevenuePeriod::Week(q.date()?);
    Ok(ApiResponse::ok(statistics::revenue(s.store.as_ref(), actor, period).await?))
}

pub async fn monthly(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<RevenueQuery>) -> Result<ApiResponse<Vec<RevenueBucket>>> {
    let period = q.month()?;
    Ok(ApiResponse::ok(statistics::revenue(s.store.as_ref(), actor, period).await?))
}

pub async fn yearly(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<RevenueQuery>) -> Result<ApiResponse<Vec<RevenueBucket>>> {
    let period = RevenuePeriod::year_of(q.year()?).ok_or_else(|| ShopError::Validation("year is invalid".into()))?;
    Ok(ApiResponse::ok(statistics::revenue(s.store.as_ref(), actor, period).await?))
}

pub async fn all(State(s): State<AppState>, AuthUser(actor): AuthUser) -> Result<ApiResponse<RevenueSummary>> {
    let today = Utc::now().date_naive();
    Ok(ApiResponse::ok(statistics::revenue_summary(s.store.as_ref(), actor, today).await?))
}
