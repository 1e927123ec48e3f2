//! Offset/limit pagination
//!
//! A listing runs two queries, a count and a bounded fetch. [`fetch_page`]
//! hands both the same filter value so the total can never disagree with the
//! rows it describes.

use async_trait::async_trait;
use serde::Serialize;

use crate::store::RepositoryError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self { Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT } }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self { Self { page, limit } }

    /// Lenient coercion of raw query values: anything unparsable or zero
    /// falls back to the default. Negative pages are kept as given; a
    /// non-positive limit is replaced by the default and a large one is
    /// capped at [`MAX_LIMIT`].
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok()).filter(|v| *v != 0);
        Self {
            page: parse(page).unwrap_or(DEFAULT_PAGE),
            limit: parse(limit).filter(|v| *v > 0).map_or(DEFAULT_LIMIT, |v| v.min(MAX_LIMIT)),
        }
    }

    /// Rows to skip. Pages below 1 read from the start; the product saturates
    /// instead of wrapping for absurd page numbers.
    pub fn offset(&self) -> i64 { self.page.saturating_sub(1).saturating_mul(self.limit).max(0) }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, req: PageRequest) -> Self {
        let total_pages = match req.limit {
            l if l > 0 => total_count / l + i64::from(total_count % l != 0),
            _ => 0,
        };
        Self {
            items,
            total_count,
            current_page: req.page,
            total_pages,
            has_next: req.page < total_pages,
            has_prev: req.page > 1,
        }
    }

    pub fn count(&self) -> usize { self.items.len() }

    /// Swaps the rows while keeping the page metadata.
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            total_count: self.total_count,
            current_page: self.current_page,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// A filtered collection that can be counted and fetched in slices.
#[async_trait]
pub trait Paged: Send {
    type Filter: Sync;
    type Item: Send;

    async fn count(&mut self, filter: &Self::Filter) -> Result<i64, RepositoryError>;
    async fn fetch(&mut self, filter: &Self::Filter, offset: i64, limit: i64) -> Result<Vec<Self::Item>, RepositoryError>;
}

pub async fn fetch_page<Q: Paged + ?Sized>(query: &mut Q, filter: &Q::Filter, req: PageRequest) -> Result<Page<Q::Item>, RepositoryError> {
    let total = query.count(filter).await?;
    let items = query.fetch(filter, req.offset(), req.limit).await?;
    Ok(Page::new(items, total, req))
}
