//! Comic and ComicEdition
//!
//! An edition is the purchasable SKU of a comic and the only stock-bearing
//! entity. Stock moves only through the inventory ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comic {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub category_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicEdition {
    pub id: Uuid,
    pub comic_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub page_count: i32,
    pub stock_available: i32,
    pub stock_sold: i32,
}

impl ComicEdition {
    pub fn can_fulfil(&self, qty: i32) -> bool { self.stock_available >= qty }

    /// Price snapshot for `qty` units.
    pub fn total_for(&self, qty: i32) -> Decimal { self.price * Decimal::from(qty) }

    pub fn stock(&self) -> StockLevel {
        StockLevel { available: self.stock_available, sold: self.stock_sold }
    }
}

/// Stock counters of one edition after a ledger movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub available: i32,
    pub sold: i32,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEdition {
    #[validate(required)]
    pub comic_id: Option<Uuid>,
    #[validate(required, length(min = 1, message = "name is required"))]
    pub name: Option<String>,
    pub image: Option<String>,
    #[validate(required)]
    pub price: Option<Decimal>,
    #[validate(required, range(min = 1))]
    pub page_count: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_available: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_sold: Option<i32>,
}

/// Partial update; absent fields keep their current value.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditionPatch {
    pub comic_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 1))]
    pub page_count: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_available: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_sold: Option<i32>,
}

impl EditionPatch {
    pub fn apply(self, edition: &mut ComicEdition) {
        if let Some(v) = self.comic_id { edition.comic_id = v; }
        if let Some(v) = self.name { edition.name = v; }
        if let Some(v) = self.image { edition.image = Some(v); }
        if let Some(v) = self.price { edition.price = v; }
        if let Some(v) = self.page_count { edition.page_count = v; }
        if let Some(v) = self.stock_available { edition.stock_available = v; }
        if let Some(v) = self.stock_sold { edition.stock_sold = v; }
    }
}
