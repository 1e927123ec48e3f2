//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::ComicEdition;

/// One row per (user, edition); repeated adds merge quantities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub edition_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub edition: Option<ComicEdition>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.edition.as_ref().map_or(Decimal::ZERO, |e| e.total_for(self.item.quantity))
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub count: usize,
    pub total_amount: Decimal,
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn new(items: Vec<CartLine>) -> Self {
        let total_amount = items.iter().map(CartLine::line_total).sum();
        Self { count: items.len(), total_amount, items }
    }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    #[validate(required(message = "editionId is required"))]
    pub edition_id: Option<Uuid>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct SetQuantity {
    #[validate(required(message = "quantity is required"), range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_total() {
        let user = Uuid::now_v7();
        let edition = ComicEdition {
            id: Uuid::now_v7(), comic_id: Uuid::now_v7(), name: "Vol. 1".into(), image: None,
            price: Decimal::new(10, 0), page_count: 120, stock_available: 9, stock_sold: 0,
        };
        let line = |qty| CartLine {
            item: CartItem { id: Uuid::now_v7(), user_id: user, edition_id: edition.id, quantity: qty, created_at: Utc::now() },
            edition: Some(edition.clone()),
        };
        let cart = Cart::new(vec![line(2), line(1)]);
        assert_eq!(cart.count, 2);
        assert_eq!(cart.total_amount, Decimal::new(30, 0));
        assert!(Cart::new(vec![]).is_empty());
    }
}
