//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::{Comic, ComicEdition, ShippingAddress, UserSummary};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub edition_id: Uuid,
    pub quantity: i32,
    pub total: Decimal,
    pub address_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub discount_id: Option<Uuid>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipping,
    Success,
    BackPending,
    Back,
}

/// What a status change does to inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockEffect {
    None,
    Restore,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Shipping, Self::Success, Self::BackPending, Self::Back];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Shipping => "SHIPPING",
            Self::Success => "SUCCESS",
            Self::BackPending => "BACK_PENDING",
            Self::Back => "BACK",
        }
    }

    /// Stock effect of moving from `self` to `to`.
    ///
    /// Every pair is an accepted transition, including same-state and
    /// backwards moves. Only a completed return of goods that left the
    /// warehouse (`SHIPPING`/`SUCCESS` to `BACK`) gives stock back.
    pub fn transition(self, to: OrderStatus) -> StockEffect {
        use OrderStatus::*;
        match (self, to) {
            (Shipping | Success, Back) => StockEffect::Restore,
            (Pending | BackPending | Back, Back) => StockEffect::None,
            (_, Pending | Shipping | Success | BackPending) => StockEffect::None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown order status: {}", self.0) }
}

/// Discount code; only its usage counter is touched by checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: Uuid,
    pub code: String,
    pub usage_count: i32,
}

/// Checkout input.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[validate(required(message = "editionId is required"))]
    pub edition_id: Option<Uuid>,
    #[validate(required(message = "quantity is required"), range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
    pub address_id: Option<Uuid>,
    pub discount_id: Option<Uuid>,
    pub payment_method: Option<String>,
}

/// Row to insert; id and timestamp are assigned by the store.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub edition_id: Uuid,
    pub quantity: i32,
    pub total: Decimal,
    pub address_id: Option<Uuid>,
    pub payment_method: Option<String>,
    pub discount_id: Option<Uuid>,
}

/// Shared predicate for order counts and listings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.map_or(true, |u| order.user_id == u) && self.status.map_or(true, |s| order.status == s)
    }
}

/// Order with its relations expanded for API responses.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<UserSummary>,
    pub edition: Option<ComicEdition>,
    pub comic: Option<Comic>,
    pub address: Option<ShippingAddress>,
    pub discount: Option<DiscountCode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_names() {
        for st in OrderStatus::ALL {
            assert_eq!(st.as_str().parse::<OrderStatus>().unwrap(), st);
        }
        assert!("DELIVERED".parse::<OrderStatus>().is_err());
        assert!("pending".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&OrderStatus::BackPending).unwrap(), "\"BACK_PENDING\"");
    }

    #[test]
    fn test_only_shipped_returns_restore_stock() {
        use OrderStatus::*;
        assert_eq!(Success.transition(Back), StockEffect::Restore);
        assert_eq!(Shipping.transition(Back), StockEffect::Restore);
        assert_eq!(Pending.transition(Back), StockEffect::None);
        assert_eq!(BackPending.transition(Back), StockEffect::None);
        assert_eq!(Back.transition(Back), StockEffect::None);
        assert_eq!(Success.transition(Pending), StockEffect::None);
        assert_eq!(Back.transition(Success), StockEffect::None);
    }

    #[test]
    fn test_place_order_requires_fields() {
        assert!(PlaceOrder::default().validate().is_err());
        let ok = PlaceOrder { edition_id: Some(Uuid::now_v7()), quantity: Some(1), ..Default::default() };
        assert!(ok.validate().is_ok());
        let zero = PlaceOrder { quantity: Some(0), ..ok };
        assert!(zero.validate().is_err());
    }
}
