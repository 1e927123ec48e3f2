//! Order workflow
//!
//! Checkout debits stock, consumes the matching cart row and bumps the
//! discount counter in the same transaction that inserts the order. Status
//! changes are otherwise free-form; the one with a side effect is a return
//! of shipped goods, which credits the ordered quantity back.

use async_trait::async_trait;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::inventory;
use crate::domain::{Actor, NewOrder, Order, OrderDetails, OrderFilter, OrderStatus, PlaceOrder, StockEffect};
use crate::pagination::{fetch_page, Page, PageRequest, Paged};
use crate::store::{RepositoryError, Store, Tx};
use crate::{Result, ShopError};

/// Order listing over an open transaction.
pub struct OrderQuery<'a> {
    tx: &'a mut dyn Tx,
}

#[async_trait]
impl<'a> Paged for OrderQuery<'a> {
    type Filter = OrderFilter;
    type Item = Order;

    async fn count(&mut self, filter: &OrderFilter) -> std::result::Result<i64, RepositoryError> {
        self.tx.count_orders(filter).await
    }

    async fn fetch(&mut self, filter: &OrderFilter, offset: i64, limit: i64) -> std::result::Result<Vec<Order>, RepositoryError> {
        self.tx.list_orders(filter, offset, limit).await
    }
}

/// Loads the relations an order response embeds.
pub(crate) async fn expand(tx: &mut dyn Tx, order: Order) -> std::result::Result<OrderDetails, RepositoryError> {
    let user = tx.find_user(order.user_id).await?.map(|u| u.summary());
    let edition = tx.find_edition(order.edition_id).await?;
    let comic = match &edition {
        Some(e) => tx.find_comic(e.comic_id).await?,
        None => None,
    };
    let address = match order.address_id {
        Some(id) => tx.find_address(id).await?,
        None => None,
    };
    let discount = match order.discount_id {
        Some(id) => tx.find_discount(id).await?,
        None => None,
    };
    Ok(OrderDetails { order, user, edition, comic, address, discount })
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.parse().map_err(|_| ShopError::InvalidStatus(raw.to_string()))
}

#[instrument(skip(store, input), fields(user = %actor.id))]
pub async fn create_order(store: &dyn Store, actor: Actor, input: PlaceOrder) -> Result<OrderDetails> {
    input.validate()?;
    let (Some(edition_id), Some(quantity)) = (input.edition_id, input.quantity) else {
        return Err(ShopError::Validation("editionId and quantity are required".into()));
    };

    let mut tx = store.begin().await?;
    let edition = tx.find_edition(edition_id).await?.ok_or(ShopError::NotFound("Edition"))?;
    if !edition.can_fulfil(quantity) {
        warn!(%edition_id, quantity, available = edition.stock_available, "order exceeds stock");
        return Err(ShopError::InsufficientStock { available: edition.stock_available });
    }
    if let Some(address_id) = input.address_id {
        let address = tx.find_address(address_id).await?.ok_or(ShopError::NotFound("Shipping address"))?;
        if !actor.may_act_for(address.user_id) {
            return Err(ShopError::Forbidden("Shipping address belongs to another user"));
        }
    }

    let total = edition.total_for(quantity);
    let order = tx
        .insert_order(&NewOrder {
            user_id: actor.id,
            edition_id,
            quantity,
            total,
            address_id: input.address_id,
            payment_method: input.payment_method,
            discount_id: input.discount_id,
        })
        .await?;
    if let Some(discount_id) = input.discount_id {
        if !tx.increment_discount_usage(discount_id).await? {
            return Err(ShopError::NotFound("Discount code"));
        }
    }
    inventory::debit(&mut *tx, edition_id, quantity).await?;
    tx.delete_cart_item_for(actor.id, edition_id).await?;

    let details = expand(&mut *tx, order).await?;
    tx.commit().await?;
    info!(order_id = %details.order.id, %edition_id, quantity, %total, "order created");
    Ok(details)
}

#[instrument(skip(store), fields(user = %actor.id))]
pub async fn update_order_status(store: &dyn Store, actor: Actor, order_id: Uuid, status: Option<&str>) -> Result<OrderDetails> {
    let status = parse_status(status.unwrap_or_default())?;

    let mut tx = store.begin().await?;
    let existing = tx.find_order(order_id).await?.ok_or(ShopError::NotFound("Order"))?;
    if !actor.may_act_for(existing.user_id) {
        return Err(ShopError::Forbidden("Not allowed to update this order"));
    }

    let effect = existing.status.transition(status);
    let order = tx.set_order_status(order_id, status).await?.ok_or(ShopError::NotFound("Order"))?;
    if effect == StockEffect::Restore {
        inventory::credit(&mut *tx, existing.edition_id, existing.quantity).await?;
    }

    let details = expand(&mut *tx, order).await?;
    tx.commit().await?;
    info!(%order_id, from = %existing.status, to = %status, restocked = effect == StockEffect::Restore, "order status changed");
    Ok(details)
}

/// Orders visible to `actor`, newest first. Admins see every order.
#[instrument(skip(store), fields(user = %actor.id))]
pub async fn list_orders(store: &dyn Store, actor: Actor, status: Option<&str>, req: PageRequest) -> Result<Page<OrderDetails>> {
    let status = match status.filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_status(raw)?),
        None => None,
    };
    let filter = OrderFilter { user_id: (!actor.is_admin()).then_some(actor.id), status };

    let mut tx = store.begin().await?;
    let page = fetch_page(&mut OrderQuery { tx: &mut *tx }, &filter, req).await?;
    let mut items = Vec::with_capacity(page.count());
    for order in page.items.iter().cloned() {
        items.push(expand(&mut *tx, order).await?);
    }
    tx.commit().await?;
    Ok(page.with_items(items))
}
