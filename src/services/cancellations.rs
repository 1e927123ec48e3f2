//! Cancellation requests
//!
//! Requests and their decisions are bookkeeping only. Accepting one does not
//! move the order; that stays a separate status change.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    Actor, CancellationDetails, CancellationFilter, CancellationRequest, CancellationUpdate, NewCancellation,
};
use super::orders;
use crate::pagination::{fetch_page, Page, PageRequest, Paged};
use crate::store::{RepositoryError, Store, Tx};
use crate::{Result, ShopError};

pub struct CancellationQuery<'a> {
    tx: &'a mut dyn Tx,
}

#[async_trait]
impl<'a> Paged for CancellationQuery<'a> {
    type Filter = CancellationFilter;
    type Item = CancellationRequest;

    async fn count(&mut self, filter: &CancellationFilter) -> std::result::Result<i64, RepositoryError> {
        self.tx.count_cancellations(filter).await
    }

    async fn fetch(
        &mut self,
        filter: &CancellationFilter,
        offset: i64,
        limit: i64,
    ) -> std::result::Result<Vec<CancellationRequest>, RepositoryError> {
        self.tx.list_cancellations(filter, offset, limit).await
    }
}

async fn attach_order(tx: &mut dyn Tx, request: CancellationRequest) -> std::result::Result<CancellationDetails, RepositoryError> {
    let user = tx.find_user(request.user_id).await?.map(|u| u.summary());
    let order = match tx.find_order(request.order_id).await? {
        Some(order) => Some(orders::expand(tx, order).await?),
        None => None,
    };
    Ok(CancellationDetails { request, user, order })
}

#[instrument(skip(store, input), fields(user = %actor.id))]
pub async fn create(store: &dyn Store, actor: Actor, input: NewCancellation) -> Result<CancellationDetails> {
    input.validate()?;
    let (Some(order_id), Some(reason)) = (input.order_id, input.reason) else {
        return Err(ShopError::Validation("orderId and reason are required".into()));
    };

    let mut tx = store.begin().await?;
    let order = tx.find_order(order_id).await?.ok_or(ShopError::NotFound("Order"))?;
    if !actor.may_act_for(order.user_id) {
        return Err(ShopError::Forbidden("Not allowed to cancel this order"));
    }
    let request = tx.insert_cancellation(order_id, actor.id, &reason).await?;
    let details = attach_order(&mut *tx, request).await?;
    tx.commit().await?;

    info!(request_id = %details.request.id, %order_id, "cancellation requested");
    Ok(details)
}

#[instrument(skip(store), fields(user = %actor.id))]
pub async fn delete(store: &dyn Store, actor: Actor, id: Uuid) -> Result<()> {
    let mut tx = store.begin().await?;
    let request = tx.find_cancellation(id).await?.ok_or(ShopError::NotFound("Cancellation request"))?;
    if !actor.may_act_for(request.user_id) {
        return Err(ShopError::Forbidden("Not allowed to delete this cancellation request"));
    }
    tx.delete_cancellation(id).await?;
    tx.commit().await?;
    info!(request_id = %id, "cancellation request deleted");
    Ok(())
}

/// Requests filed by `target` (the actor when absent), newest first.
#[instrument(skip(store), fields(user = %actor.id))]
pub async fn list_for_user(store: &dyn Store, actor: Actor, target: Option<Uuid>, req: PageRequest) -> Result<Page<CancellationDetails>> {
    let target = target.unwrap_or(actor.id);
    if !actor.may_act_for(target) {
        return Err(ShopError::Forbidden("Not allowed to view these cancellation requests"));
    }
    let filter = CancellationFilter { user_id: Some(target) };

    let mut tx = store.begin().await?;
    let page = fetch_page(&mut CancellationQuery { tx: &mut *tx }, &filter, req).await?;
    let mut items = Vec::with_capacity(page.count());
    for request in page.items.iter().cloned() {
        items.push(attach_order(&mut *tx, request).await?);
    }
    tx.commit().await?;
    Ok(page.with_items(items))
}

#[instrument(skip(store, update), fields(user = %actor.id))]
pub async fn update(store: &dyn Store, actor: Actor, id: Uuid, update: CancellationUpdate) -> Result<CancellationDetails> {
    let mut tx = store.begin().await?;
    let mut request = tx.find_cancellation(id).await?.ok_or(ShopError::NotFound("Cancellation request"))?;
    if !actor.may_act_for(request.user_id) {
        return Err(ShopError::Forbidden("Not allowed to update this cancellation request"));
    }
    if !update.apply(&mut request, actor.is_admin(), Utc::now()) {
        return Err(ShopError::Validation("No fields to update".into()));
    }
    let request = tx.update_cancellation(&request).await?;
    let details = attach_order(&mut *tx, request).await?;
    tx.commit().await?;
    info!(request_id = %id, decision = ?details.request.decision, "cancellation request updated");
    Ok(details)
}
