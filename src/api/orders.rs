use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use super::envelope::{ApiResponse, Paginated};
use super::{ApiJson, ApiPath, AppState, AuthUser, ListQuery};
use crate::domain::{Actor, OrderDetails, OrderStatus, PlaceOrder};
use crate::services::orders;
use crate::Result;

#[derive(Debug, Default, Deserialize)]
pub struct StatusBody {
    pub status: Option<String>,
}

pub async fn create(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiJson(input): ApiJson<PlaceOrder>) -> Result<Response> {
    let details = orders::create_order(s.store.as_ref(), actor, input).await?;
    Ok(ApiResponse::with_message("Order created", details).created())
}

pub async fn update_status(
    State(s): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<ApiResponse<OrderDetails>> {
    let details = orders::update_order_status(s.store.as_ref(), actor, id, body.status.as_deref()).await?;
    Ok(ApiResponse::with_message("Order status updated", details))
}

pub async fn list(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<ListQuery>) -> Result<Paginated<OrderDetails>> {
    let page = orders::list_orders(s.store.as_ref(), actor, q.status.as_deref(), q.page_request()).await?;
    Ok(page.into())
}

async fn list_with(s: AppState, actor: Actor, q: ListQuery, status: OrderStatus) -> Result<Paginated<OrderDetails>> {
    let page = orders::list_orders(s.store.as_ref(), actor, Some(status.as_str()), q.page_request()).await?;
    Ok(page.into())
}

pub async fn list_pending(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<ListQuery>) -> Result<Paginated<OrderDetails>> {
    list_with(s, actor, q, OrderStatus::Pending).await
}

pub async fn list_success(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<ListQuery>) -> Result<Paginated<OrderDetails>> {
    list_with(s, actor, q, OrderStatus::Success).await
}

pub async fn list_returned(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<ListQuery>) -> Result<Paginated<OrderDetails>> {
    list_with(s, actor, q, OrderStatus::Back).await
}
