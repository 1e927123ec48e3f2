use axum::{
    extract::{Query, State},
    response::Response,
};
use uuid::Uuid;

use super::envelope::{ApiResponse, Paginated};
use super::{ApiJson, ApiPath, AppState, AuthUser, ListQuery};
use crate::domain::{CancellationDetails, CancellationUpdate, NewCancellation};
use crate::services::cancellations;
use crate::Result;

pub async fn create(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiJson(input): ApiJson<NewCancellation>) -> Result<Response> {
    let details = cancellations::create(s.store.as_ref(), actor, input).await?;
    Ok(ApiResponse::with_message("Cancellation request created", details).created())
}

pub async fn list_mine(State(s): State<AppState>, AuthUser(actor): AuthUser, Query(q): Query<ListQuery>) -> Result<Paginated<CancellationDetails>> {
    Ok(cancellations::list_for_user(s.store.as_ref(), actor, None, q.page_request()).await?.into())
}

pub async fn list_for_user(
    State(s): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
    Query(q): Query<ListQuery>,
) -> Result<Paginated<CancellationDetails>> {
    Ok(cancellations::list_for_user(s.store.as_ref(), actor, Some(user_id), q.page_request()).await?.into())
}

pub async fn update(
    State(s): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<CancellationUpdate>,
) -> Result<ApiResponse<CancellationDetails>> {
    let details = cancellations::update(s.store.as_ref(), actor, id, patch).await?;
    Ok(ApiResponse::with_message("Cancellation request updated", details))
}

pub async fn remove(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>) -> Result<ApiResponse<()>> {
    cancellations::delete(s.store.as_ref(), actor, id).await?;
    Ok(ApiResponse::message("Cancellation request deleted"))
}
