use axum::{extract::State, response::Response};
use uuid::Uuid;

use super::envelope::ApiResponse;
use super::{ApiJson, ApiPath, AppState, AuthUser};
use crate::domain::{ComicEdition, EditionPatch, NewEdition};
use crate::services::catalog;
use crate::Result;

pub async fn create(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiJson(input): ApiJson<NewEdition>) -> Result<Response> {
    let edition = catalog::create_edition(s.store.as_ref(), actor, input).await?;
    Ok(ApiResponse::with_message("Edition created", edition).created())
}

pub async fn get(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<ApiResponse<ComicEdition>> {
    Ok(ApiResponse::ok(catalog::get_edition(s.store.as_ref(), id).await?))
}

pub async fn update(
    State(s): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<EditionPatch>,
) -> Result<ApiResponse<ComicEdition>> {
    let edition = catalog::update_edition(s.store.as_ref(), actor, id, patch).await?;
    Ok(ApiResponse::with_message("Edition updated", edition))
}

pub async fn remove(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>) -> Result<ApiResponse<()>> {
    catalog::delete_edition(s.store.as_ref(), actor, id).await?;
    Ok(ApiResponse::message("Edition deleted"))
}
