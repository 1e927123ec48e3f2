use axum::extract::State;
use uuid::Uuid;

use super::envelope::ApiResponse;
use super::{ApiPath, AppState, AuthUser};
use crate::services::users;
use crate::Result;

pub async fn remove(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>) -> Result<ApiResponse<()>> {
    users::delete_user(s.store.as_ref(), actor, id).await?;
    Ok(ApiResponse::message("User deleted"))
}
