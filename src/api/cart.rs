use axum::{extract::State, response::Response};
use uuid::Uuid;

use super::envelope::ApiResponse;
use super::{ApiJson, ApiPath, AppState, AuthUser};
use crate::domain::{AddToCart, Cart, CartLine, SetQuantity};
use crate::services::cart;
use crate::Result;

pub async fn get(State(s): State<AppState>, AuthUser(actor): AuthUser) -> Result<ApiResponse<Cart>> {
    Ok(ApiResponse::ok(cart::get_cart(s.store.as_ref(), actor).await?))
}

pub async fn add(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiJson(input): ApiJson<AddToCart>) -> Result<Response> {
    let line = cart::add_to_cart(s.store.as_ref(), actor, input).await?;
    Ok(ApiResponse::with_message("Added to cart", line).created())
}

pub async fn update(
    State(s): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<SetQuantity>,
) -> Result<ApiResponse<CartLine>> {
    let line = cart::update_cart_item(s.store.as_ref(), actor, id, input).await?;
    Ok(ApiResponse::with_message("Cart updated", line))
}

pub async fn remove(State(s): State<AppState>, AuthUser(actor): AuthUser, ApiPath(id): ApiPath<Uuid>) -> Result<ApiResponse<()>> {
    cart::remove_cart_item(s.store.as_ref(), actor, id).await?;
    Ok(ApiResponse::message("Removed from cart"))
}

pub async fn clear(State(s): State<AppState>, AuthUser(actor): AuthUser) -> Result<ApiResponse<()>> {
    let removed = cart::clear_cart(s.store.as_ref(), actor).await?;
    Ok(ApiResponse::message(format!("Removed {removed} item(s) from cart")))
}
