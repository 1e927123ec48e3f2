//! HTTP API
//!
//! Thin axum handlers over [`crate::services`]. Every response uses the
//! envelopes in [`envelope`]; every failure goes through the [`ShopError`]
//! response mapping.

pub mod auth;
pub mod envelope;
pub mod error;

mod cancellations;
mod cart;
mod editions;
mod orders;
mod statistics;
mod users;

use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::pagination::PageRequest;
use crate::store::Store;
use crate::ShopError;

pub use auth::AuthUser;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store) -> Self { Self { store: Arc::new(store) } }
}

/// `Json` whose rejection renders as a validation envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ShopError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejection renders as a validation envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ShopError))]
pub struct ApiPath<T>(pub T);

/// Raw listing parameters; coerced leniently by [`PageRequest::from_query`].
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "comic-store"})) }))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/pending", get(orders::list_pending))
        .route("/api/orders/success", get(orders::list_success))
        .route("/api/orders/returned", get(orders::list_returned))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/cancellation-requests", post(cancellations::create))
        .route("/api/cancellation-requests/user", get(cancellations::list_mine))
        .route("/api/cancellation-requests/user/:user_id", get(cancellations::list_for_user))
        .route("/api/cancellation-requests/:id", put(cancellations::update).delete(cancellations::remove))
        .route("/api/cart", get(cart::get).post(cart::add).delete(cart::clear))
        .route("/api/cart/:id", put(cart::update).delete(cart::remove))
        .route("/api/editions", post(editions::create))
        .route("/api/editions/:id", get(editions::get).put(editions::update).delete(editions::remove))
        .route("/api/users/:id", delete(users::remove))
        .route("/api/statistics/overview", get(statistics::overview))
        .route("/api/statistics/revenue/daily", get(statistics::daily))
        .route("/api/statistics/revenue/weekly", get(statistics::weekly))
        .route("/api/statistics/revenue/monthly", get(statistics::monthly))
        .route("/api/statistics/revenue/yearly", get(statistics::yearly))
        .route("/api/statistics/revenue/all", get(statistics::all))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
