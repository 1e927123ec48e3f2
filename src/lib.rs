//! Comic Store backend
//!
//! Order-and-inventory core of a comic-book shop.
//!
//! ## Features
//! - Checkout with atomic stock debit and cart cleanup
//! - Order status workflow with stock restoration on returns
//! - Cancellation requests with admin decisions
//! - Shopping cart
//! - Catalog editions guarded against edits while referenced

pub mod api;
pub mod config;
pub mod domain;
pub mod pagination;
pub mod services;
pub mod store;

use thiserror::Error;

use crate::domain::OrderStatus;
use crate::store::RepositoryError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Insufficient stock: {available} available")]
    InsufficientStock { available: i32 },

    #[error("Edition is referenced by a cart or an order")]
    EditionInUse,

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl ShopError {
    /// Statuses an `InvalidStatus` caller may choose from.
    pub fn valid_statuses() -> &'static [OrderStatus] { &OrderStatus::ALL }
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(m) => m.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        Self::Validation(messages.join("; "))
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
