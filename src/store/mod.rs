//! Persistence boundary
//!
//! Every read and write goes through a [`Tx`] opened from a [`Store`]. A
//! transaction is all-or-nothing: its writes become visible on [`Tx::commit`]
//! and are discarded if the handle is dropped first, including on `?` early
//! returns and panics.
//!
//! Stock counters are only ever changed through [`Tx::debit_stock`] and
//! [`Tx::credit_stock`], which the backends execute as single guarded
//! increment/decrement statements.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    CancellationFilter, CancellationRequest, CartItem, CatalogCounts, Comic, ComicEdition, DiscountCode, NewOrder,
    Order, OrderFilter, OrderStatus, Sale, ShippingAddress, StockLevel, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Opens transactions. Shared across request handlers.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn begin(&self) -> Result<Box<dyn Tx>, RepositoryError>;
}

/// One unit of work. Rolled back on drop unless committed.
#[async_trait]
pub trait Tx: Send {
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    // catalog
    async fn find_comic(&mut self, id: Uuid) -> Result<Option<Comic>, RepositoryError>;
    async fn find_edition(&mut self, id: Uuid) -> Result<Option<ComicEdition>, RepositoryError>;
    async fn insert_edition(&mut self, edition: &ComicEdition) -> Result<ComicEdition, RepositoryError>;
    async fn update_edition(&mut self, edition: &ComicEdition) -> Result<ComicEdition, RepositoryError>;
    async fn delete_edition(&mut self, id: Uuid) -> Result<bool, RepositoryError>;
    /// Whether any cart item or order points at the edition.
    async fn edition_is_referenced(&mut self, id: Uuid) -> Result<bool, RepositoryError>;

    // inventory ledger
    /// Moves `qty` from available to sold if at least `qty` is available.
    /// `None` when the guard did not match (short stock or unknown edition).
    async fn debit_stock(&mut self, edition_id: Uuid, qty: i32) -> Result<Option<StockLevel>, RepositoryError>;
    /// Moves `qty` from sold back to available. `None` for an unknown edition.
    async fn credit_stock(&mut self, edition_id: Uuid, qty: i32) -> Result<Option<StockLevel>, RepositoryError>;

    // customers
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn delete_user(&mut self, id: Uuid) -> Result<bool, RepositoryError>;
    async fn find_address(&mut self, id: Uuid) -> Result<Option<ShippingAddress>, RepositoryError>;
    async fn delete_addresses_of(&mut self, user_id: Uuid) -> Result<u64, RepositoryError>;

    // discounts
    async fn find_discount(&mut self, id: Uuid) -> Result<Option<DiscountCode>, RepositoryError>;
    /// `false` for an unknown discount.
    async fn increment_discount_usage(&mut self, id: Uuid) -> Result<bool, RepositoryError>;

    // orders
    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError>;
    async fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, RepositoryError>;
    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, RepositoryError>;
    async fn count_orders(&mut self, filter: &OrderFilter) -> Result<i64, RepositoryError>;
    /// Newest first.
    async fn list_orders(&mut self, filter: &OrderFilter, offset: i64, limit: i64) -> Result<Vec<Order>, RepositoryError>;

    // cart
    async fn find_cart_item(&mut self, id: Uuid) -> Result<Option<CartItem>, RepositoryError>;
    async fn list_cart(&mut self, user_id: Uuid) -> Result<Vec<CartItem>, RepositoryError>;
    /// Adds `qty` to the user's line for the edition, creating the line if
    /// needed, and returns the line as stored.
    async fn upsert_cart_item(&mut self, user_id: Uuid, edition_id: Uuid, qty: i32) -> Result<CartItem, RepositoryError>;
    async fn set_cart_quantity(&mut self, id: Uuid, qty: i32) -> Result<Option<CartItem>, RepositoryError>;
    async fn delete_cart_item(&mut self, id: Uuid) -> Result<bool, RepositoryError>;
    async fn delete_cart_item_for(&mut self, user_id: Uuid, edition_id: Uuid) -> Result<u64, RepositoryError>;
    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64, RepositoryError>;

    // cancellation requests
    async fn insert_cancellation(&mut self, order_id: Uuid, user_id: Uuid, reason: &str) -> Result<CancellationRequest, RepositoryError>;
    async fn find_cancellation(&mut self, id: Uuid) -> Result<Option<CancellationRequest>, RepositoryError>;
    async fn update_cancellation(&mut self, req: &CancellationRequest) -> Result<CancellationRequest, RepositoryError>;
    async fn delete_cancellation(&mut self, id: Uuid) -> Result<bool, RepositoryError>;
    async fn count_cancellations(&mut self, filter: &CancellationFilter) -> Result<i64, RepositoryError>;
    /// Newest first.
    async fn list_cancellations(&mut self, filter: &CancellationFilter, offset: i64, limit: i64) -> Result<Vec<CancellationRequest>, RepositoryError>;

    // statistics
    async fn count_catalog(&mut self) -> Result<CatalogCounts, RepositoryError>;
    /// `SUCCESS` orders created in `[from, until)`, oldest first.
    async fn list_sales(&mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Sale>, RepositoryError>;
}
