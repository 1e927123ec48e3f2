//! Inventory ledger
//!
//! `stock_available` and `stock_sold` always move together and only inside
//! the caller's transaction. Both directions are single guarded statements at
//! the store; nothing here reads a counter, adjusts it and writes it back.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::StockLevel;
use crate::store::Tx;
use crate::{Result, ShopError};

/// Takes `qty` units out of available stock and counts them as sold.
pub async fn debit(tx: &mut dyn Tx, edition_id: Uuid, qty: i32) -> Result<StockLevel> {
    if qty <= 0 {
        return Err(ShopError::Validation("quantity must be at least 1".into()));
    }
    if let Some(level) = tx.debit_stock(edition_id, qty).await? {
        debug!(%edition_id, qty, available = level.available, "stock debited");
        return Ok(level);
    }
    match tx.find_edition(edition_id).await? {
        Some(edition) => {
            warn!(%edition_id, qty, available = edition.stock_available, "insufficient stock");
            Err(ShopError::InsufficientStock { available: edition.stock_available })
        }
        None => Err(ShopError::NotFound("Edition")),
    }
}

/// Returns `qty` units to available stock. No upper bound is enforced.
pub async fn credit(tx: &mut dyn Tx, edition_id: Uuid, qty: i32) -> Result<StockLevel> {
    if qty <= 0 {
        return Err(ShopError::Validation("quantity must be at least 1".into()));
    }
    let level = tx.credit_stock(edition_id, qty).await?.ok_or(ShopError::NotFound("Edition"))?;
    debug!(%edition_id, qty, available = level.available, "stock credited");
    Ok(level)
}
