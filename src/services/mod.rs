//! Use-case layer
//!
//! Each operation takes the store as an explicit dependency, opens at most
//! one transaction, checks its preconditions in a fixed order and fails on
//! the first violation.

pub mod cancellations;
pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod statistics;
pub mod users;

use crate::domain::Actor;
use crate::{Result, ShopError};

pub(crate) fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() { Ok(()) } else { Err(ShopError::Forbidden("Admin access required")) }
}
