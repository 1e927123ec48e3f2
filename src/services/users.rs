//! User removal
//!
//! A user's cart and addresses go with the account. Orders stay behind for
//! the audit trail and keep pointing at the removed id.

use tracing::{info, instrument};
use uuid::Uuid;

use super::require_admin;
use crate::domain::Actor;
use crate::store::Store;
use crate::{Result, ShopError};

#[instrument(skip(store), fields(user = %actor.id))]
pub async fn delete_user(store: &dyn Store, actor: Actor, id: Uuid) -> Result<()> {
    require_admin(&actor)?;
    let mut tx = store.begin().await?;
    tx.find_user(id).await?.ok_or(ShopError::NotFound("User"))?;

    let cart_lines = tx.clear_cart(id).await?;
    let addresses = tx.delete_addresses_of(id).await?;
    tx.delete_user(id).await?;
    tx.commit().await?;

    info!(user_id = %id, cart_lines, addresses, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AddToCart, PlaceOrder, Role};
    use crate::services::{cart, orders};
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_delete_keeps_orders() {
        let store = MemoryStore::new();
        let user = store.seed_user("leaving", Role::User).await;
        let actor = Actor::user(user.id);
        store.seed_address(user.id).await;
        let comic = store.seed_comic("Blacksad").await;
        let a = store.seed_edition(comic.id, "A", Decimal::new(30, 0), 5).await;
        let b = store.seed_edition(comic.id, "B", Decimal::new(30, 0), 5).await;
        cart::add_to_cart(&store, actor, AddToCart { edition_id: Some(a.id), quantity: None }).await.unwrap();
        orders::create_order(&store, actor, PlaceOrder { edition_id: Some(b.id), quantity: Some(1), ..Default::default() })
            .await
            .unwrap();

        assert!(matches!(delete_user(&store, actor, user.id).await, Err(ShopError::Forbidden(_))));
        delete_user(&store, Actor::admin(Uuid::now_v7()), user.id).await.unwrap();

        assert!(store.user(user.id).await.is_none());
        assert!(store.cart_items().await.is_empty());
        assert!(store.addresses_of(user.id).await.is_empty());
        assert_eq!(store.orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = MemoryStore::new();
        let err = delete_user(&store, Actor::admin(Uuid::now_v7()), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ShopError::NotFound("User")));
    }
}
