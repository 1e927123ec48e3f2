//! Shopping cart
//!
//! Stock is checked when a line is added or resized but never reserved; the
//! binding check happens again at checkout.

use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Actor, AddToCart, Cart, CartItem, CartLine, ComicEdition, SetQuantity};
use crate::store::{Store, Tx};
use crate::{Result, ShopError};

fn ensure_stock(edition: &ComicEdition, qty: i32) -> Result<()> {
    if edition.can_fulfil(qty) {
        return Ok(());
    }
    warn!(edition_id = %edition.id, qty, available = edition.stock_available, "cart quantity exceeds stock");
    Err(ShopError::InsufficientStock { available: edition.stock_available })
}

async fn line(tx: &mut dyn Tx, item: CartItem) -> Result<CartLine> {
    let edition = tx.find_edition(item.edition_id).await?;
    Ok(CartLine { item, edition })
}

async fn owned_item(tx: &mut dyn Tx, actor: &Actor, id: Uuid) -> Result<CartItem> {
    tx.find_cart_item(id)
        .await?
        .filter(|item| item.user_id == actor.id)
        .ok_or(ShopError::NotFound("Cart item"))
}

#[instrument(skip(store), fields(user = %actor.id))]
pub async fn get_cart(store: &dyn Store, actor: Actor) -> Result<Cart> {
    let mut tx = store.begin().await?;
    let items = tx.list_cart(actor.id).await?;
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        lines.push(line(&mut *tx, item).await?);
    }
    tx.commit().await?;
    Ok(Cart::new(lines))
}

/// Adds `quantity` (default 1) of an edition, merging into an existing line.
#[instrument(skip(store, input), fields(user = %actor.id))]
pub async fn add_to_cart(store: &dyn Store, actor: Actor, input: AddToCart) -> Result<CartLine> {
    input.validate()?;
    let edition_id = input.edition_id.ok_or_else(|| ShopError::Validation("editionId is required".into()))?;
    let quantity = input.quantity.unwrap_or(1);

    let mut tx = store.begin().await?;
    let edition = tx.find_edition(edition_id).await?.ok_or(ShopError::NotFound("Edition"))?;
    ensure_stock(&edition, quantity)?;

    // the merge happens in one statement; re-check the quantity it produced
    let item = tx.upsert_cart_item(actor.id, edition_id, quantity).await?;
    ensure_stock(&edition, item.quantity)?;
    tx.commit().await?;

    info!(%edition_id, quantity = item.quantity, "cart line saved");
    Ok(CartLine { item, edition: Some(edition) })
}

#[instrument(skip(store, input), fields(user = %actor.id))]
pub async fn update_cart_item(store: &dyn Store, actor: Actor, id: Uuid, input: SetQuantity) -> Result<CartLine> {
    input.validate()?;
    let quantity = input.quantity.ok_or_else(|| ShopError::Validation("quantity is required".into()))?;

    let mut tx = store.begin().await?;
    let item = owned_item(&mut *tx, &actor, id).await?;
    let edition = tx.find_edition(item.edition_id).await?.ok_or(ShopError::NotFound("Edition"))?;
    ensure_stock(&edition, quantity)?;
    let item = tx.set_cart_quantity(id, quantity).await?.ok_or(ShopError::NotFound("Cart item"))?;
    tx.commit().await?;
    Ok(CartLine { item, edition: Some(edition) })
}

#[instrument(skip(store), fields(user = %actor.id))]
pub async fn remove_cart_item(store: &dyn Store, actor: Actor, id: Uuid) -> Result<()> {
    let mut tx = store.begin().await?;
    owned_item(&mut *tx, &actor, id).await?;
    tx.delete_cart_item(id).await?;
    tx.commit().await?;
    Ok(())
}

/// Empties the actor's cart. Returns the number of removed lines.
#[instrument(skip(store), fields(user = %actor.id))]
pub async fn clear_cart(store: &dyn Store, actor: Actor) -> Result<u64> {
    let mut tx = store.begin().await?;
    let removed = tx.clear_cart(actor.id).await?;
    tx.commit().await?;
    info!(removed, "cart cleared");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    async fn setup(stock: i32) -> (MemoryStore, Actor, ComicEdition) {
        let store = MemoryStore::new();
        let actor = Actor::user(store.seed_user("collector", Role::User).await.id);
        let comic = store.seed_comic("Saga").await;
        let edition = store.seed_edition(comic.id, "Compendium", Decimal::new(1250, 2), stock).await;
        (store, actor, edition)
    }

    fn add(edition: &ComicEdition, qty: Option<i32>) -> AddToCart {
        AddToCart { edition_id: Some(edition.id), quantity: qty }
    }

    #[tokio::test]
    async fn test_repeated_adds_merge() {
        let (store, actor, edition) = setup(10).await;
        assert_eq!(add_to_cart(&store, actor, add(&edition, None)).await.unwrap().item.quantity, 1);
        assert_eq!(add_to_cart(&store, actor, add(&edition, Some(3))).await.unwrap().item.quantity, 4);
        assert_eq!(store.cart_items().await.len(), 1);

        let cart = get_cart(&store, actor).await.unwrap();
        assert_eq!(cart.count, 1);
        assert_eq!(cart.total_amount, Decimal::new(5000, 2));
    }

    #[tokio::test]
    async fn test_merge_rechecks_stock() {
        let (store, actor, edition) = setup(3).await;
        add_to_cart(&store, actor, add(&edition, Some(2))).await.unwrap();
        let err = add_to_cart(&store, actor, add(&edition, Some(2))).await.unwrap_err();
        assert!(matches!(err, ShopError::InsufficientStock { available: 3 }));
        assert_eq!(store.cart_items().await[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_concurrent_adds_never_exceed_stock() {
        let (store, actor, edition) = setup(5).await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let input = add(&edition, Some(2));
            handles.push(tokio::spawn(async move { add_to_cart(&store, actor, input).await }));
        }
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 2);
        assert_eq!(store.cart_items().await[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_add_rejections() {
        let (store, actor, edition) = setup(3).await;
        assert!(matches!(add_to_cart(&store, actor, AddToCart::default()).await, Err(ShopError::Validation(_))));
        assert!(matches!(add_to_cart(&store, actor, add(&edition, Some(0))).await, Err(ShopError::Validation(_))));
        let unknown = AddToCart { edition_id: Some(Uuid::now_v7()), quantity: None };
        assert!(matches!(add_to_cart(&store, actor, unknown).await, Err(ShopError::NotFound("Edition"))));
    }

    #[tokio::test]
    async fn test_lines_belong_to_owner() {
        let (store, actor, edition) = setup(5).await;
        let id = add_to_cart(&store, actor, add(&edition, Some(1))).await.unwrap().item.id;
        let stranger = Actor::user(Uuid::now_v7());

        let set = |q| SetQuantity { quantity: Some(q) };
        assert!(matches!(update_cart_item(&store, stranger, id, set(2)).await, Err(ShopError::NotFound(_))));
        assert!(matches!(remove_cart_item(&store, stranger, id).await, Err(ShopError::NotFound(_))));
        assert!(matches!(update_cart_item(&store, actor, id, set(9)).await, Err(ShopError::InsufficientStock { available: 5 })));
        assert_eq!(update_cart_item(&store, actor, id, set(5)).await.unwrap().item.quantity, 5);

        remove_cart_item(&store, actor, id).await.unwrap();
        assert!(get_cart(&store, actor).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_only_touches_own_cart() {
        let (store, actor, edition) = setup(5).await;
        let other = Actor::user(Uuid::now_v7());
        add_to_cart(&store, actor, add(&edition, None)).await.unwrap();
        add_to_cart(&store, other, add(&edition, None)).await.unwrap();
        assert_eq!(clear_cart(&store, actor).await.unwrap(), 1);
        assert_eq!(store.cart_items().await.len(), 1);
    }
}
