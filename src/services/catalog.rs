//! Catalog editions
//!
//! Admin maintenance of purchasable editions. Once a cart line or an order
//! points at an edition, its row is frozen: price and stock history must
//! keep matching what was sold.

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::require_admin;
use crate::domain::{Actor, ComicEdition, EditionPatch, NewEdition};
use crate::store::{Store, Tx};
use crate::{Result, ShopError};

fn check_price(price: Decimal) -> Result<()> {
    if price > Decimal::ZERO { Ok(()) } else { Err(ShopError::Validation("price must be greater than 0".into())) }
}

async fn ensure_comic(tx: &mut dyn Tx, comic_id: Uuid) -> Result<()> {
    tx.find_comic(comic_id).await?.map(|_| ()).ok_or(ShopError::NotFound("Comic"))
}

async fn unlocked_edition(tx: &mut dyn Tx, id: Uuid) -> Result<ComicEdition> {
    let edition = tx.find_edition(id).await?.ok_or(ShopError::NotFound("Edition"))?;
    if tx.edition_is_referenced(id).await? {
        return Err(ShopError::EditionInUse);
    }
    Ok(edition)
}

#[instrument(skip(store, input), fields(user = %actor.id))]
pub async fn create_edition(store: &dyn Store, actor: Actor, input: NewEdition) -> Result<ComicEdition> {
    require_admin(&actor)?;
    input.validate()?;
    let (Some(comic_id), Some(name), Some(price), Some(page_count)) = (input.comic_id, input.name, input.price, input.page_count) else {
        return Err(ShopError::Validation("comicId, name, price and pageCount are required".into()));
    };
    check_price(price)?;

    let mut tx = store.begin().await?;
    ensure_comic(&mut *tx, comic_id).await?;
    let edition = tx
        .insert_edition(&ComicEdition {
            id: Uuid::now_v7(),
            comic_id,
            name,
            image: input.image,
            price,
            page_count,
            stock_available: input.stock_available.unwrap_or(0),
            stock_sold: input.stock_sold.unwrap_or(0),
        })
        .await?;
    tx.commit().await?;

    info!(edition_id = %edition.id, %comic_id, "edition created");
    Ok(edition)
}

pub async fn get_edition(store: &dyn Store, id: Uuid) -> Result<ComicEdition> {
    let mut tx = store.begin().await?;
    let edition = tx.find_edition(id).await?.ok_or(ShopError::NotFound("Edition"))?;
    tx.commit().await?;
    Ok(edition)
}

#[instrument(skip(store, patch), fields(user = %actor.id))]
pub async fn update_edition(store: &dyn Store, actor: Actor, id: Uuid, patch: EditionPatch) -> Result<ComicEdition> {
    require_admin(&actor)?;
    patch.validate()?;
    if let Some(price) = patch.price {
        check_price(price)?;
    }

    let mut tx = store.begin().await?;
    let mut edition = unlocked_edition(&mut *tx, id).await?;
    if let Some(comic_id) = patch.comic_id.filter(|c| *c != edition.comic_id) {
        ensure_comic(&mut *tx, comic_id).await?;
    }
    patch.apply(&mut edition);
    let edition = tx.update_edition(&edition).await?;
    tx.commit().await?;

    info!(edition_id = %id, "edition updated");
    Ok(edition)
}

#[instrument(skip(store), fields(user = %actor.id))]
pub async fn delete_edition(store: &dyn Store, actor: Actor, id: Uuid) -> Result<()> {
    require_admin(&actor)?;
    let mut tx = store.begin().await?;
    unlocked_edition(&mut *tx, id).await?;
    tx.delete_edition(id).await?;
    tx.commit().await?;
    info!(edition_id = %id, "edition deleted");
    Ok(())
}
