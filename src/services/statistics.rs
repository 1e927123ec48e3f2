//! Admin dashboard statistics

use chrono::NaiveDate;
use tracing::instrument;

use super::require_admin;
use crate::domain::{Actor, OrderFilter, OrderStatus, Overview, RevenueBucket, RevenuePeriod, RevenueSummary};
use crate::store::{RepositoryError, Store, Tx};
use crate::{Result, ShopError};

async fn count_status(tx: &mut dyn Tx, status: OrderStatus) -> std::result::Result<i64, RepositoryError> {
    tx.count_orders(&OrderFilter { user_id: None, status: Some(status) }).await
}

async fn sum_period(tx: &mut dyn Tx, period: RevenuePeriod) -> Result<Vec<RevenueBucket>> {
    let (from, until) = period.window().ok_or_else(|| ShopError::Validation("Date out of range".into()))?;
    let sales = tx.list_sales(from, until).await?;
    Ok(period.bucket(&sales))
}

/// Catalog sizes and order counts per status.
#[instrument(skip(store), fields(user = %actor.id))]
pub async fn overview(store: &dyn Store, actor: Actor) -> Result<Overview> {
    require_admin(&actor)?;
    let mut tx = store.begin().await?;
    let catalog = tx.count_catalog().await?;
    let overview = Overview {
        total_categories: catalog.categories,
        total_comics: catalog.comics,
        total_users: catalog.users,
        pending_orders: count_status(&mut *tx, OrderStatus::Pending).await?,
        shipping_orders: count_status(&mut *tx, OrderStatus::Shipping).await?,
        success_orders: count_status(&mut *tx, OrderStatus::Success).await?,
        back_pending_orders: count_status(&mut *tx, OrderStatus::BackPending).await?,
        returned_orders: count_status(&mut *tx, OrderStatus::Back).await?,
    };
    tx.commit().await?;
    Ok(overview)
}

#[instrument(skip(store), fields(user = %actor.id))]
pub async fn revenue(store: &dyn Store, actor: Actor, period: RevenuePeriod) -> Result<Vec<RevenueBucket>> {
    require_admin(&actor)?;
    let mut tx = store.begin().await?;
    let buckets = sum_period(&mut *tx, period).await?;
    tx.commit().await?;
    Ok(buckets)
}

/// Day, week, month and year revenue around `today`, read in one transaction.
#[instrument(skip(store), fields(user = %actor.id))]
pub async fn revenue_summary(store: &dyn Store, actor: Actor, today: NaiveDate) -> Result<RevenueSummary> {
    require_admin(&actor)?;
    let mut tx = store.begin().await?;
    let summary = RevenueSummary {
        daily: sum_period(&mut *tx, RevenuePeriod::Day(today)).await?,
        weekly: sum_period(&mut *tx, RevenuePeriod::Week(today)).await?,
        monthly: sum_period(&mut *tx, RevenuePeriod::Month(today)).await?,
        yearly: sum_period(&mut *tx, RevenuePeriod::Year(today)).await?,
    };
    tx.commit().await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, PlaceOrder, Role};
    use crate::services::orders;
    use crate::store::MemoryStore;
    use chrono::{Datelike, Timelike, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    struct Shop {
        store: MemoryStore,
        buyer: Actor,
        admin: Actor,
        edition_id: Uuid,
    }

    async fn shop() -> Shop {
        let store = MemoryStore::new();
        store.seed_category("Manga").await;
        let buyer = Actor::user(store.seed_user("buyer", Role::User).await.id);
        let admin = Actor::admin(store.seed_user("admin", Role::Admin).await.id);
        let comic = store.seed_comic("Vagabond").await;
        store.seed_comic("Monster").await;
        let edition = store.seed_edition(comic.id, "Vol. 1", Decimal::new(1500, 2), 50).await;
        Shop { store, buyer, admin, edition_id: edition.id }
    }

    async fn order(shop: &Shop, qty: i32, status: Option<&str>) -> Order {
        let input = PlaceOrder { edition_id: Some(shop.edition_id), quantity: Some(qty), ..Default::default() };
        let order = orders::create_order(&shop.store, shop.buyer, input).await.unwrap().order;
        match status {
            Some(s) => orders::update_order_status(&shop.store, shop.admin, order.id, Some(s)).await.unwrap().order,
            None => order,
        }
    }

    #[tokio::test]
    async fn test_overview_counts() {
        let shop = shop().await;
        order(&shop, 1, None).await;
        order(&shop, 1, None).await;
        order(&shop, 1, Some("SHIPPING")).await;
        order(&shop, 1, Some("SUCCESS")).await;
        order(&shop, 1, Some("BACK_PENDING")).await;
        order(&shop, 1, Some("BACK")).await;

        let o = overview(&shop.store, shop.admin).await.unwrap();
        assert_eq!((o.total_categories, o.total_comics, o.total_users), (1, 2, 2));
        assert_eq!(
            (o.pending_orders, o.shipping_orders, o.success_orders, o.back_pending_orders, o.returned_orders),
            (2, 1, 1, 1, 1)
        );
    }

    #[tokio::test]
    async fn test_admin_only() {
        let shop = shop().await;
        assert!(matches!(overview(&shop.store, shop.buyer).await, Err(ShopError::Forbidden(_))));
        let today = Utc::now().date_naive();
        assert!(matches!(revenue(&shop.store, shop.buyer, RevenuePeriod::Day(today)).await, Err(ShopError::Forbidden(_))));
        assert!(matches!(revenue_summary(&shop.store, shop.buyer, today).await, Err(ShopError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_revenue_counts_only_successful_orders() {
        let shop = shop().await;
        let done = order(&shop, 2, Some("SUCCESS")).await;
        order(&shop, 3, Some("SHIPPING")).await;
        order(&shop, 1, None).await;

        let day = done.created_at.date_naive();
        let buckets = revenue(&shop.store, shop.admin, RevenuePeriod::Day(day)).await.unwrap();
        assert_eq!(buckets[done.created_at.hour() as usize].value, Decimal::new(3000, 2));
        assert_eq!(buckets.iter().map(|b| b.value).sum::<Decimal>(), Decimal::new(3000, 2));

        let summary = revenue_summary(&shop.store, shop.admin, day).await.unwrap();
        for period in [&summary.daily, &summary.weekly, &summary.monthly, &summary.yearly] {
            assert_eq!(period.iter().map(|b| b.value).sum::<Decimal>(), Decimal::new(3000, 2));
        }
        assert_eq!((summary.daily.len(), summary.weekly.len(), summary.yearly.len()), (24, 7, 12));

        let last_year = RevenuePeriod::year_of(day.year() - 1).unwrap();
        let empty = revenue(&shop.store, shop.admin, last_year).await.unwrap();
        assert!(empty.iter().all(|b| b.value.is_zero()));
    }

    #[tokio::test]
    async fn test_returned_order_leaves_revenue() {
        let shop = shop().await;
        let done = order(&shop, 2, Some("SUCCESS")).await;
        orders::update_order_status(&shop.store, shop.admin, done.id, Some("BACK")).await.unwrap();
        let buckets = revenue(&shop.store, shop.admin, RevenuePeriod::Day(done.created_at.date_naive())).await.unwrap();
        assert!(buckets.iter().all(|b| b.value.is_zero()));
    }
}
