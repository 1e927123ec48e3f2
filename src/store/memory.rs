//! In-process store
//!
//! Holds every table behind one async mutex. A transaction owns the lock for
//! its whole lifetime and works on a private copy, so transactions are
//! serialized and a dropped transaction leaves the shared tables untouched.
//! Used by the test-suite and when no `DATABASE_URL` is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{RepositoryError, Store, Tx};
use crate::domain::{
    CancellationFilter, CancellationRequest, CartItem, CatalogCounts, Category, Comic, ComicEdition, Decision,
    DiscountCode, NewOrder, Order, OrderFilter, OrderStatus, Role, Sale, ShippingAddress, StockLevel, User,
};

#[derive(Clone, Debug, Default)]
struct Tables {
    categories: HashMap<Uuid, Category>,
    comics: HashMap<Uuid, Comic>,
    editions: HashMap<Uuid, ComicEdition>,
    users: HashMap<Uuid, User>,
    addresses: HashMap<Uuid, ShippingAddress>,
    discounts: HashMap<Uuid, DiscountCode>,
    // insertion-ordered, oldest first
    orders: Vec<Order>,
    cart: Vec<CartItem>,
    cancellations: Vec<CancellationRequest>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn seed_category(&self, name: &str) -> Category {
        let category = Category { id: Uuid::now_v7(), name: name.to_string() };
        self.tables.lock().await.categories.insert(category.id, category.clone());
        category
    }

    pub async fn seed_comic(&self, title: &str) -> Comic {
        let comic = Comic { id: Uuid::now_v7(), title: title.to_string(), author: None, category_id: None };
        self.tables.lock().await.comics.insert(comic.id, comic.clone());
        comic
    }

    pub async fn seed_edition(&self, comic_id: Uuid, name: &str, price: Decimal, stock: i32) -> ComicEdition {
        let edition = ComicEdition {
            id: Uuid::now_v7(), comic_id, name: name.to_string(), image: None,
            price, page_count: 180, stock_available: stock, stock_sold: 0,
        };
        self.tables.lock().await.editions.insert(edition.id, edition.clone());
        edition
    }

    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let user = User { id: Uuid::now_v7(), username: username.to_string(), nickname: None, full_name: None, role };
        self.tables.lock().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn seed_address(&self, user_id: Uuid) -> ShippingAddress {
        let address = ShippingAddress {
            id: Uuid::now_v7(), user_id, recipient: "Recipient".into(), phone: "0900000000".into(), line: "1 Main St".into(),
        };
        self.tables.lock().await.addresses.insert(address.id, address.clone());
        address
    }

    pub async fn seed_discount(&self, code: &str) -> DiscountCode {
        let discount = DiscountCode { id: Uuid::now_v7(), code: code.to_string(), usage_count: 0 };
        self.tables.lock().await.discounts.insert(discount.id, discount.clone());
        discount
    }

    pub async fn edition(&self, id: Uuid) -> Option<ComicEdition> { self.tables.lock().await.editions.get(&id).cloned() }
    pub async fn discount(&self, id: Uuid) -> Option<DiscountCode> { self.tables.lock().await.discounts.get(&id).cloned() }
    pub async fn user(&self, id: Uuid) -> Option<User> { self.tables.lock().await.users.get(&id).cloned() }
    pub async fn orders(&self) -> Vec<Order> { self.tables.lock().await.orders.clone() }
    pub async fn cart_items(&self) -> Vec<CartItem> { self.tables.lock().await.cart.clone() }
    pub async fn cancellations(&self) -> Vec<CancellationRequest> { self.tables.lock().await.cancellations.clone() }

    pub async fn addresses_of(&self, user_id: Uuid) -> Vec<ShippingAddress> {
        self.tables.lock().await.addresses.values().filter(|a| a.user_id == user_id).cloned().collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Tx>, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

/// Newest-first page over an insertion-ordered table.
fn page<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    rows.iter().rev().filter(|r| keep(r)).skip(offset).take(limit).cloned().collect()
}

fn count<T>(rows: &[T], keep: impl Fn(&T) -> bool) -> i64 {
    rows.iter().filter(|r| keep(r)).count() as i64
}

#[async_trait]
impl Tx for MemoryTx {
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn find_comic(&mut self, id: Uuid) -> Result<Option<Comic>, RepositoryError> {
        Ok(self.work.comics.get(&id).cloned())
    }

    async fn find_edition(&mut self, id: Uuid) -> Result<Option<ComicEdition>, RepositoryError> {
        Ok(self.work.editions.get(&id).cloned())
    }

    async fn insert_edition(&mut self, edition: &ComicEdition) -> Result<ComicEdition, RepositoryError> {
        self.work.editions.insert(edition.id, edition.clone());
        Ok(edition.clone())
    }

    async fn update_edition(&mut self, edition: &ComicEdition) -> Result<ComicEdition, RepositoryError> {
        let slot = self.work.editions.get_mut(&edition.id).ok_or(RepositoryError::NotFound("edition"))?;
        *slot = edition.clone();
        Ok(edition.clone())
    }

    async fn delete_edition(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.work.editions.remove(&id).is_some())
    }

    async fn edition_is_referenced(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.work.cart.iter().any(|c| c.edition_id == id) || self.work.orders.iter().any(|o| o.edition_id == id))
    }

    async fn debit_stock(&mut self, edition_id: Uuid, qty: i32) -> Result<Option<StockLevel>, RepositoryError> {
        Ok(self.work.editions.get_mut(&edition_id).filter(|e| e.stock_available >= qty).map(|e| {
            e.stock_available -= qty;
            e.stock_sold += qty;
            e.stock()
        }))
    }

    async fn credit_stock(&mut self, edition_id: Uuid, qty: i32) -> Result<Option<StockLevel>, RepositoryError> {
        let Some(e) = self.work.editions.get_mut(&edition_id) else { return Ok(None) };
        // mirrors the stock_sold >= 0 table constraint
        if e.stock_sold < qty {
            return Err(RepositoryError::DataCorruption(format!("edition {edition_id}: stock_sold would go negative")));
        }
        e.stock_available += qty;
        e.stock_sold -= qty;
        Ok(Some(e.stock()))
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.work.users.remove(&id).is_some())
    }

    async fn find_address(&mut self, id: Uuid) -> Result<Option<ShippingAddress>, RepositoryError> {
        Ok(self.work.addresses.get(&id).cloned())
    }

    async fn delete_addresses_of(&mut self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let before = self.work.addresses.len();
        self.work.addresses.retain(|_, a| a.user_id != user_id);
        Ok((before - self.work.addresses.len()) as u64)
    }

    async fn find_discount(&mut self, id: Uuid) -> Result<Option<DiscountCode>, RepositoryError> {
        Ok(self.work.discounts.get(&id).cloned())
    }

    async fn increment_discount_usage(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.work.discounts.get_mut(&id).map(|d| d.usage_count += 1).is_some())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let order = Order {
            id: Uuid::now_v7(),
            user_id: order.user_id,
            edition_id: order.edition_id,
            quantity: order.quantity,
            total: order.total,
            address_id: order.address_id,
            payment_method: order.payment_method.clone(),
            discount_id: order.discount_id,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        self.work.orders.push(order.clone());
        Ok(order)
    }

    async fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        Ok(self.work.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, RepositoryError> {
        Ok(self.work.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status;
            o.clone()
        }))
    }

    async fn count_orders(&mut self, filter: &OrderFilter) -> Result<i64, RepositoryError> {
        Ok(count(&self.work.orders, |o| filter.matches(o)))
    }

    async fn list_orders(&mut self, filter: &OrderFilter, offset: i64, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        Ok(page(&self.work.orders, |o| filter.matches(o), offset, limit))
    }

    async fn find_cart_item(&mut self, id: Uuid) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self.work.cart.iter().find(|c| c.id == id).cloned())
    }

    async fn list_cart(&mut self, user_id: Uuid) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self.work.cart.iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn upsert_cart_item(&mut self, user_id: Uuid, edition_id: Uuid, qty: i32) -> Result<CartItem, RepositoryError> {
        if let Some(item) = self.work.cart.iter_mut().find(|c| c.user_id == user_id && c.edition_id == edition_id) {
            item.quantity += qty;
            return Ok(item.clone());
        }
        let item = CartItem { id: Uuid::now_v7(), user_id, edition_id, quantity: qty, created_at: Utc::now() };
        self.work.cart.push(item.clone());
        Ok(item)
    }

    async fn set_cart_quantity(&mut self, id: Uuid, qty: i32) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self.work.cart.iter_mut().find(|c| c.id == id).map(|c| {
            c.quantity = qty;
            c.clone()
        }))
    }

    async fn delete_cart_item(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let before = self.work.cart.len();
        self.work.cart.retain(|c| c.id != id);
        Ok(self.work.cart.len() != before)
    }

    async fn delete_cart_item_for(&mut self, user_id: Uuid, edition_id: Uuid) -> Result<u64, RepositoryError> {
        let before = self.work.cart.len();
        self.work.cart.retain(|c| !(c.user_id == user_id && c.edition_id == edition_id));
        Ok((before - self.work.cart.len()) as u64)
    }

    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let before = self.work.cart.len();
        self.work.cart.retain(|c| c.user_id != user_id);
        Ok((before - self.work.cart.len()) as u64)
    }

    async fn insert_cancellation(&mut self, order_id: Uuid, user_id: Uuid, reason: &str) -> Result<CancellationRequest, RepositoryError> {
        let req = CancellationRequest {
            id: Uuid::now_v7(), order_id, user_id, reason: reason.to_string(), decision: Decision::Pending,
            reply_content: None, reply_at: None, created_at: Utc::now(),
        };
        self.work.cancellations.push(req.clone());
        Ok(req)
    }

    async fn find_cancellation(&mut self, id: Uuid) -> Result<Option<CancellationRequest>, RepositoryError> {
        Ok(self.work.cancellations.iter().find(|c| c.id == id).cloned())
    }

    async fn update_cancellation(&mut self, req: &CancellationRequest) -> Result<CancellationRequest, RepositoryError> {
        let slot = self.work.cancellations.iter_mut().find(|c| c.id == req.id).ok_or(RepositoryError::NotFound("cancellation request"))?;
        *slot = req.clone();
        Ok(req.clone())
    }

    async fn delete_cancellation(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let before = self.work.cancellations.len();
        self.work.cancellations.retain(|c| c.id != id);
        Ok(self.work.cancellations.len() != before)
    }

    async fn count_cancellations(&mut self, filter: &CancellationFilter) -> Result<i64, RepositoryError> {
        Ok(count(&self.work.cancellations, |c| filter.matches(c)))
    }

    async fn list_cancellations(&mut self, filter: &CancellationFilter, offset: i64, limit: i64) -> Result<Vec<CancellationRequest>, RepositoryError> {
        Ok(page(&self.work.cancellations, |c| filter.matches(c), offset, limit))
    }

    async fn count_catalog(&mut self) -> Result<CatalogCounts, RepositoryError> {
        Ok(CatalogCounts {
            categories: self.work.categories.len() as i64,
            comics: self.work.comics.len() as i64,
            users: self.work.users.len() as i64,
        })
    }

    async fn list_sales(&mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Sale>, RepositoryError> {
        Ok(self
            .work
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Success && o.created_at >= from && o.created_at < until)
            .map(|o| Sale { total: o.total, created_at: o.created_at })
            .collect())
    }
}
