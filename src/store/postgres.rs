//! PostgreSQL store
//!
//! Schema lives in `migrations/`. Queries are plain `sqlx::query_as` strings
//! mapped through private row types; the pool is created once at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use super::{RepositoryError, Store, Tx};
use crate::domain::{
    CancellationFilter, CancellationRequest, CartItem, CatalogCounts, Comic, ComicEdition, Decision, DiscountCode,
    NewOrder, Order, OrderFilter, OrderStatus, Role, Sale, ShippingAddress, StockLevel, User,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Tx>, RepositoryError> {
        Ok(Box::new(PgTx { tx: self.pool.begin().await? }))
    }
}

/// Wraps a pooled transaction; `sqlx` rolls it back when dropped uncommitted.
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ComicRow { id: Uuid, title: String, author: Option<String>, category_id: Option<Uuid> }

impl From<ComicRow> for Comic {
    fn from(r: ComicRow) -> Self { Self { id: r.id, title: r.title, author: r.author, category_id: r.category_id } }
}

#[derive(Debug, sqlx::FromRow)]
struct EditionRow {
    id: Uuid, comic_id: Uuid, name: String, image: Option<String>, price: Decimal,
    page_count: i32, stock_available: i32, stock_sold: i32,
}

impl From<EditionRow> for ComicEdition {
    fn from(r: EditionRow) -> Self {
        Self {
            id: r.id, comic_id: r.comic_id, name: r.name, image: r.image, price: r.price,
            page_count: r.page_count, stock_available: r.stock_available, stock_sold: r.stock_sold,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow { stock_available: i32, stock_sold: i32 }

impl From<StockRow> for StockLevel {
    fn from(r: StockRow) -> Self { Self { available: r.stock_available, sold: r.stock_sold } }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow { id: Uuid, username: String, nickname: Option<String>, full_name: Option<String>, role: String }

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;
    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role: Role = r.role.parse().map_err(|e| RepositoryError::DataCorruption(format!("user {}: {e}", r.id)))?;
        Ok(Self { id: r.id, username: r.username, nickname: r.nickname, full_name: r.full_name, role })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow { id: Uuid, user_id: Uuid, recipient: String, phone: String, line: String }

impl From<AddressRow> for ShippingAddress {
    fn from(r: AddressRow) -> Self { Self { id: r.id, user_id: r.user_id, recipient: r.recipient, phone: r.phone, line: r.line } }
}

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow { id: Uuid, code: String, usage_count: i32 }

impl From<DiscountRow> for DiscountCode {
    fn from(r: DiscountRow) -> Self { Self { id: r.id, code: r.code, usage_count: r.usage_count } }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: Uuid, edition_id: Uuid, quantity: i32, total: Decimal,
    address_id: Option<Uuid>, payment_method: Option<String>, discount_id: Option<Uuid>,
    status: String, created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = r.status.parse().map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", r.id)))?;
        Ok(Self {
            id: r.id, user_id: r.user_id, edition_id: r.edition_id, quantity: r.quantity, total: r.total,
            address_id: r.address_id, payment_method: r.payment_method, discount_id: r.discount_id,
            status, created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow { id: Uuid, user_id: Uuid, edition_id: Uuid, quantity: i32, created_at: DateTime<Utc> }

impl From<CartRow> for CartItem {
    fn from(r: CartRow) -> Self { Self { id: r.id, user_id: r.user_id, edition_id: r.edition_id, quantity: r.quantity, created_at: r.created_at } }
}

#[derive(Debug, sqlx::FromRow)]
struct CancellationRow {
    id: Uuid, order_id: Uuid, user_id: Uuid, reason: String, decision: i16,
    reply_content: Option<String>, reply_at: Option<DateTime<Utc>>, created_at: DateTime<Utc>,
}

impl TryFrom<CancellationRow> for CancellationRequest {
    type Error = RepositoryError;
    fn try_from(r: CancellationRow) -> Result<Self, Self::Error> {
        let decision = Decision::try_from(r.decision).map_err(|e| RepositoryError::DataCorruption(format!("cancellation {}: {e}", r.id)))?;
        Ok(Self {
            id: r.id, order_id: r.order_id, user_id: r.user_id, reason: r.reason, decision,
            reply_content: r.reply_content, reply_at: r.reply_at, created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow { total: Decimal, created_at: DateTime<Utc> }

impl From<SaleRow> for Sale {
    fn from(r: SaleRow) -> Self { Self { total: r.total, created_at: r.created_at } }
}

const EDITION_COLS: &str = "id, comic_id, name, image, price, page_count, stock_available, stock_sold";
const ORDER_COLS: &str = "id, user_id, edition_id, quantity, total, address_id, payment_method, discount_id, status, created_at";
const CART_COLS: &str = "id, user_id, edition_id, quantity, created_at";
const CANCELLATION_COLS: &str = "id, order_id, user_id, reason, decision, reply_content, reply_at, created_at";

// Count and page queries share these predicates so totals always match the rows.
const ORDER_FILTER: &str = "($1::uuid IS NULL OR user_id = $1) AND ($2::text IS NULL OR status = $2)";
const CANCELLATION_FILTER: &str = "($1::uuid IS NULL OR user_id = $1)";

#[async_trait]
impl Tx for PgTx {
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn find_comic(&mut self, id: Uuid) -> Result<Option<Comic>, RepositoryError> {
        let row = sqlx::query_as::<_, ComicRow>("SELECT id, title, author, category_id FROM comics WHERE id = $1")
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn find_edition(&mut self, id: Uuid) -> Result<Option<ComicEdition>, RepositoryError> {
        let row = sqlx::query_as::<_, EditionRow>(&format!("SELECT {EDITION_COLS} FROM comic_editions WHERE id = $1"))
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn insert_edition(&mut self, e: &ComicEdition) -> Result<ComicEdition, RepositoryError> {
        let row = sqlx::query_as::<_, EditionRow>(&format!(
            "INSERT INTO comic_editions ({EDITION_COLS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {EDITION_COLS}"
        ))
        .bind(e.id).bind(e.comic_id).bind(&e.name).bind(&e.image).bind(e.price)
        .bind(e.page_count).bind(e.stock_available).bind(e.stock_sold)
        .fetch_one(&mut *self.tx).await?;
        Ok(row.into())
    }

    async fn update_edition(&mut self, e: &ComicEdition) -> Result<ComicEdition, RepositoryError> {
        let row = sqlx::query_as::<_, EditionRow>(&format!(
            "UPDATE comic_editions SET comic_id = $2, name = $3, image = $4, price = $5, page_count = $6, \
             stock_available = $7, stock_sold = $8 WHERE id = $1 RETURNING {EDITION_COLS}"
        ))
        .bind(e.id).bind(e.comic_id).bind(&e.name).bind(&e.image).bind(e.price)
        .bind(e.page_count).bind(e.stock_available).bind(e.stock_sold)
        .fetch_optional(&mut *self.tx).await?;
        row.map(Into::into).ok_or(RepositoryError::NotFound("edition"))
    }

    async fn delete_edition(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("DELETE FROM comic_editions WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn edition_is_referenced(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let (referenced,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM cart_items WHERE edition_id = $1) OR EXISTS (SELECT 1 FROM orders WHERE edition_id = $1)",
        )
        .bind(id).fetch_one(&mut *self.tx).await?;
        Ok(referenced)
    }

    async fn debit_stock(&mut self, edition_id: Uuid, qty: i32) -> Result<Option<StockLevel>, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(
            "UPDATE comic_editions SET stock_available = stock_available - $2, stock_sold = stock_sold + $2 \
             WHERE id = $1 AND stock_available >= $2 RETURNING stock_available, stock_sold",
        )
        .bind(edition_id).bind(qty).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn credit_stock(&mut self, edition_id: Uuid, qty: i32) -> Result<Option<StockLevel>, RepositoryError> {
        let row = sqlx::query_as::<_, StockRow>(
            "UPDATE comic_editions SET stock_available = stock_available + $2, stock_sold = stock_sold - $2 \
             WHERE id = $1 RETURNING stock_available, stock_sold",
        )
        .bind(edition_id).bind(qty).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, username, nickname, full_name, role FROM users WHERE id = $1")
            .bind(id).fetch_optional(&mut *self.tx).await?;
        row.map(User::try_from).transpose()
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_address(&mut self, id: Uuid) -> Result<Option<ShippingAddress>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>("SELECT id, user_id, recipient, phone, line FROM shipping_addresses WHERE id = $1")
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn delete_addresses_of(&mut self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let res = sqlx::query("DELETE FROM shipping_addresses WHERE user_id = $1").bind(user_id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected())
    }

    async fn find_discount(&mut self, id: Uuid) -> Result<Option<DiscountCode>, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>("SELECT id, code, usage_count FROM discount_codes WHERE id = $1")
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn increment_discount_usage(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("UPDATE discount_codes SET usage_count = usage_count + 1 WHERE id = $1")
            .bind(id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_order(&mut self, o: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (id, user_id, edition_id, quantity, total, address_id, payment_method, discount_id, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) RETURNING {ORDER_COLS}"
        ))
        .bind(Uuid::now_v7()).bind(o.user_id).bind(o.edition_id).bind(o.quantity).bind(o.total)
        .bind(o.address_id).bind(&o.payment_method).bind(o.discount_id).bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *self.tx).await?;
        row.try_into()
    }

    async fn find_order(&mut self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLS} FROM orders WHERE id = $1"))
            .bind(id).fetch_optional(&mut *self.tx).await?;
        row.map(Order::try_from).transpose()
    }

    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLS}"))
            .bind(id).bind(status.as_str()).fetch_optional(&mut *self.tx).await?;
        row.map(Order::try_from).transpose()
    }

    async fn count_orders(&mut self, filter: &OrderFilter) -> Result<i64, RepositoryError> {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM orders WHERE {ORDER_FILTER}"))
            .bind(filter.user_id).bind(filter.status.map(|s| s.as_str()))
            .fetch_one(&mut *self.tx).await?;
        Ok(n)
    }

    async fn list_orders(&mut self, filter: &OrderFilter, offset: i64, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLS} FROM orders WHERE {ORDER_FILTER} ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.user_id).bind(filter.status.map(|s| s.as_str())).bind(limit).bind(offset)
        .fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn find_cart_item(&mut self, id: Uuid) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!("SELECT {CART_COLS} FROM cart_items WHERE id = $1"))
            .bind(id).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn list_cart(&mut self, user_id: Uuid) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(&format!("SELECT {CART_COLS} FROM cart_items WHERE user_id = $1 ORDER BY created_at"))
            .bind(user_id).fetch_all(&mut *self.tx).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_cart_item(&mut self, user_id: Uuid, edition_id: Uuid, qty: i32) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "INSERT INTO cart_items (id, user_id, edition_id, quantity, created_at) VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (user_id, edition_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
             RETURNING {CART_COLS}"
        ))
        .bind(Uuid::now_v7()).bind(user_id).bind(edition_id).bind(qty)
        .fetch_one(&mut *self.tx).await?;
        Ok(row.into())
    }

    async fn set_cart_quantity(&mut self, id: Uuid, qty: i32) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!("UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING {CART_COLS}"))
            .bind(id).bind(qty).fetch_optional(&mut *self.tx).await?;
        Ok(row.map(Into::into))
    }

    async fn delete_cart_item(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("DELETE FROM cart_items WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_cart_item_for(&mut self, user_id: Uuid, edition_id: Uuid) -> Result<u64, RepositoryError> {
        let res = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND edition_id = $2")
            .bind(user_id).bind(edition_id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected())
    }

    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let res = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected())
    }

    async fn insert_cancellation(&mut self, order_id: Uuid, user_id: Uuid, reason: &str) -> Result<CancellationRequest, RepositoryError> {
        let row = sqlx::query_as::<_, CancellationRow>(&format!(
            "INSERT INTO cancellation_requests (id, order_id, user_id, reason, decision, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {CANCELLATION_COLS}"
        ))
        .bind(Uuid::now_v7()).bind(order_id).bind(user_id).bind(reason).bind(i16::from(Decision::Pending))
        .fetch_one(&mut *self.tx).await?;
        row.try_into()
    }

    async fn find_cancellation(&mut self, id: Uuid) -> Result<Option<CancellationRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, CancellationRow>(&format!("SELECT {CANCELLATION_COLS} FROM cancellation_requests WHERE id = $1"))
            .bind(id).fetch_optional(&mut *self.tx).await?;
        row.map(CancellationRequest::try_from).transpose()
    }

    async fn update_cancellation(&mut self, req: &CancellationRequest) -> Result<CancellationRequest, RepositoryError> {
        let row = sqlx::query_as::<_, CancellationRow>(&format!(
            "UPDATE cancellation_requests SET reason = $2, decision = $3, reply_content = $4, reply_at = $5 \
             WHERE id = $1 RETURNING {CANCELLATION_COLS}"
        ))
        .bind(req.id).bind(&req.reason).bind(i16::from(req.decision)).bind(&req.reply_content).bind(req.reply_at)
        .fetch_optional(&mut *self.tx).await?;
        row.ok_or(RepositoryError::NotFound("cancellation request"))?.try_into()
    }

    async fn delete_cancellation(&mut self, id: Uuid) -> Result<bool, RepositoryError> {
        let res = sqlx::query("DELETE FROM cancellation_requests WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_cancellations(&mut self, filter: &CancellationFilter) -> Result<i64, RepositoryError> {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM cancellation_requests WHERE {CANCELLATION_FILTER}"))
            .bind(filter.user_id).fetch_one(&mut *self.tx).await?;
        Ok(n)
    }

    async fn list_cancellations(&mut self, filter: &CancellationFilter, offset: i64, limit: i64) -> Result<Vec<CancellationRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, CancellationRow>(&format!(
            "SELECT {CANCELLATION_COLS} FROM cancellation_requests WHERE {CANCELLATION_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(filter.user_id).bind(limit).bind(offset)
        .fetch_all(&mut *self.tx).await?;
        rows.into_iter().map(CancellationRequest::try_from).collect()
    }

    async fn count_catalog(&mut self) -> Result<CatalogCounts, RepositoryError> {
        let (categories, comics, users): (i64, i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM categories), (SELECT COUNT(*) FROM comics), (SELECT COUNT(*) FROM users)",
        )
        .fetch_one(&mut *self.tx).await?;
        Ok(CatalogCounts { categories, comics, users })
    }

    async fn list_sales(&mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Sale>, RepositoryError> {
        let rows = sqlx::query_as::<_, SaleRow>(
            "SELECT total, created_at FROM orders WHERE status = $1 AND created_at >= $2 AND created_at < $3 ORDER BY created_at",
        )
        .bind(OrderStatus::Success.as_str()).bind(from).bind(until)
        .fetch_all(&mut *self.tx).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
