//! Repository seams between the engines and the relational store.
//!
//! Cart mutations go through [`CartTx`], a per-operation transaction handle:
//! the engine does all of its reads and writes against one handle and calls
//! `commit` at the end. Dropping the handle without committing discards the
//! writes, so a business-rule failure mid-operation never persists partially.
//!
//! Read-side traits ([`OrderStore`], [`ProductStore`], ...) are plain
//! repositories; the aggregators never mutate through them.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Cart, CartItem, Order, Product, ProductView, SalesStatistics, User};
use crate::error::Result;

/// Entry point for transactional cart mutations.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn CartTx>>;
}

/// One all-or-nothing transaction scoped to a single cart operation.
#[async_trait]
pub trait CartTx: Send {
    async fn find_cart_by_user(&mut self, user_id: Uuid) -> Result<Option<Cart>>;
    async fn insert_cart(&mut self, cart: &Cart) -> Result<()>;
    async fn find_item_by_cart_and_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>>;
    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<CartItem>>;
    /// Inserts the item, or overwrites its quantity if the id already exists.
    async fn save_item(&mut self, item: &CartItem) -> Result<()>;
    async fn delete_item(&mut self, item_id: Uuid) -> Result<()>;
    async fn delete_items_in_cart(&mut self, cart_id: Uuid) -> Result<()>;
    async fn find_product(&mut self, product_id: Uuid) -> Result<Option<Product>>;
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>>;
    /// Re-reads the cart and its items as currently persisted in this
    /// transaction, items in insertion order.
    async fn load_cart(&mut self, cart_id: Uuid) -> Result<Cart>;
    async fn commit(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>>;
    async fn find_all(&self) -> Result<Vec<Product>>;
    async fn count(&self) -> Result<i64>;
    async fn count_stock_below(&self, threshold: i32) -> Result<i64>;
    async fn count_out_of_stock(&self) -> Result<i64>;
    async fn find_created_after(&self, since: DateTime<Utc>) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders created in the half-open window `[start, end)`.
    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>>;
    async fn count(&self) -> Result<i64>;
    async fn count_created_after(&self, since: DateTime<Utc>) -> Result<i64>;
    async fn total_revenue(&self) -> Result<Decimal>;
    async fn revenue_since(&self, since: DateTime<Utc>) -> Result<Decimal>;
}

#[async_trait]
pub trait ProductViewStore: Send + Sync {
    async fn record(&self, view: ProductView) -> Result<()>;
    async fn count_since(&self, product_id: Uuid, since: DateTime<Utc>) -> Result<i64>;
}

#[async_trait]
pub trait SalesStatisticsStore: Send + Sync {
    async fn find_by_product(&self, product_id: Uuid) -> Result<Option<SalesStatistics>>;
}
