//! In-memory store implementation for tests.
//!
//! Provides the same interfaces as the PostgreSQL implementation. Cart
//! transactions clone the state on `begin` and replace it on `commit`, so an
//! engine error path that drops the transaction leaves the store untouched,
//! matching the database rollback behavior.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{Cart, CartItem, Order, Product, ProductView, SalesStatistics, User};
use crate::error::{Error, Result};
use crate::store::{
    CartStore, CartTx, OrderStore, ProductStore, ProductViewStore, SalesStatisticsStore, UserStore,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    items: Vec<CartItem>,
    orders: Vec<Order>,
    views: Vec<ProductView>,
    stats: Vec<SalesStatistics>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_user(&self, user: User) {
        self.state.lock().await.users.push(user);
    }

    pub async fn put_product(&self, product: Product) {
        self.state.lock().await.products.push(product);
    }

    pub async fn put_order(&self, order: Order) {
        self.state.lock().await.orders.push(order);
    }

    pub async fn put_view(&self, view: ProductView) {
        self.state.lock().await.views.push(view);
    }

    pub async fn put_stats(&self, stats: SalesStatistics) {
        self.state.lock().await.stats.push(stats);
    }

    /// All persisted cart items, across every cart.
    pub async fn all_items(&self) -> Vec<CartItem> {
        self.state.lock().await.items.clone()
    }

    pub async fn all_views(&self) -> Vec<ProductView> {
        self.state.lock().await.views.clone()
    }
}

struct MemoryCartTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

fn assemble_cart(state: &MemoryState, cart_id: Uuid) -> Result<Cart> {
    let mut cart = state
        .carts
        .iter()
        .find(|c| c.id == cart_id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("Cart not found with id: {cart_id}")))?;
    let mut items: Vec<CartItem> = state
        .items
        .iter()
        .filter(|i| i.cart_id == cart_id)
        .cloned()
        .collect();
    items.sort_by_key(|i| i.created_at);
    cart.items = items;
    Ok(cart)
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn CartTx>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryCartTx { guard, work }))
    }
}

#[async_trait]
impl CartTx for MemoryCartTx {
    async fn find_cart_by_user(&mut self, user_id: Uuid) -> Result<Option<Cart>> {
        Ok(self
            .work
            .carts
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn insert_cart(&mut self, cart: &Cart) -> Result<()> {
        self.work.carts.push(cart.clone());
        Ok(())
    }

    async fn find_item_by_cart_and_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>> {
        Ok(self
            .work
            .items
            .iter()
            .find(|i| i.cart_id == cart_id && i.product_id == product_id)
            .cloned())
    }

    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<CartItem>> {
        Ok(self.work.items.iter().find(|i| i.id == item_id).cloned())
    }

    async fn save_item(&mut self, item: &CartItem) -> Result<()> {
        match self.work.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => self.work.items.push(item.clone()),
        }
        Ok(())
    }

    async fn delete_item(&mut self, item_id: Uuid) -> Result<()> {
        self.work.items.retain(|i| i.id != item_id);
        Ok(())
    }

    async fn delete_items_in_cart(&mut self, cart_id: Uuid) -> Result<()> {
        self.work.items.retain(|i| i.cart_id != cart_id);
        Ok(())
    }

    async fn find_product(&mut self, product_id: Uuid) -> Result<Option<Product>> {
        Ok(self
            .work
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned())
    }

    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.work.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn load_cart(&mut self, cart_id: Uuid) -> Result<Cart> {
        assemble_cart(&self.work, cart_id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryCartTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self
            .state
            .lock()
            .await
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        Ok(self.state.lock().await.products.clone())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.state.lock().await.products.len() as i64)
    }

    async fn count_stock_below(&self, threshold: i32) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .await
            .products
            .iter()
            .filter(|p| p.stock_quantity < threshold)
            .count() as i64)
    }

    async fn count_out_of_stock(&self) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .await
            .products
            .iter()
            .filter(|p| p.stock_quantity == 0)
            .count() as i64)
    }

    async fn find_created_after(&self, since: DateTime<Utc>) -> Result<Vec<Product>> {
        Ok(self
            .state
            .lock()
            .await
            .products
            .iter()
            .filter(|p| p.created_at > since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.state.lock().await.users.len() as i64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        Ok(self
            .state
            .lock()
            .await
            .orders
            .iter()
            .filter(|o| o.created_at >= start && o.created_at < end)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.state.lock().await.orders.len() as i64)
    }

    async fn count_created_after(&self, since: DateTime<Utc>) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .await
            .orders
            .iter()
            .filter(|o| o.created_at >= since)
            .count() as i64)
    }

    async fn total_revenue(&self) -> Result<Decimal> {
        Ok(self
            .state
            .lock()
            .await
            .orders
            .iter()
            .map(|o| o.total_amount)
            .sum())
    }

    async fn revenue_since(&self, since: DateTime<Utc>) -> Result<Decimal> {
        Ok(self
            .state
            .lock()
            .await
            .orders
            .iter()
            .filter(|o| o.created_at >= since)
            .map(|o| o.total_amount)
            .sum())
    }
}

#[async_trait]
impl ProductViewStore for MemoryStore {
    async fn record(&self, view: ProductView) -> Result<()> {
        self.state.lock().await.views.push(view);
        Ok(())
    }

    async fn count_since(&self, product_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .await
            .views
            .iter()
            .filter(|v| v.product_id == product_id && v.viewed_at > since)
            .count() as i64)
    }
}

#[async_trait]
impl SalesStatisticsStore for MemoryStore {
    async fn find_by_product(&self, product_id: Uuid) -> Result<Option<SalesStatistics>> {
        Ok(self
            .state
            .lock()
            .await
            .stats
            .iter()
            .find(|s| s.product_id == product_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            id: Uuid::now_v7(),
            username: name.into(),
            password: "secret".into(),
            role: "CUSTOMER".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn uncommitted_tx_is_discarded() {
        let store = MemoryStore::new();
        let u = user("alice");
        store.put_user(u.clone()).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_cart(&Cart::new(u.id)).await.unwrap();
            // dropped without commit
        }
        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_cart_by_user(u.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_tx_is_visible() {
        let store = MemoryStore::new();
        let u = user("bob");
        store.put_user(u.clone()).await;

        let cart = Cart::new(u.id);
        let mut tx = store.begin().await.unwrap();
        tx.insert_cart(&cart).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.find_cart_by_user(u.id).await.unwrap().unwrap();
        assert_eq!(found.id, cart.id);
    }
}
