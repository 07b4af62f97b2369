//! PostgreSQL store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Cart, CartItem, Order, Product, ProductView, SalesStatistics, User};
use crate::error::{Error, Result};
use crate::store::{
    CartStore, CartTx, OrderStore, ProductStore, ProductViewStore, SalesStatisticsStore, UserStore,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PgCartTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CartStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn CartTx>> {
        Ok(Box::new(PgCartTx {
            tx: self.pool.begin().await?,
        }))
    }
}

#[async_trait]
impl CartTx for PgCartTx {
    async fn find_cart_by_user(&mut self, user_id: Uuid) -> Result<Option<Cart>> {
        let row: Option<(Uuid, Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, user_id, created_at FROM carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(row.map(|(id, user_id, created_at)| Cart {
            id,
            user_id,
            items: Vec::new(),
            created_at,
        }))
    }

    async fn insert_cart(&mut self, cart: &Cart) -> Result<()> {
        sqlx::query("INSERT INTO carts (id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(cart.id)
            .bind(cart.user_id)
            .bind(cart.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_item_by_cart_and_product(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>> {
        Ok(sqlx::query_as::<_, CartItem>(
            "SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn find_item(&mut self, item_id: Uuid) -> Result<Option<CartItem>> {
        Ok(
            sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE id = $1")
                .bind(item_id)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn save_item(&mut self, item: &CartItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO cart_items (id, cart_id, product_id, quantity, price, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(item.id)
        .bind(item.cart_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_item(&mut self, item_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_items_in_cart(&mut self, cart_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_product(&mut self, product_id: Uuid) -> Result<Option<Product>> {
        Ok(
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn load_cart(&mut self, cart_id: Uuid) -> Result<Cart> {
        let row: Option<(Uuid, Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, user_id, created_at FROM carts WHERE id = $1")
                .bind(cart_id)
                .fetch_optional(&mut *self.tx)
                .await?;
        let (id, user_id, created_at) = row
            .ok_or_else(|| Error::NotFound(format!("Cart not found with id: {cart_id}")))?;
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at",
        )
        .bind(cart_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(Cart {
            id,
            user_id,
            items,
            created_at,
        })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        Ok(
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn count(&self) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn count_stock_below(&self, threshold: i32) -> Result<i64> {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE stock_quantity < $1")
                .bind(threshold)
                .fetch_one(&self.pool)
                .await?;
        Ok(n)
    }

    async fn count_out_of_stock(&self) -> Result<i64> {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE stock_quantity = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(n)
    }

    async fn find_created_after(&self, since: DateTime<Utc>) -> Result<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE created_at > $1 ORDER BY created_at DESC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn count(&self) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        Ok(sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn count_created_after(&self, since: DateTime<Utc>) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn total_revenue(&self) -> Result<Decimal> {
        let (total,): (Decimal,) =
            sqlx::query_as("SELECT COALESCE(SUM(total_amount), 0) FROM orders")
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn revenue_since(&self, since: DateTime<Utc>) -> Result<Decimal> {
        let (total,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

#[async_trait]
impl ProductViewStore for PgStore {
    async fn record(&self, view: ProductView) -> Result<()> {
        sqlx::query(
            "INSERT INTO product_views (id, product_id, user_id, ip_address, viewed_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(view.id)
        .bind(view.product_id)
        .bind(view.user_id)
        .bind(view.ip_address)
        .bind(view.viewed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_since(&self, product_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM product_views WHERE product_id = $1 AND viewed_at > $2",
        )
        .bind(product_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(n)
    }
}

#[async_trait]
impl SalesStatisticsStore for PgStore {
    async fn find_by_product(&self, product_id: Uuid) -> Result<Option<SalesStatistics>> {
        Ok(sqlx::query_as::<_, SalesStatistics>(
            "SELECT * FROM sales_statistics WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
