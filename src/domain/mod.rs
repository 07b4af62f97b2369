//! Persistent entities backed by the relational store.

pub mod reports;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user's cart with its line items loaded.
///
/// Exactly one cart exists per user; it is created lazily on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum()
    }
}

/// A line item: (product, quantity, price snapshotted at add time).
///
/// Unique per (cart, product); re-adding the same product merges quantities.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new line item, capturing the product's current price.
    /// The price is not re-read on later quantity changes.
    pub fn new(cart_id: Uuid, product: &Product, quantity: i32) -> Self {
        Self {
            id: Uuid::now_v7(),
            cart_id,
            product_id: product.id,
            quantity,
            price: product.price,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub viewed_at: DateTime<Utc>,
}

impl ProductView {
    pub fn new(product_id: Uuid, user_id: Option<Uuid>, ip_address: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            product_id,
            user_id,
            ip_address,
            viewed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SalesStatistics {
    pub product_id: Uuid,
    pub quantity_sold: i64,
    pub total_revenue: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: Decimal) -> Product {
        Product {
            id: Uuid::now_v7(),
            name: "Widget".into(),
            description: None,
            price,
            stock_quantity: 10,
            category: "Tools".into(),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cart_subtotal_uses_snapshotted_prices() {
        let mut cart = Cart::new(Uuid::now_v7());
        let p = product(Decimal::new(1050, 2));
        cart.items.push(CartItem::new(cart.id, &p, 2));
        assert_eq!(cart.subtotal(), Decimal::new(2100, 2));
        assert_eq!(cart.item_count(), 1);
        assert!(!cart.is_empty());
    }
}
