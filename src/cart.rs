//! Cart engine: stock-checked cart mutations.
//!
//! Invariants owned here: at most one cart per user (created lazily), at most
//! one line item per (cart, product). Every mutating operation runs inside a
//! single store transaction and returns the cart re-read after the write, so
//! the response always reflects exactly what persisted.
//!
//! Stock is validated but never reserved or decremented: two concurrent adds
//! can both pass the check and jointly oversell. That race exists in the
//! store-level design and is deliberately not hidden here; a stronger
//! guarantee would need a conditional decrement at the store layer.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Cart, CartItem};
use crate::error::{Error, Result};
use crate::store::{CartStore, CartTx};

#[derive(Clone)]
pub struct CartEngine {
    store: Arc<dyn CartStore>,
}

impl CartEngine {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    /// Returns the user's cart with items loaded, creating an empty cart on
    /// first access. Fails with `NotFound` if the user does not exist.
    pub async fn get_or_create_cart(&self, user_id: Uuid) -> Result<Cart> {
        let mut tx = self.store.begin().await?;
        let cart = self.ensure_cart(&mut *tx, user_id).await?;
        let cart = tx.load_cart(cart.id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Adds `quantity` of a product to the user's cart, merging into an
    /// existing line item for the same product.
    ///
    /// The sign of `quantity` is the caller's responsibility (the HTTP layer
    /// rejects non-positive values); this engine only guards against stock.
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Cart> {
        let mut tx = self.store.begin().await?;
        let cart = self.ensure_cart(&mut *tx, user_id).await?;

        let product = tx
            .find_product(product_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Product not found with id: {product_id}")))?;

        if product.stock_quantity < quantity {
            return Err(Error::InsufficientStock(format!(
                "Insufficient stock. Only {} items available",
                product.stock_quantity
            )));
        }

        match tx
            .find_item_by_cart_and_product(cart.id, product_id)
            .await?
        {
            Some(mut item) => {
                let new_quantity = item.quantity + quantity;
                if product.stock_quantity < new_quantity {
                    return Err(Error::InsufficientStock(format!(
                        "Cannot add {} more. Only {} more items available",
                        quantity,
                        product.stock_quantity - item.quantity
                    )));
                }
                item.quantity = new_quantity;
                tx.save_item(&item).await?;
                tracing::debug!(cart_id = %cart.id, product_id = %product_id, new_quantity, "merged cart item");
            }
            None => {
                // Price snapshot: captured now, never re-read on later updates.
                let item = CartItem::new(cart.id, &product, quantity);
                tx.save_item(&item).await?;
                tracing::debug!(cart_id = %cart.id, product_id = %product_id, quantity, "added cart item");
            }
        }

        let cart = tx.load_cart(cart.id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Overwrites the quantity of the line item for `product_id`. A quantity
    /// of zero (or below) deletes the item. The snapshotted price is kept.
    pub async fn update_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Cart> {
        let mut tx = self.store.begin().await?;
        let cart = self.ensure_cart(&mut *tx, user_id).await?;

        let mut item = tx
            .find_item_by_cart_and_product(cart.id, product_id)
            .await?
            .ok_or_else(|| Error::NotFound("Item not found in cart".to_string()))?;

        if quantity <= 0 {
            tx.delete_item(item.id).await?;
            tracing::debug!(cart_id = %cart.id, product_id = %product_id, "removed cart item on zero quantity");
        } else {
            let product = tx.find_product(item.product_id).await?.ok_or_else(|| {
                Error::NotFound(format!("Product not found with id: {}", item.product_id))
            })?;
            if product.stock_quantity < quantity {
                return Err(Error::InsufficientStock(format!(
                    "Insufficient stock. Only {} items available",
                    product.stock_quantity
                )));
            }
            item.quantity = quantity;
            tx.save_item(&item).await?;
        }

        let cart = tx.load_cart(cart.id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Removes a line item by its own id. Fails with `InvalidOwnership` when
    /// the item belongs to another user's cart.
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<Cart> {
        let mut tx = self.store.begin().await?;
        let cart = self.ensure_cart(&mut *tx, user_id).await?;

        let item = tx
            .find_item(item_id)
            .await?
            .ok_or_else(|| Error::NotFound("Cart item not found".to_string()))?;

        if item.cart_id != cart.id {
            return Err(Error::InvalidOwnership(
                "Item does not belong to this cart".to_string(),
            ));
        }

        tx.delete_item(item.id).await?;
        let cart = tx.load_cart(cart.id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Deletes every line item in the user's cart. Idempotent.
    pub async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let cart = self.ensure_cart(&mut *tx, user_id).await?;
        tx.delete_items_in_cart(cart.id).await?;
        tx.commit().await?;
        tracing::debug!(cart_id = %cart.id, "cleared cart");
        Ok(())
    }

    async fn ensure_cart(&self, tx: &mut dyn CartTx, user_id: Uuid) -> Result<Cart> {
        if let Some(cart) = tx.find_cart_by_user(user_id).await? {
            return Ok(cart);
        }
        tx.find_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User not found with id: {user_id}")))?;
        let cart = Cart::new(user_id);
        tx.insert_cart(&cart).await?;
        tracing::info!(user_id = %user_id, cart_id = %cart.id, "created new cart");
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Product, User};
    use crate::store::memory::MemoryStore;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn engine(store: &MemoryStore) -> CartEngine {
        CartEngine::new(Arc::new(store.clone()))
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        let user = User {
            id: Uuid::now_v7(),
            username: name.into(),
            password: "secret".into(),
            role: "CUSTOMER".into(),
            created_at: Utc::now(),
        };
        store.put_user(user.clone()).await;
        user
    }

    async fn seed_product(store: &MemoryStore, stock: i32, price: Decimal) -> Product {
        let product = Product {
            id: Uuid::now_v7(),
            name: "Widget".into(),
            description: None,
            price,
            stock_quantity: stock,
            category: "Tools".into(),
            image_url: None,
            created_at: Utc::now(),
        };
        store.put_product(product.clone()).await;
        product
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let engine = engine(&store);

        let first = engine.get_or_create_cart(user.id).await.unwrap();
        let second = engine.get_or_create_cart(user.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn get_or_create_unknown_user_fails() {
        let store = MemoryStore::new();
        let engine = engine(&store);

        let err = engine.get_or_create_cart(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn add_merges_quantity_and_keeps_price_snapshot() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 10, Decimal::new(999, 2)).await;
        let engine = engine(&store);

        engine.add_item(user.id, product.id, 4).await.unwrap();
        let cart = engine.add_item(user.id, product.id, 4).await.unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0].quantity, 8);
        assert_eq!(cart.items[0].price, Decimal::new(999, 2));
    }

    #[tokio::test]
    async fn add_rejects_quantity_over_stock() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 5, Decimal::ONE).await;
        let engine = engine(&store);

        let err = engine.add_item(user.id, product.id, 6).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientStock(_)));
        assert_eq!(
            err.to_string(),
            "Insufficient stock. Only 5 items available"
        );
        assert!(store.all_items().await.is_empty());
    }

    #[tokio::test]
    async fn merge_over_stock_leaves_existing_quantity() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 5, Decimal::ONE).await;
        let engine = engine(&store);

        engine.add_item(user.id, product.id, 3).await.unwrap();
        let err = engine.add_item(user.id, product.id, 3).await.unwrap_err();

        assert!(matches!(err, Error::InsufficientStock(_)));
        assert_eq!(
            err.to_string(),
            "Cannot add 3 more. Only 2 more items available"
        );
        let items = store.all_items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[tokio::test]
    async fn add_unknown_product_fails() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let engine = engine(&store);

        let err = engine
            .add_item(user.id, Uuid::now_v7(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn update_to_zero_deletes_item() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 10, Decimal::ONE).await;
        let engine = engine(&store);

        let before = engine.add_item(user.id, product.id, 2).await.unwrap();
        assert_eq!(before.item_count(), 1);

        let after = engine.update_item(user.id, product.id, 0).await.unwrap();
        assert_eq!(after.item_count(), 0);
    }

    #[tokio::test]
    async fn update_rejects_quantity_over_stock() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 5, Decimal::ONE).await;
        let engine = engine(&store);

        engine.add_item(user.id, product.id, 2).await.unwrap();
        let err = engine
            .update_item(user.id, product.id, 6)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InsufficientStock(_)));
        assert_eq!(store.all_items().await[0].quantity, 2);
    }

    #[tokio::test]
    async fn update_missing_item_fails() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 5, Decimal::ONE).await;
        let engine = engine(&store);

        let err = engine
            .update_item(user.id, product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.to_string(), "Item not found in cart");
    }

    #[tokio::test]
    async fn update_does_not_resnapshot_price() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 10, Decimal::new(500, 2)).await;
        let engine = engine(&store);

        engine.add_item(user.id, product.id, 1).await.unwrap();
        let cart = engine.update_item(user.id, product.id, 3).await.unwrap();
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].price, Decimal::new(500, 2));
    }

    #[tokio::test]
    async fn remove_item_from_other_users_cart_fails() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let product = seed_product(&store, 10, Decimal::ONE).await;
        let engine = engine(&store);

        let alice_cart = engine.add_item(alice.id, product.id, 2).await.unwrap();
        let alice_item = alice_cart.items[0].clone();
        engine.add_item(bob.id, product.id, 1).await.unwrap();

        let err = engine.remove_item(bob.id, alice_item.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOwnership(_)));

        // Both carts unchanged.
        let items = store.all_items().await;
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|i| i.id == alice_item.id && i.quantity == 2));
    }

    #[tokio::test]
    async fn remove_unknown_item_fails() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let engine = engine(&store);

        let err = engine
            .remove_item(user.id, Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_item_shrinks_cart_by_one() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let p1 = seed_product(&store, 10, Decimal::ONE).await;
        let p2 = seed_product(&store, 10, Decimal::TWO).await;
        let engine = engine(&store);

        engine.add_item(user.id, p1.id, 1).await.unwrap();
        let cart = engine.add_item(user.id, p2.id, 1).await.unwrap();
        assert_eq!(cart.item_count(), 2);

        let target = cart.items[0].id;
        let after = engine.remove_item(user.id, target).await.unwrap();
        assert_eq!(after.item_count(), 1);
        assert!(after.items.iter().all(|i| i.id != target));
    }

    #[tokio::test]
    async fn clear_cart_is_idempotent() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let product = seed_product(&store, 10, Decimal::ONE).await;
        let engine = engine(&store);

        engine.add_item(user.id, product.id, 2).await.unwrap();
        engine.clear_cart(user.id).await.unwrap();
        engine.clear_cart(user.id).await.unwrap();

        let cart = engine.get_or_create_cart(user.id).await.unwrap();
        assert!(cart.is_empty());
    }
}
