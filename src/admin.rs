//! Admin operations: login, dashboard counters, popularity analytics, and
//! product-view tracking.

use std::sync::Arc;

use chrono::{Duration, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::CredentialVerifier;
use crate::domain::reports::{DashboardStats, PopularProduct};
use crate::domain::{Product, ProductView, User};
use crate::error::{Error, Result};
use crate::store::{OrderStore, ProductStore, ProductViewStore, SalesStatisticsStore, UserStore};

/// Dashboard low-stock threshold; the reporting side uses 30 instead.
const DASHBOARD_LOW_STOCK: i32 = 20;

#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UserStore>,
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    views: Arc<dyn ProductViewStore>,
    sales: Arc<dyn SalesStatisticsStore>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        views: Arc<dyn ProductViewStore>,
        sales: Arc<dyn SalesStatisticsStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            users,
            products,
            orders,
            views,
            sales,
            verifier,
        }
    }

    /// Verifies credentials and requires the ADMIN role. Lookup and password
    /// failures return the same message so usernames cannot be probed.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid credentials".to_string()))?;

        if !self.verifier.verify(password, &user.password) {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }
        if !user.is_admin() {
            return Err(Error::Unauthorized(
                "Access denied. Admin privileges required.".to_string(),
            ));
        }
        tracing::info!(username = %user.username, "admin login");
        Ok(user)
    }

    /// Store-wide counters plus today's activity (midnight UTC boundary).
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let start_of_day = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        Ok(DashboardStats {
            total_products: self.products.count().await?,
            total_users: self.users.count().await?,
            total_orders: self.orders.count().await?,
            today_orders: self.orders.count_created_after(start_of_day).await?,
            total_revenue: self.orders.total_revenue().await?,
            today_revenue: self.orders.revenue_since(start_of_day).await?,
            low_stock_products: self.products.count_stock_below(DASHBOARD_LOW_STOCK).await?,
            out_of_stock_products: self.products.count_out_of_stock().await?,
        })
    }

    /// Top 10 products by view count over the trailing seven days, with
    /// sales statistics attached (zeros when none are recorded).
    pub async fn weekly_popular_products(&self) -> Result<Vec<PopularProduct>> {
        let week_ago = Utc::now() - Duration::days(7);
        let mut out = Vec::new();
        for product in self.products.find_all().await? {
            let view_count = self.views.count_since(product.id, week_ago).await?;
            let (sales_count, revenue) = match self.sales.find_by_product(product.id).await? {
                Some(s) => (s.quantity_sold, s.total_revenue),
                None => (0, Decimal::ZERO),
            };
            out.push(PopularProduct {
                id: product.id,
                name: product.name,
                price: product.price,
                category: product.category,
                image_url: product.image_url,
                view_count,
                sales_count,
                revenue,
            });
        }
        out.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        out.truncate(10);
        Ok(out)
    }

    /// Products created in the trailing seven days.
    pub async fn weekly_new_products(&self) -> Result<Vec<Product>> {
        let week_ago = Utc::now() - Duration::days(7);
        self.products.find_created_after(week_ago).await
    }

    /// Records a product view. The product must exist; an unknown user id
    /// degrades to an anonymous view rather than failing.
    pub async fn track_product_view(
        &self,
        product_id: Uuid,
        user_id: Option<Uuid>,
        ip_address: Option<String>,
    ) -> Result<()> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Product not found with id: {product_id}")))?;

        let user_id = match user_id {
            Some(id) => self.users.find_by_id(id).await?.map(|u| u.id),
            None => None,
        };
        self.views
            .record(ProductView::new(product.id, user_id, ip_address))
            .await
    }
}
