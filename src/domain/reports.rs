//! Report value objects produced by aggregation.
//!
//! These have no identity and no persistence; every request recomputes them
//! from the store. Serialized camelCase for the admin frontends.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One calendar day of sales activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub date: NaiveDate,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub total_customers: i64,
    pub average_order_value: Decimal,
}

/// Stock position of a single product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub stock_quantity: i32,
    pub threshold: i32,
    pub is_low_stock: bool,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAnalytics {
    pub category: String,
    pub total_products: i64,
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub average_price: Decimal,
    pub total_stock: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub total_customers: i64,
    pub low_stock_count: i64,
    pub total_products: i64,
    pub top_category: Option<CategoryAnalytics>,
}

/// Admin-facing counters. Note the low-stock threshold here is 20, not the
/// reporting threshold of 30; both are preserved from the existing dashboards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_users: i64,
    pub total_orders: i64,
    pub today_orders: i64,
    pub total_revenue: Decimal,
    pub today_revenue: Decimal,
    pub low_stock_products: i64,
    pub out_of_stock_products: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularProduct {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: Option<String>,
    pub view_count: i64,
    pub sales_count: i64,
    pub revenue: Decimal,
}
