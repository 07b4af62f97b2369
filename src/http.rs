//! HTTP surface: routing, request validation, and the response envelope.
//!
//! Handlers validate primitive inputs, call the engines, and shape results
//! into the `{success, message, data}` envelope. Business-rule failures map
//! to 4xx; storage failures are logged and map to a generic 500.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::admin::AdminService;
use crate::cart::CartEngine;
use crate::domain::reports::{
    CategoryAnalytics, DashboardStats, DashboardSummary, InventoryReport, PopularProduct,
    SalesReport,
};
use crate::domain::{Cart, Product};
use crate::error::Error;
use crate::reporting::ReportingAggregator;

#[derive(Clone)]
pub struct AppState {
    pub cart: CartEngine,
    pub reports: ReportingAggregator,
    pub admin: AdminService,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Error::InsufficientStock(m) | Error::InvalidInput(m) => {
                (StatusCode::BAD_REQUEST, m.clone())
            }
            Error::InvalidOwnership(m) => (StatusCode::FORBIDDEN, m.clone()),
            Error::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            Error::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/cart/:user_id", get(get_cart))
        .route("/api/cart/:user_id/add", post(add_to_cart))
        .route("/api/cart/:user_id/update", put(update_cart_item))
        .route("/api/cart/:user_id/remove/:item_id", delete(remove_from_cart))
        .route("/api/cart/:user_id/clear", delete(clear_cart))
        .route("/api/reports/sales", get(sales_report))
        .route("/api/reports/inventory", get(inventory_report))
        .route("/api/reports/inventory/low-stock", get(low_stock_alerts))
        .route("/api/reports/analytics/category", get(category_analytics))
        .route("/api/reports/dashboard-summary", get(dashboard_summary))
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/dashboard", get(admin_dashboard))
        .route("/api/admin/products/popular", get(popular_products))
        .route("/api/admin/products/new", get(new_products))
        .route("/api/products/:product_id/view", post(track_view))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "service": "storefront"}))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: i32,
}

async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Cart>>, Error> {
    let cart = state.cart.get_or_create_cart(user_id).await?;
    Ok(Json(ApiResponse::data(cart)))
}

async fn add_to_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<Cart>>, Error> {
    req.validate()
        .map_err(|e| Error::InvalidInput(e.to_string()))?;
    let cart = state
        .cart
        .add_item(user_id, req.product_id, req.quantity)
        .await?;
    Ok(Json(ApiResponse::data(cart)))
}

async fn update_cart_item(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<ApiResponse<Cart>>, Error> {
    req.validate()
        .map_err(|e| Error::InvalidInput(e.to_string()))?;
    let cart = state
        .cart
        .update_item(user_id, req.product_id, req.quantity)
        .await?;
    Ok(Json(ApiResponse::data(cart)))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Cart>>, Error> {
    let cart = state.cart.remove_item(user_id, item_id).await?;
    Ok(Json(ApiResponse::data(cart)))
}

async fn clear_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, Error> {
    state.cart.clear_cart(user_id).await?;
    Ok(Json(ApiResponse::message("Cart cleared")))
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRangeParams {
    /// Fills missing bounds with a trailing window ending today.
    fn or_trailing_days(self, days: i64) -> (NaiveDate, NaiveDate) {
        let today = Utc::now().date_naive();
        (
            self.start_date.unwrap_or(today - Duration::days(days)),
            self.end_date.unwrap_or(today),
        )
    }
}

async fn sales_report(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<ApiResponse<Vec<SalesReport>>>, Error> {
    let (start, end) = params.or_trailing_days(30);
    let report = state.reports.sales_report(start, end).await?;
    Ok(Json(ApiResponse::data(report)))
}

async fn inventory_report(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InventoryReport>>>, Error> {
    Ok(Json(ApiResponse::data(
        state.reports.inventory_report().await?,
    )))
}

async fn low_stock_alerts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InventoryReport>>>, Error> {
    Ok(Json(ApiResponse::data(
        state.reports.low_stock_alerts().await?,
    )))
}

async fn category_analytics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryAnalytics>>>, Error> {
    Ok(Json(ApiResponse::data(
        state.reports.category_analytics().await?,
    )))
}

async fn dashboard_summary(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<ApiResponse<DashboardSummary>>, Error> {
    let (start, end) = params.or_trailing_days(7);
    let summary = state.reports.dashboard_summary(start, end).await?;
    Ok(Json(ApiResponse::data(summary)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, Error> {
    req.validate()
        .map_err(|e| Error::InvalidInput(e.to_string()))?;
    let user = state.admin.login(&req.username, &req.password).await?;
    Ok(Json(ApiResponse::data(LoginResponse {
        id: user.id,
        username: user.username,
        role: user.role,
    })))
}

async fn admin_dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardStats>>, Error> {
    Ok(Json(ApiResponse::data(state.admin.dashboard_stats().await?)))
}

async fn popular_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PopularProduct>>>, Error> {
    Ok(Json(ApiResponse::data(
        state.admin.weekly_popular_products().await?,
    )))
}

async fn new_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>, Error> {
    Ok(Json(ApiResponse::data(
        state.admin.weekly_new_products().await?,
    )))
}

#[derive(Debug, Deserialize)]
pub struct TrackViewParams {
    pub user_id: Option<Uuid>,
}

async fn track_view(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(params): Query<TrackViewParams>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, Error> {
    let ip = client_ip(&headers);
    state
        .admin
        .track_product_view(product_id, params.user_id, ip)
        .await?;
    Ok(Json(ApiResponse::message("View recorded")))
}

/// First hop of `x-forwarded-for`, when present.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_mapping() {
        let cases = [
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                Error::InsufficientStock("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (Error::InvalidOwnership("x".into()), StatusCode::FORBIDDEN),
            (Error::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn client_ip_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 192.168.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.1"));
        assert!(client_ip(&HeaderMap::new()).is_none());
    }

    #[test]
    fn add_request_rejects_non_positive_quantity() {
        let req = AddToCartRequest {
            product_id: Uuid::now_v7(),
            quantity: 0,
        };
        assert!(req.validate().is_err());
        let req = AddToCartRequest {
            product_id: Uuid::now_v7(),
            quantity: 1,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn update_request_allows_zero_but_not_negative() {
        let ok = UpdateCartItemRequest {
            product_id: Uuid::now_v7(),
            quantity: 0,
        };
        assert!(ok.validate().is_ok());
        let bad = UpdateCartItemRequest {
            product_id: Uuid::now_v7(),
            quantity: -1,
        };
        assert!(bad.validate().is_err());
    }
}
