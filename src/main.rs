//! Storefront - shopping cart and sales reporting service.

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use storefront::admin::AdminService;
use storefront::auth::PlaintextVerifier;
use storefront::cart::CartEngine;
use storefront::config::Config;
use storefront::http::{self, AppState};
use storefront::reporting::ReportingAggregator;
use storefront::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let store = Arc::new(PgStore::new(db));
    let state = AppState {
        cart: CartEngine::new(store.clone()),
        reports: ReportingAggregator::new(store.clone(), store.clone()),
        admin: AdminService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            Arc::new(PlaintextVerifier),
        ),
    };

    let app = http::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("storefront listening on {}", config.addr());
    axum::serve(tokio::net::TcpListener::bind(config.addr()).await?, app).await?;
    Ok(())
}
