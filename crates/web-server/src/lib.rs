use axum::{
    routing::{get, post},
    Router,
};
use database::{MarketRepository, PgRepository, SellerDirectory};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
///
/// Both fields are trait objects so tests (and alternative deployments) can
/// inject the in-memory repository instead of PostgreSQL.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn MarketRepository>,
    pub directory: Arc<dyn SellerDirectory>,
}

/// Builds the application router over the given state. Kept separate from
/// [`run_server`] so endpoint tests can drive the router directly.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/market/price-estimate", get(handlers::price_estimate))
        .route("/market/analysis", get(handlers::market_analysis))
        .route("/seller/metrics/:seller_id", get(handlers::seller_metrics))
        .route("/seller/metrics/:seller_id/view", post(handlers::record_view))
        .route(
            "/seller/metrics/:seller_id/inquiry",
            post(handlers::record_inquiry),
        )
        .route("/seller/metrics/:seller_id/sale", post(handlers::record_sale))
        .route("/seller/:seller_id/insights", get(handlers::seller_insights))
        .with_state(state)
}

/// The main function to configure and run the web server.
pub async fn run_server(
    addr: SocketAddr,
    settings: &configuration::Database,
) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let db_pool = database::connect(
        settings.max_connections,
        Duration::from_secs(settings.acquire_timeout_secs),
    )
    .await?;
    database::run_migrations(&db_pool).await?;
    let repo = Arc::new(PgRepository::new(db_pool));

    let app_state = Arc::new(AppState {
        repo: repo.clone(),
        directory: repo,
    });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    let app = router(app_state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http());

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
