//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! This module provides the main server setup function that creates the Axum
//! router, registers all routes, applies middleware, and starts the HTTP
//! server.

// region: --- Imports
use crate::handlers;
use crate::middleware::{log_requests, require_auth, stamp_req};
use crate::services::{ActionGate, AssetService, BalanceFeed};
use axum::{
    routing::{get, post},
    Router,
};
use lib_core::config::{core_config, init_config};
use lib_core::{create_pool, Config, DbPool};
use lib_tools::{AnalystClient, MarketHttpClient, NewsClient};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub gate: ActionGate,
    pub assets: AssetService,
    pub market: Arc<MarketHttpClient>,
    pub news: Arc<NewsClient>,
    pub analyst: Arc<AnalystClient>,
    pub feed: BalanceFeed,
}

impl axum::extract::FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for ActionGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

impl axum::extract::FromRef<AppState> for AssetService {
    fn from_ref(state: &AppState) -> Self {
        state.assets.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<MarketHttpClient> {
    fn from_ref(state: &AppState) -> Self {
        state.market.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<NewsClient> {
    fn from_ref(state: &AppState) -> Self {
        state.news.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<AnalystClient> {
    fn from_ref(state: &AppState) -> Self {
        state.analyst.clone()
    }
}

impl axum::extract::FromRef<AppState> for BalanceFeed {
    fn from_ref(state: &AppState) -> Self {
        state.feed.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
    /// Database migrations path
    pub migrations_path: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            migrations_path: "./migrations",
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading fails
/// - Database connection or migrations fail
/// - HTTP client construction fails
/// - Server binding fails
pub async fn start_server(server_config: ServerConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    info!("COINFORGE BACKEND STARTING");

    dotenvy::dotenv().ok();

    info!("Loading configuration...");
    init_config().map_err(|e| anyhow::anyhow!(e))?;
    let config = core_config().clone();

    // Ensure data directory exists for SQLite database
    if let Some(db_path) = config.database_url.strip_prefix("sqlite:") {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created database directory: {:?}", parent);
            }
        }
    }

    info!("Connecting to database...");
    let pool = create_pool().await?;

    info!(
        "Running database migrations from: {}",
        server_config.migrations_path
    );
    let migrator =
        sqlx::migrate::Migrator::new(std::path::Path::new(server_config.migrations_path)).await?;
    migrator.run(&pool).await?;
    info!("Migrations complete");

    info!("Initializing clients...");
    let market = Arc::new(MarketHttpClient::new(
        config.market_api_base.clone(),
        config.quote_suffix.clone(),
    )?);
    let news = Arc::new(NewsClient::new(
        config.news_api_base.clone(),
        config.news_api_key.clone(),
        config.news_fallback_base.clone(),
    )?);
    let analyst = Arc::new(AnalystClient::new(
        config.llm_api_base.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    )?);

    let feed = BalanceFeed::default();
    let state = AppState {
        gate: ActionGate::new(pool.clone(), feed.clone()),
        assets: AssetService::new(config.asset_store_dir.clone()),
        market,
        news,
        analyst,
        feed,
        db: pool,
        config,
    };

    let app = create_router(state, server_config.allowed_origins.clone());

    let listener = tokio::net::TcpListener::bind(&server_config.bind_address).await?;

    info!("SERVER READY: http://{}", server_config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the main application router with all routes
pub fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    use axum::http::{HeaderValue, Method};

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    info!("[ROUTE SETUP] Registering HTTP routes...");

    // Paid and account-scoped routes require a valid session
    let protected = Router::new()
        .route("/api/coins/balance", get(handlers::coins::get_balance))
        .route("/api/coins/purchase", post(handlers::coins::purchase))
        .route("/api/tools/resize", post(handlers::tools::resize))
        .route(
            "/api/tools/remove-background",
            post(handlers::tools::remove_background),
        )
        .route(
            "/api/assets",
            get(handlers::assets::list_assets).post(handlers::assets::save_asset),
        )
        .route("/api/market/analysis", get(handlers::market::get_analysis))
        .route_layer(axum::middleware::from_fn(require_auth));

    let app = Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/coins/packages", get(handlers::coins::get_packages))
        .route("/api/market/candles", get(handlers::market::get_candles))
        .route("/api/market/ticker", get(handlers::market::get_ticker))
        .route("/api/market/news", get(handlers::market::get_news))
        .route("/api/ws/balance", get(handlers::ws::balance_websocket))
        .route("/assets/{file}", get(handlers::assets::serve_asset))
        .route("/health", get(|| async { "OK" }))
        .merge(protected)
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route");
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        // Request stamping (adds request ID) - must be first
        .layer(axum::middleware::from_fn(stamp_req))
        // Request/response logging
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<crate::middleware::mw_req_stamp::RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                },
            ),
        )
        .layer(cors);

    app
}

/// Log server information
fn log_server_info() {
    info!("AUTH:");
    info!("   • POST /api/auth/signup");
    info!("   • POST /api/auth/login");
    info!("COINS:");
    info!("   • GET  /api/coins/balance");
    info!("   • GET  /api/coins/packages");
    info!("   • POST /api/coins/purchase");
    info!("   • GET  /api/ws/balance?token={{jwt}}");
    info!("TOOLS:");
    info!("   • POST /api/tools/resize");
    info!("   • POST /api/tools/remove-background");
    info!("ASSETS:");
    info!("   • GET  /api/assets?limit=50");
    info!("   • POST /api/assets");
    info!("   • GET  /assets/{{file}}");
    info!("MARKET:");
    info!("   • GET  /api/market/candles?symbol=BTC&interval=1h&limit=100");
    info!("   • GET  /api/market/ticker?symbol=BTC");
    info!("   • GET  /api/market/news?query=bitcoin&limit=10");
    info!("   • GET  /api/market/analysis?symbol=BTC");
    info!("HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
