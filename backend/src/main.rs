//! Inventory Management Platform - Backend Server
//!
//! Multi-tenant inventory backend: companies, products priced in USD/EUR/COP,
//! stock records, and AI-assisted stock-risk alerts.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;

use external::{ExchangeRateClient, GeminiClient, HttpMailer, Mailer, TextGenerator};
use services::{CurrencyService, TokenService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub currency: CurrencyService,
    /// `None` when no AI key is configured
    pub generator: Option<Arc<dyn TextGenerator>>,
    /// `None` when mail delivery is not configured
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    /// Wire clients from configuration
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        let generator = GeminiClient::from_config(&config.ai)
            .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
        let mailer = HttpMailer::from_config(&config.mail)
            .map(|client| Arc::new(client) as Arc<dyn Mailer>);
        let rates = ExchangeRateClient::from_config(&config.exchange_rates);

        if generator.is_none() {
            tracing::warn!("AI API key not configured, predictions use stock rules only");
        }
        if mailer.is_none() {
            tracing::warn!("Mail API not configured, alert and export emails are disabled");
        }

        Self {
            db,
            tokens: TokenService::new(&config.jwt),
            currency: CurrencyService::new(Arc::new(rates)),
            generator,
            mailer,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ims_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Inventory Management Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let state = AppState::new(db_pool, config);

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Inventory Management Platform API v1.0"
}
