use axum::{
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use churn_api::config::Config;
use churn_api::db::Database;
use churn_api::handlers::{self, AppState};
use churn_api::manifest::ColumnManifest;
use churn_api::model::OnnxChurnModel;
use churn_api::scorer::Scorer;
use churn_api::services::PredictionService;

/// Load the model artifact and column manifest into a scorer.
///
/// Both artifacts are opaque blobs written by the offline training
/// pipeline; they are read once here and held immutably for the process
/// lifetime.
fn load_scorer(config: &Config) -> anyhow::Result<Scorer> {
    let manifest = ColumnManifest::load(&config.column_manifest_path)?;
    let model = OnnxChurnModel::load(&config.model_path)?;
    Ok(Scorer::new(Arc::new(model), manifest))
}

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool, and the model
/// artifacts, then starts the Axum server. A missing model is not fatal:
/// the service starts and reports 503 on prediction routes until restarted
/// with valid artifacts.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Load model artifacts; degrade to 503 on prediction routes if absent
    let prediction_service = match load_scorer(&config) {
        Ok(scorer) => {
            tracing::info!(
                columns = scorer.manifest().len(),
                manifest_version = scorer.manifest().version,
                "✓ Churn model loaded"
            );
            // Short-TTL cache of recent predictions (model and data are
            // read-only at serving time, so staleness is bounded by TTL)
            let prediction_cache = Cache::builder()
                .time_to_live(Duration::from_secs(config.prediction_cache_ttl_secs))
                .max_capacity(10_000)
                .build();
            Some(Arc::new(PredictionService::new(
                db.pool.clone(),
                Arc::new(scorer),
                prediction_cache,
            )))
        }
        Err(e) => {
            tracing::error!("Failed to load model artifacts: {}", e);
            None
        }
    };

    // Build application state
    let app_state = Arc::new(AppState {
        db: db.pool.clone(),
        config: config.clone(),
        prediction_service,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/predict/:customer_id", get(handlers::predict_churn))
        .route("/api/v1/predict/batch", post(handlers::predict_batch))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
