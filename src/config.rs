use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub model_path: String,
    pub column_manifest_path: String,
    /// TTL in seconds for the prediction cache.
    pub prediction_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("sqlite:") {
                        anyhow::bail!("DB_URL must start with sqlite:");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/churn_predictor.onnx".to_string()),
            column_manifest_path: std::env::var("COLUMN_MANIFEST_PATH")
                .unwrap_or_else(|_| "models/feature_columns.json".to_string()),
            prediction_cache_ttl_secs: std::env::var("PREDICTION_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("PREDICTION_CACHE_TTL_SECS must be a valid number of seconds")
                })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Model path: {}", config.model_path);
        tracing::debug!("Column manifest path: {}", config.column_manifest_path);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
