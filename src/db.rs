use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        // Sanity probe so a bad path fails at startup, not on first request
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}
