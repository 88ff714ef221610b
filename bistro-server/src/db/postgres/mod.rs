//! PostgreSQL store

mod analytics;
mod catalog;
mod order;
mod user;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::RepoResult;

/// sqlx-backed store; cheap to clone
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(max_connections, "PostgreSQL store ready");

        Ok(Self { pool })
    }
}
