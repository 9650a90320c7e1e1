use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::ServerConfig;

pub type DbPool = PgPool;

pub async fn get_pool(config: &ServerConfig) -> sqlx::Result<DbPool> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
}
