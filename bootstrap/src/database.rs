//! 数据库连接初始化

use std::time::Duration;

use secrecy::ExposeSecret;
use sentinel_adapter_postgres::{PostgresConfig, create_pool};
use sentinel_config::DatabaseConfig;
use sentinel_errors::AppResult;
use sqlx::PgPool;

/// 将应用配置转换为连接池配置
pub fn postgres_config(config: &DatabaseConfig) -> PostgresConfig {
    PostgresConfig::new(config.url.expose_secret().clone())
        .with_max_connections(config.max_connections)
        .with_min_connections(config.min_connections)
        .with_acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .with_statement_timeout(config.statement_timeout_ms.map(Duration::from_millis))
}

/// 按配置创建 PostgreSQL 连接池
pub async fn connect_database(config: &DatabaseConfig) -> AppResult<PgPool> {
    create_pool(&postgres_config(config)).await
}
