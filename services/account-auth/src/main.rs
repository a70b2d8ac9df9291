//! Account Auth Service - 服务入口

use std::net::SocketAddr;

use account_auth::AppContext;
use account_auth::infrastructure::migrations::MIGRATIONS;
use sentinel_adapter_postgres::MigrationManager;
use sentinel_bootstrap::{HealthServer, connect_database, init_runtime};
use sentinel_config::AppConfig;
use sentinel_telemetry::init_metrics;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    let config = AppConfig::load("config")?;
    init_runtime(&config);
    let metrics = init_metrics()?;

    info!("Starting Account Auth Service");

    let pool = connect_database(&config.database).await?;
    let report = MigrationManager::new(pool.clone()).migrate(MIGRATIONS).await?;
    info!(applied = ?report.applied, skipped = report.skipped.len(), "Schema is up to date");

    // 启动时完成装配，密钥、算法或哈希参数有误时在此退出
    let context = AppContext::new(&config, pool)?;
    info!(
        access_ttl_secs = config.jwt.access_ttl_secs,
        refresh_ttl_secs = config.jwt.refresh_ttl_secs,
        "Authentication components ready"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    HealthServer::new(context.pool.clone(), metrics, addr).serve().await?;

    info!("Account Auth Service stopped");
    Ok(())
}
