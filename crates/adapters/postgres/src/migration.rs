//! 启动时的 schema 迁移
//!
//! 迁移脚本以字符串形式嵌入服务二进制，按版本号顺序执行，每个版本在独立事务中应用。

use std::collections::HashMap;

use sentinel_errors::{AppError, AppResult};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{info, warn};

const DEFAULT_TABLE: &str = "_schema_migrations";

/// 一个版本的迁移脚本
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub const fn new(version: i64, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }

    /// 脚本内容的 SHA-256
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

/// 迁移执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<i64>,
    pub skipped: Vec<i64>,
}

pub struct MigrationManager {
    pool: PgPool,
    table: &'static str,
}

impl MigrationManager {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: DEFAULT_TABLE,
        }
    }

    async fn ensure_table(&self) -> AppResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                checksum CHAR(64) NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            self.table
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create migration table: {}", e)))?;
        Ok(())
    }

    /// 已应用版本 → 校验和
    async fn applied(&self) -> AppResult<HashMap<i64, String>> {
        let sql = format!("SELECT version, checksum FROM {}", self.table);
        let rows: Vec<(i64, String)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("Failed to read applied migrations: {}", e)))?;
        Ok(rows.into_iter().collect())
    }

    async fn apply(&self, migration: &Migration) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::internal(format!("Failed to begin transaction: {}", e)))?;

        sqlx::raw_sql(migration.sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::internal(format!(
                    "Failed to apply migration {} ({}): {}",
                    migration.version, migration.name, e
                ))
            })?;

        let record = format!(
            "INSERT INTO {} (version, name, checksum) VALUES ($1, $2, $3)",
            self.table
        );
        sqlx::query(&record)
            .bind(migration.version)
            .bind(migration.name)
            .bind(migration.checksum())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::internal(format!("Failed to record migration: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::internal(format!("Failed to commit migration: {}", e)))?;

        info!(version = migration.version, name = migration.name, "Migration applied");
        Ok(())
    }

    /// 应用所有未执行的迁移
    ///
    /// 已执行脚本被修改过时直接失败，不会继续应用更高版本。
    pub async fn migrate(&self, migrations: &[Migration]) -> AppResult<MigrationReport> {
        self.ensure_table().await?;
        let applied = self.applied().await?;

        let mut ordered: Vec<&Migration> = migrations.iter().collect();
        ordered.sort_by_key(|m| m.version);

        let mut report = MigrationReport::default();
        for migration in ordered {
            match applied.get(&migration.version) {
                Some(checksum) if *checksum == migration.checksum() => {
                    report.skipped.push(migration.version);
                }
                Some(_) => {
                    warn!(version = migration.version, "Migration checksum mismatch");
                    return Err(AppError::internal(format!(
                        "Migration {} ({}) was modified after being applied",
                        migration.version, migration.name
                    )));
                }
                None => {
                    self.apply(migration).await?;
                    report.applied.push(migration.version);
                }
            }
        }

        Ok(report)
    }
}
