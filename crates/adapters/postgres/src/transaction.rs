//! 事务管理

use sentinel_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

pub type PgTransaction = Transaction<'static, Postgres>;

/// 跨多个存储的原子操作入口
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 开始事务
    pub async fn begin(&self) -> AppResult<PgTransaction> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::internal(format!("Failed to begin transaction: {}", e)))
    }

    /// 提交事务
    pub async fn commit(tx: PgTransaction) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::internal(format!("Failed to commit transaction: {}", e)))
    }

    /// 回滚事务
    ///
    /// 回滚失败只记录日志，连接归还连接池时会被重置。
    pub async fn rollback(tx: PgTransaction) {
        if let Err(e) = tx.rollback().await {
            warn!(error = %e, "Failed to rollback transaction");
        }
    }
}
