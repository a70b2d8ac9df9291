//! PostgreSQL EntityStore 实现

use std::marker::PhantomData;

use async_trait::async_trait;
use sentinel_errors::{AppError, AppResult};
use sentinel_ports::{
    Entity, EntityId, EntityStore, Fetch, FieldMap, FieldValue, RawResult, validate_fields,
};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;

use crate::error::{classify_postgres_integrity, map_sqlx_error};
use crate::rows::decode_rows;
use crate::statement::{self, bind_all};

/// 基于 sqlx 连接池的实体存储
pub struct PgEntityStore<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> PgEntityStore<E>
where
    E: Entity + for<'r> FromRow<'r, PgRow>,
{
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_err(&self, err: sqlx::Error) -> AppError {
        map_sqlx_error(err, |code, message| self.classify_integrity_error(code, message))
    }

    /// 按 ID 删除，不存在时返回 `NotFound`
    pub async fn delete(&self, id: EntityId) -> AppResult<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| self.map_err(e))?;
        self.delete_in(&mut *conn, id).await
    }

    /// 在调用方的连接或事务中删除
    pub async fn delete_in(&self, conn: &mut PgConnection, id: EntityId) -> AppResult<()> {
        let stmt = statement::delete::<E>(id);
        let result = sqlx::query_with(&stmt.sql, stmt.arguments()?)
            .execute(conn)
            .await
            .map_err(|e| self.map_err(e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::entity_not_found(E::TABLE, id));
        }

        debug!(table = E::TABLE, id, "Row deleted");
        Ok(())
    }

    /// 在调用方事务中插入，并在同一连接上读回
    pub async fn create_in(&self, conn: &mut PgConnection, fields: FieldMap) -> AppResult<E> {
        validate_fields::<E>(&fields)?;
        let stmt = statement::insert::<E>(&fields);

        let id: EntityId = sqlx::query_scalar_with(&stmt.sql, stmt.arguments()?)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| self.map_err(e))?;

        let select = statement::select_by_id::<E>(id);
        let entity = sqlx::query_as_with::<_, E, _>(&select.sql, select.arguments()?)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| self.map_err(e))?;

        debug!(table = E::TABLE, id, "Row created");
        Ok(entity)
    }

    /// 原始 SQL 直接解码为实体，查询须返回实体的全部列
    ///
    /// 在连接池上单次执行，只用于读取。
    pub async fn find_raw(&self, query: &str, parameters: &[FieldValue]) -> AppResult<Option<E>> {
        sqlx::query_as_with::<_, E, _>(query, bind_all(parameters)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.map_err(e))
    }

    /// 在调用方的连接或事务中执行原始查询，不负责提交
    pub async fn execute_raw_in(
        &self,
        conn: &mut PgConnection,
        query: &str,
        parameters: &[FieldValue],
        fetch: Fetch,
    ) -> AppResult<RawResult> {
        let args = bind_all(parameters)?;
        match fetch {
            Fetch::Rows => {
                let rows = sqlx::query_with(query, args)
                    .fetch_all(conn)
                    .await
                    .map_err(|e| self.map_err(e))?;
                Ok(RawResult::Rows(decode_rows(&rows)?))
            }
            Fetch::Affected => {
                let result = sqlx::query_with(query, args)
                    .execute(conn)
                    .await
                    .map_err(|e| self.map_err(e))?;
                Ok(RawResult::Affected(result.rows_affected()))
            }
        }
    }
}

#[async_trait]
impl<E> EntityStore<E> for PgEntityStore<E>
where
    E: Entity + for<'r> FromRow<'r, PgRow>,
{
    async fn get_all(&self) -> AppResult<Vec<E>> {
        let stmt = statement::select_all::<E>();
        sqlx::query_as_with::<_, E, _>(&stmt.sql, stmt.arguments()?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn get_one(&self, id: EntityId) -> AppResult<E> {
        let stmt = statement::select_by_id::<E>(id);
        sqlx::query_as_with::<_, E, _>(&stmt.sql, stmt.arguments()?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.map_err(e))?
            .ok_or_else(|| AppError::entity_not_found(E::TABLE, id))
    }

    async fn get_multiple(&self, skip: u64, limit: u64) -> AppResult<(Vec<E>, u64)> {
        let stmt = statement::select_page::<E>(skip, limit)?;
        let items = sqlx::query_as_with::<_, E, _>(&stmt.sql, stmt.arguments()?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.map_err(e))?;

        let count = statement::count::<E>();
        let total: i64 = sqlx::query_scalar(&count.sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.map_err(e))?;

        Ok((items, u64::try_from(total).unwrap_or_default()))
    }

    async fn create(&self, fields: FieldMap) -> AppResult<E> {
        validate_fields::<E>(&fields)?;
        let stmt = statement::insert::<E>(&fields);

        let mut tx = self.pool.begin().await.map_err(|e| self.map_err(e))?;
        let id: EntityId = sqlx::query_scalar_with(&stmt.sql, stmt.arguments()?)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| self.map_err(e))?;
        tx.commit().await.map_err(|e| self.map_err(e))?;

        debug!(table = E::TABLE, id, "Row created");
        self.get_one(id).await
    }

    async fn update(&self, id: EntityId, fields: FieldMap) -> AppResult<E> {
        validate_fields::<E>(&fields)?;
        let stmt = statement::update::<E>(id, &fields);

        let updated: Option<EntityId> = sqlx::query_scalar_with(&stmt.sql, stmt.arguments()?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.map_err(e))?;

        if updated.is_some() {
            debug!(table = E::TABLE, id, "Row updated");
        }
        self.get_one(id).await
    }

    /// `Fetch::Rows` 在事务中执行后回滚，只读取不提交；`Fetch::Affected` 提交
    async fn execute_raw(&self, query: &str, parameters: &[FieldValue], fetch: Fetch) -> AppResult<RawResult> {
        let mut tx = self.pool.begin().await.map_err(|e| self.map_err(e))?;
        let result = self.execute_raw_in(&mut *tx, query, parameters, fetch).await?;

        match fetch {
            Fetch::Rows => tx.rollback().await.map_err(|e| self.map_err(e))?,
            Fetch::Affected => tx.commit().await.map_err(|e| self.map_err(e))?,
        }

        debug!(table = E::TABLE, affected = result.affected(), "Raw query executed");
        Ok(result)
    }

    fn classify_integrity_error(&self, native_code: &str, native_message: &str) -> AppError {
        classify_postgres_integrity(native_code, native_message)
    }
}
