//! 令牌允许列表存储

use async_trait::async_trait;
use sentinel_adapter_postgres::PgEntityStore;
use sentinel_common::AccountId;
use sentinel_errors::{AppError, AppResult};
use sentinel_ports::{EntityStore, Fetch, FieldMap, FieldValue};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use crate::domain::{TokenAllowList, TokenRecord};

const FIND_BY_VALUE: &str = "SELECT id, token_value, account_id, created_at, updated_at \
     FROM token_records WHERE token_value = $1";
const DELETE_BY_VALUE: &str = "DELETE FROM token_records WHERE token_value = $1";
const DELETE_BY_ACCOUNT: &str = "DELETE FROM token_records WHERE account_id = $1";

/// `token_records` 表的存储
#[derive(Clone)]
pub struct PgTokenAllowList {
    store: PgEntityStore<TokenRecord>,
}

impl PgTokenAllowList {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: PgEntityStore::new(pool),
        }
    }

    /// 在调用方事务中登记令牌
    pub async fn insert_in(
        &self,
        conn: &mut PgConnection,
        token_value: &str,
        account_id: AccountId,
    ) -> AppResult<TokenRecord> {
        self.store.create_in(conn, token_fields(token_value, account_id)).await
    }

    /// 在调用方事务中撤销账户的全部令牌
    pub async fn delete_by_account_id_in(
        &self,
        conn: &mut PgConnection,
        account_id: AccountId,
    ) -> AppResult<u64> {
        let result = self
            .store
            .execute_raw_in(conn, DELETE_BY_ACCOUNT, &[FieldValue::Int(account_id.value())], Fetch::Affected)
            .await?;
        Ok(result.affected())
    }
}

fn token_fields(token_value: &str, account_id: AccountId) -> FieldMap {
    FieldMap::new()
        .with("token_value", token_value)
        .with("account_id", account_id.value())
}

#[async_trait]
impl TokenAllowList for PgTokenAllowList {
    async fn insert(&self, token_value: &str, account_id: AccountId) -> AppResult<TokenRecord> {
        self.store.create(token_fields(token_value, account_id)).await
    }

    async fn get_by_token_value(&self, token_value: &str) -> AppResult<TokenRecord> {
        self.store
            .find_raw(FIND_BY_VALUE, &[FieldValue::from(token_value)])
            .await?
            .ok_or_else(|| AppError::not_found("Token is not on the allow-list"))
    }

    async fn delete_by_token_value(&self, token_value: &str) -> AppResult<()> {
        let result = self
            .store
            .execute_raw(DELETE_BY_VALUE, &[FieldValue::from(token_value)], Fetch::Affected)
            .await?;

        if result.affected() == 0 {
            return Err(AppError::not_found("Token is not on the allow-list"));
        }
        Ok(())
    }

    async fn delete_by_account_id(&self, account_id: AccountId) -> AppResult<u64> {
        let result = self
            .store
            .execute_raw(DELETE_BY_ACCOUNT, &[FieldValue::Int(account_id.value())], Fetch::Affected)
            .await?;

        let revoked = result.affected();
        debug!(account_id = %account_id, revoked, "Tokens revoked for account");
        Ok(revoked)
    }
}
