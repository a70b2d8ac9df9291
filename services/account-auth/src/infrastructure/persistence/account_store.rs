//! 账户存储

use sentinel_adapter_postgres::PgEntityStore;
use sentinel_common::AccountId;
use sentinel_errors::AppResult;
use sentinel_ports::{EntityStore, FieldMap, FieldValue};
use sqlx::{PgConnection, PgPool};

use crate::domain::Account;

const FIND_BY_EMAIL: &str = "SELECT id, organization_name, email, phone, hashed_password, created_at, updated_at \
     FROM accounts WHERE email = $1";

/// `accounts` 表的存储
#[derive(Clone)]
pub struct AccountStore {
    store: PgEntityStore<Account>,
}

impl AccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            store: PgEntityStore::new(pool),
        }
    }

    pub async fn create(&self, fields: FieldMap) -> AppResult<Account> {
        self.store.create(fields).await
    }

    pub async fn get(&self, id: AccountId) -> AppResult<Account> {
        self.store.get_one(id.value()).await
    }

    pub async fn get_multiple(&self, skip: u64, limit: u64) -> AppResult<(Vec<Account>, u64)> {
        self.store.get_multiple(skip, limit).await
    }

    pub async fn update(&self, id: AccountId, fields: FieldMap) -> AppResult<Account> {
        self.store.update(id.value(), fields).await
    }

    pub async fn delete(&self, id: AccountId) -> AppResult<()> {
        self.store.delete(id.value()).await
    }

    /// 在调用方事务中删除
    pub async fn delete_in(&self, conn: &mut PgConnection, id: AccountId) -> AppResult<()> {
        self.store.delete_in(conn, id.value()).await
    }

    /// 按邮箱查找
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        self.store.find_raw(FIND_BY_EMAIL, &[FieldValue::from(email)]).await
    }
}
