//! 允许列表中的令牌记录

use chrono::{DateTime, Utc};
use sentinel_common::AccountId;
use sentinel_ports::{Entity, EntityId};

/// 一条仍然有效的已签发令牌
///
/// 记录存在即表示令牌未被撤销。
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TokenRecord {
    pub id: i64,
    pub token_value: String,
    pub account_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn owner(&self) -> AccountId {
        AccountId::new(self.account_id)
    }
}

impl Entity for TokenRecord {
    const TABLE: &'static str = "token_records";
    const COLUMNS: &'static [&'static str] =
        &["id", "token_value", "account_id", "created_at", "updated_at"];
    const WRITABLE: &'static [&'static str] = &["token_value", "account_id"];

    fn id(&self) -> EntityId {
        self.id
    }
}
