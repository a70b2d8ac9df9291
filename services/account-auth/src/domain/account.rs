//! 账户实体

use std::fmt;

use chrono::{DateTime, Utc};
use sentinel_common::AccountId;
use sentinel_ports::{Entity, EntityId};

/// 账户
#[derive(Clone, PartialEq, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub organization_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.id)
    }
}

impl Entity for Account {
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "organization_name",
        "email",
        "phone",
        "hashed_password",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] =
        &["organization_name", "email", "phone", "hashed_password"];

    fn id(&self) -> EntityId {
        self.id
    }
}

// 摘要不进入日志
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("organization_name", &self.organization_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("hashed_password", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
