//! JWT Claims

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use sentinel_common::AccountId;
use sentinel_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 令牌类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT Claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject（账户 ID 的十进制字符串）
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// JWT ID，同一秒签发的两个令牌也互不相同
    pub jti: String,
    /// Token type (access or refresh)
    pub token_type: TokenKind,
}

impl Claims {
    pub fn new(subject: AccountId, kind: TokenKind, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::now_v7().to_string(),
            token_type: kind,
        }
    }

    pub fn account_id(&self) -> AppResult<AccountId> {
        self.sub
            .parse::<AccountId>()
            .map_err(|_| AppError::unauthorized("Invalid subject in token"))
    }

    /// 在给定时刻是否已过期（不允许时间偏差）
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
