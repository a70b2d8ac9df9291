//! 认证闸门
//!
//! 请求时根据令牌判定账户身份。拒绝原因只在 debug 日志里区分，
//! 对调用方一律是同一个 `Unauthorized`。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use sentinel_auth_core::{TokenKind, TokenService};
use sentinel_common::AccountId;
use sentinel_errors::{AppError, AppResult};
use tracing::debug;

use crate::domain::TokenAllowList;
use crate::error::AccountError;

/// 请求携带的凭证
///
/// HTTP Bearer 与 OAuth2 表单令牌同时存在时以 Bearer 为准。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSource {
    pub bearer: Option<String>,
    pub oauth_token: Option<String>,
}

impl CredentialSource {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            oauth_token: None,
        }
    }

    pub fn oauth(token: impl Into<String>) -> Self {
        Self {
            bearer: None,
            oauth_token: Some(token.into()),
        }
    }

    /// 从 `Authorization` 头解析
    pub fn from_authorization_header(header: Option<&str>) -> Self {
        Self {
            bearer: header.and_then(parse_bearer).map(str::to_string),
            oauth_token: None,
        }
    }

    pub fn with_oauth_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_token = Some(token.into());
        self
    }

    /// 实际使用的令牌，空字符串视为缺失
    pub fn credential(&self) -> Option<&str> {
        fn non_empty(token: &Option<String>) -> Option<&str> {
            token.as_deref().filter(|s| !s.is_empty())
        }
        non_empty(&self.bearer).or_else(|| non_empty(&self.oauth_token))
    }
}

/// 解析 `Bearer <token>`，scheme 不区分大小写
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub struct AuthenticationGate {
    allow_list: Arc<dyn TokenAllowList>,
    tokens: Arc<TokenService>,
}

impl AuthenticationGate {
    pub fn new(allow_list: Arc<dyn TokenAllowList>, tokens: Arc<TokenService>) -> Self {
        Self { allow_list, tokens }
    }

    pub async fn authenticate(&self, source: &CredentialSource) -> AppResult<AccountId> {
        self.authenticate_at(source, Utc::now()).await
    }

    /// 在给定时刻认证
    ///
    /// 先查允许列表，再校验访问令牌；存储层的非 NotFound 错误原样返回。
    pub async fn authenticate_at(
        &self,
        source: &CredentialSource,
        now: DateTime<Utc>,
    ) -> AppResult<AccountId> {
        let Some(token) = source.credential() else {
            return Err(reject("missing credential"));
        };

        match self.allow_list.get_by_token_value(token).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Err(reject("token not on allow-list")),
            Err(e) => {
                counter!("auth_authentications_total", "outcome" => "error").increment(1);
                return Err(e);
            }
        }

        match self.tokens.verify_at(token, TokenKind::Access, now) {
            Ok(account_id) => {
                counter!("auth_authentications_total", "outcome" => "success").increment(1);
                Ok(account_id)
            }
            Err(e) => {
                debug!(error = %e, "Access token verification failed");
                Err(reject("verification failed"))
            }
        }
    }
}

fn reject(cause: &'static str) -> AppError {
    debug!(cause, "Authentication rejected");
    counter!("auth_authentications_total", "outcome" => "rejected").increment(1);
    AccountError::InvalidCredentials.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use mockall::mock;
    use sentinel_auth_core::TokenSettings;

    use crate::domain::TokenRecord;

    mock! {
        AllowList {}

        #[async_trait]
        impl TokenAllowList for AllowList {
            async fn insert(&self, token_value: &str, account_id: AccountId) -> AppResult<TokenRecord>;
            async fn get_by_token_value(&self, token_value: &str) -> AppResult<TokenRecord>;
            async fn delete_by_token_value(&self, token_value: &str) -> AppResult<()>;
            async fn delete_by_account_id(&self, account_id: AccountId) -> AppResult<u64>;
        }
    }

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new(TokenSettings::new("access-secret", "refresh-secret")).unwrap())
    }

    fn record(token: &str, account_id: i64) -> TokenRecord {
        let now = Utc::now();
        TokenRecord {
            id: 1,
            token_value: token.to_string(),
            account_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn allow_listed(expected: String) -> MockAllowList {
        let mut allow_list = MockAllowList::new();
        allow_list
            .expect_get_by_token_value()
            .times(1)
            .returning(move |value| {
                assert_eq!(value, expected);
                Ok(record(value, 42))
            });
        allow_list
    }

    fn revoked() -> MockAllowList {
        let mut allow_list = MockAllowList::new();
        allow_list
            .expect_get_by_token_value()
            .times(1)
            .returning(|_| Err(AppError::not_found("Token is not on the allow-list")));
        allow_list
    }

    fn assert_rejected(result: AppResult<AccountId>) {
        match result {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Could not validate credentials"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(parse_bearer("bearer   abc"), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer   "), None);
    }

    #[test]
    fn test_bearer_wins_over_oauth_token() {
        let source = CredentialSource::bearer("from-header").with_oauth_token("from-form");
        assert_eq!(source.credential(), Some("from-header"));

        let source = CredentialSource::oauth("from-form");
        assert_eq!(source.credential(), Some("from-form"));

        let source = CredentialSource {
            bearer: Some(String::new()),
            oauth_token: Some("from-form".into()),
        };
        assert_eq!(source.credential(), Some("from-form"));

        assert_eq!(CredentialSource::default().credential(), None);
    }

    #[tokio::test]
    async fn test_allow_listed_access_token_authenticates() {
        let tokens = token_service();
        let token = tokens.generate_access_token(AccountId::new(42)).unwrap();
        let gate = AuthenticationGate::new(Arc::new(allow_listed(token.clone())), tokens);

        let account = gate.authenticate(&CredentialSource::bearer(token)).await.unwrap();
        assert_eq!(account, AccountId::new(42));
    }

    #[tokio::test]
    async fn test_missing_credential_skips_lookup() {
        let gate = AuthenticationGate::new(Arc::new(MockAllowList::new()), token_service());
        assert_rejected(gate.authenticate(&CredentialSource::default()).await);
    }

    #[tokio::test]
    async fn test_revoked_token_is_rejected() {
        let tokens = token_service();
        let token = tokens.generate_access_token(AccountId::new(42)).unwrap();
        let gate = AuthenticationGate::new(Arc::new(revoked()), tokens);

        assert_rejected(gate.authenticate(&CredentialSource::bearer(token)).await);
    }

    #[tokio::test]
    async fn test_refresh_token_is_rejected() {
        let tokens = token_service();
        let token = tokens.generate_refresh_token(AccountId::new(42)).unwrap();
        let gate = AuthenticationGate::new(Arc::new(allow_listed(token.clone())), tokens);

        assert_rejected(gate.authenticate(&CredentialSource::bearer(token)).await);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let tokens = token_service();
        let issued = Utc::now() - Duration::hours(2);
        let token = tokens
            .issue_access(AccountId::new(42), issued, Duration::minutes(30))
            .unwrap();
        let gate = AuthenticationGate::new(Arc::new(allow_listed(token.clone())), tokens);

        assert_rejected(gate.authenticate(&CredentialSource::bearer(token)).await);
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let tokens = token_service();
        let issued = Utc::now();
        let ttl = Duration::minutes(30);
        let token = tokens.issue_access(AccountId::new(42), issued, ttl).unwrap();

        let gate = AuthenticationGate::new(Arc::new(allow_listed(token.clone())), tokens.clone());
        let before = issued + ttl - Duration::seconds(1);
        assert!(gate.authenticate_at(&CredentialSource::bearer(token.clone()), before).await.is_ok());

        let gate = AuthenticationGate::new(Arc::new(allow_listed(token.clone())), tokens);
        let after = issued + ttl + Duration::seconds(1);
        assert_rejected(gate.authenticate_at(&CredentialSource::bearer(token), after).await);
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let gate = AuthenticationGate::new(Arc::new(allow_listed("garbage".into())), token_service());
        assert_rejected(gate.authenticate(&CredentialSource::oauth("garbage")).await);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut allow_list = MockAllowList::new();
        allow_list
            .expect_get_by_token_value()
            .returning(|_| Err(AppError::internal("Database connection pool timeout")));
        let gate = AuthenticationGate::new(Arc::new(allow_list), token_service());

        let result = gate.authenticate(&CredentialSource::bearer("anything")).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
