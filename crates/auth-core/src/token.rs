//! Token 服务

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sentinel_common::AccountId;
use sentinel_errors::{AppError, AppResult};
use tracing::debug;

use crate::claims::{Claims, TokenKind};

/// Token 服务的构造参数
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    /// 签名算法名称，仅支持 HMAC 系列（HS256 / HS384 / HS512）
    pub algorithm: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            algorithm: "HS256".to_string(),
            access_ttl: Duration::minutes(30),
            refresh_ttl: Duration::minutes(60),
        }
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }
}

/// 单一类别的签名密钥
#[derive(Clone)]
struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl ClassKeys {
    fn from_secret(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Token 服务
///
/// access 与 refresh 各持有一套密钥，校验时只使用声明类别对应的密钥。
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    access: ClassKeys,
    refresh: ClassKeys,
}

impl TokenService {
    pub fn new(settings: TokenSettings) -> AppResult<Self> {
        let algorithm = Algorithm::from_str(&settings.algorithm).map_err(|_| {
            AppError::internal(format!("Unsupported JWT algorithm: {}", settings.algorithm))
        })?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AppError::internal(format!(
                "JWT algorithm {} requires key material other than a shared secret",
                settings.algorithm
            )));
        }
        if settings.access_secret.is_empty() || settings.refresh_secret.is_empty() {
            return Err(AppError::internal("JWT secrets must not be empty"));
        }

        Ok(Self {
            algorithm,
            access: ClassKeys::from_secret(&settings.access_secret, settings.access_ttl),
            refresh: ClassKeys::from_secret(&settings.refresh_secret, settings.refresh_ttl),
        })
    }

    fn keys(&self, kind: TokenKind) -> &ClassKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// 签发指定类别的令牌
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: AccountId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AppResult<String> {
        let claims = Claims::new(subject, kind, now, ttl);

        encode(&Header::new(self.algorithm), &claims, &self.keys(kind).encoding)
            .map_err(|e| AppError::internal(format!("Failed to generate {} token: {}", kind, e)))
    }

    pub fn issue_access(&self, subject: AccountId, now: DateTime<Utc>, ttl: Duration) -> AppResult<String> {
        self.issue(TokenKind::Access, subject, now, ttl)
    }

    pub fn issue_refresh(&self, subject: AccountId, now: DateTime<Utc>, ttl: Duration) -> AppResult<String> {
        self.issue(TokenKind::Refresh, subject, now, ttl)
    }

    /// 生成访问令牌（当前时间，配置的有效期）
    pub fn generate_access_token(&self, subject: AccountId) -> AppResult<String> {
        self.issue_access(subject, Utc::now(), self.access.ttl)
    }

    /// 生成刷新令牌（当前时间，配置的有效期）
    pub fn generate_refresh_token(&self, subject: AccountId) -> AppResult<String> {
        self.issue_refresh(subject, Utc::now(), self.refresh.ttl)
    }

    /// 在给定时刻解码并校验令牌
    ///
    /// 签名、算法、类别、过期时间和 subject 任一不符都返回 `Unauthorized`。
    pub fn decode_at(&self, token: &str, kind: TokenKind, now: DateTime<Utc>) -> AppResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        // 过期时间按传入的 now 自行比较，不依赖系统时钟
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map_err(|e| {
                debug!(kind = %kind, error = %e, "Token signature validation failed");
                AppError::unauthorized(format!("Invalid token: {}", e))
            })?;

        let claims = token_data.claims;

        if claims.token_type != kind {
            return Err(AppError::unauthorized(format!("Not an {} token", kind)));
        }
        if claims.is_expired_at(now) {
            return Err(AppError::unauthorized("Token expired"));
        }

        Ok(claims)
    }

    /// 校验令牌并返回 subject
    pub fn verify_at(&self, token: &str, kind: TokenKind, now: DateTime<Utc>) -> AppResult<AccountId> {
        self.decode_at(token, kind, now)?.account_id()
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> AppResult<AccountId> {
        self.verify_at(token, kind, Utc::now())
    }

    /// 验证访问令牌（确保是 access token）
    pub fn validate_access_token(&self, token: &str) -> AppResult<AccountId> {
        self.verify(token, TokenKind::Access)
    }

    /// 验证刷新令牌（确保是 refresh token）
    pub fn validate_refresh_token(&self, token: &str) -> AppResult<AccountId> {
        self.verify(token, TokenKind::Refresh)
    }

    /// 访问令牌有效期
    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    /// 刷新令牌有效期
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn service() -> TokenService {
        TokenService::new(TokenSettings::new("access-secret", "refresh-secret")).unwrap()
    }

    #[test]
    fn test_access_round_trip() {
        let svc = service();
        let token = svc.generate_access_token(AccountId(42)).unwrap();
        assert_eq!(svc.validate_access_token(&token).unwrap(), AccountId(42));
    }

    #[test]
    fn test_expiry_boundary() {
        let svc = service();
        let now = Utc::now();
        let ttl = Duration::minutes(30);
        let token = svc.issue_access(AccountId(7), now, ttl).unwrap();

        let eps = Duration::seconds(1);
        assert_eq!(svc.verify_at(&token, TokenKind::Access, now + ttl - eps).unwrap(), AccountId(7));
        assert!(matches!(
            svc.verify_at(&token, TokenKind::Access, now + ttl + eps),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_no_class_confusion() {
        let svc = service();
        let access = svc.generate_access_token(AccountId(1)).unwrap();
        let refresh = svc.generate_refresh_token(AccountId(1)).unwrap();

        assert!(svc.verify(&access, TokenKind::Refresh).is_err());
        assert!(svc.verify(&refresh, TokenKind::Access).is_err());
        assert!(svc.verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_same_secret_still_rejects_wrong_type() {
        let svc = TokenService::new(TokenSettings::new("shared", "shared")).unwrap();
        let refresh = svc.generate_refresh_token(AccountId(1)).unwrap();
        assert!(matches!(
            svc.verify(&refresh, TokenKind::Access),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = service();
        let theirs = TokenService::new(TokenSettings::new("other-access", "other-refresh")).unwrap();
        let token = theirs.generate_access_token(AccountId(1)).unwrap();
        assert!(ours.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let hs512 = TokenService::new(
            TokenSettings::new("access-secret", "refresh-secret").with_algorithm("HS512"),
        )
        .unwrap();
        let token = hs512.generate_access_token(AccountId(1)).unwrap();
        assert!(service().validate_access_token(&token).is_err());
    }

    #[test]
    fn test_missing_subject_rejected() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
            iat: i64,
            jti: String,
            token_type: TokenKind,
        }

        let now = Utc::now();
        let claims = NoSubject {
            exp: (now + Duration::minutes(5)).timestamp(),
            iat: now.timestamp(),
            jti: "x".to_string(),
            token_type: TokenKind::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();

        assert!(service().validate_access_token(&token).is_err());
    }

    #[test]
    fn test_malformed_subject_rejected() {
        let now = Utc::now();
        let mut claims = Claims::new(AccountId(1), TokenKind::Access, now, Duration::minutes(5));
        claims.sub = "alice".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();

        assert!(matches!(
            service().validate_access_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service().validate_access_token("not.a.jwt").is_err());
        assert!(service().validate_access_token("").is_err());
    }

    #[test]
    fn test_unsupported_algorithm() {
        let result = TokenService::new(TokenSettings::new("a", "b").with_algorithm("RS256"));
        assert!(result.is_err());
        let result = TokenService::new(TokenSettings::new("a", "b").with_algorithm("none"));
        assert!(result.is_err());
    }
}
