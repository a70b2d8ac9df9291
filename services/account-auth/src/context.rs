//! 服务依赖装配

use std::sync::Arc;

use chrono::Duration;
use secrecy::ExposeSecret;
use sentinel_adapter_postgres::TransactionManager;
use sentinel_auth_core::{CredentialHasher, TokenService, TokenSettings};
use sentinel_config::AppConfig;
use sentinel_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::application::{AccountService, AuthenticationGate, SessionService};
use crate::domain::TokenAllowList;
use crate::infrastructure::persistence::{AccountStore, PgTokenAllowList};

/// 请求处理所需的全部组件，启动时构造一次
#[derive(Clone)]
pub struct AppContext {
    pub pool: PgPool,
    pub gate: Arc<AuthenticationGate>,
    pub accounts: Arc<AccountService>,
    pub sessions: Arc<SessionService>,
}

impl AppContext {
    pub fn new(config: &AppConfig, pool: PgPool) -> AppResult<Self> {
        let hasher = CredentialHasher::new(
            config.password.memory_kib,
            config.password.iterations,
            config.password.parallelism,
        )?;

        let settings = TokenSettings::new(
            config.jwt.access_secret.expose_secret().as_str(),
            config.jwt.refresh_secret.expose_secret().as_str(),
        )
        .with_algorithm(config.jwt.algorithm.as_str())
        .with_ttls(
            ttl_from_secs(config.jwt.access_ttl_secs)?,
            ttl_from_secs(config.jwt.refresh_ttl_secs)?,
        );

        Ok(Self::from_parts(
            pool,
            Arc::new(TokenService::new(settings)?),
            Arc::new(hasher),
        ))
    }

    pub fn from_parts(pool: PgPool, tokens: Arc<TokenService>, hasher: Arc<CredentialHasher>) -> Self {
        let accounts = AccountStore::new(pool.clone());
        let token_store = PgTokenAllowList::new(pool.clone());
        let allow_list: Arc<dyn TokenAllowList> = Arc::new(token_store.clone());

        let gate = AuthenticationGate::new(allow_list, tokens.clone());
        let account_service = AccountService::new(
            accounts.clone(),
            token_store.clone(),
            TransactionManager::new(pool.clone()),
            hasher.clone(),
        );
        let session_service = SessionService::new(
            accounts,
            token_store,
            TransactionManager::new(pool.clone()),
            tokens,
            hasher,
        );

        Self {
            pool,
            gate: Arc::new(gate),
            accounts: Arc::new(account_service),
            sessions: Arc::new(session_service),
        }
    }
}

fn ttl_from_secs(secs: u64) -> AppResult<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| AppError::internal(format!("Token TTL of {} seconds is out of range", secs)))
}
