//! 登录会话：签发、刷新与撤销令牌

use std::sync::Arc;

use metrics::counter;
use sentinel_adapter_postgres::TransactionManager;
use sentinel_auth_core::{CredentialHasher, TokenService};
use sentinel_common::AccountId;
use sentinel_errors::{AppError, AppResult};
use sentinel_ports::FieldMap;
use tracing::{debug, info, warn};

use crate::application::dto::{LoginRequest, TokenPair};
use crate::application::password::{hash_password, verify_password};
use crate::domain::{Account, TokenAllowList};
use crate::error::AccountError;
use crate::infrastructure::persistence::{AccountStore, PgTokenAllowList};

pub struct SessionService {
    accounts: AccountStore,
    allow_list: PgTokenAllowList,
    transactions: TransactionManager,
    tokens: Arc<TokenService>,
    hasher: Arc<CredentialHasher>,
}

impl SessionService {
    pub fn new(
        accounts: AccountStore,
        allow_list: PgTokenAllowList,
        transactions: TransactionManager,
        tokens: Arc<TokenService>,
        hasher: Arc<CredentialHasher>,
    ) -> Self {
        Self {
            accounts,
            allow_list,
            transactions,
            tokens,
            hasher,
        }
    }

    /// 邮箱密码登录，签发访问令牌与刷新令牌并登记到允许列表
    ///
    /// 邮箱不存在与密码错误返回同一个错误。两个令牌在同一事务内登记。
    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenPair> {
        let Some(account) = self.accounts.find_by_email(&request.email).await? else {
            return Err(login_failed("unknown email"));
        };

        let matched = verify_password(
            self.hasher.clone(),
            request.password.clone(),
            account.hashed_password.clone(),
        )
        .await?;
        if !matched {
            return Err(login_failed("wrong password"));
        }

        if self.hasher.needs_rehash(&account.hashed_password) {
            self.upgrade_hash(&account, request.password).await;
        }

        let account_id = account.account_id();
        let access_token = self.tokens.generate_access_token(account_id)?;
        let refresh_token = self.tokens.generate_refresh_token(account_id)?;

        let mut tx = self.transactions.begin().await?;
        for token in [&access_token, &refresh_token] {
            if let Err(e) = self.allow_list.insert_in(&mut *tx, token, account_id).await {
                TransactionManager::rollback(tx).await;
                return Err(e);
            }
        }
        TransactionManager::commit(tx).await?;

        counter!("auth_logins_total", "outcome" => "success").increment(1);
        info!(account_id = %account_id, "Account logged in");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// 用刷新令牌换取新的访问令牌，刷新令牌本身不轮换
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        match self.allow_list.get_by_token_value(refresh_token).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!("Refresh token not on allow-list");
                return Err(AccountError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        }

        let account_id = self.tokens.validate_refresh_token(refresh_token).map_err(|e| {
            debug!(error = %e, "Refresh token verification failed");
            AccountError::InvalidCredentials
        })?;

        let access_token = self.tokens.generate_access_token(account_id)?;
        self.allow_list.insert(&access_token, account_id).await?;

        debug!(account_id = %account_id, "Access token refreshed");
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// 撤销单个令牌，令牌已不在允许列表中时视为成功
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        match self.allow_list.delete_by_token_value(token).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("Logout for a token that is not on the allow-list");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 撤销账户的全部令牌
    pub async fn logout_everywhere(&self, account_id: AccountId) -> AppResult<u64> {
        let revoked = self.allow_list.delete_by_account_id(account_id).await?;
        info!(account_id = %account_id, revoked, "Account logged out everywhere");
        Ok(revoked)
    }
}

impl SessionService {
    /// 按当前成本参数重新哈希，失败只记日志，不影响登录
    async fn upgrade_hash(&self, account: &Account, plain_password: String) {
        let upgraded = match hash_password(self.hasher.clone(), plain_password).await {
            Ok(digest) => {
                let fields = FieldMap::new().with("hashed_password", digest);
                self.accounts.update(account.account_id(), fields).await.map(|_| ())
            }
            Err(e) => Err(e),
        };

        match upgraded {
            Ok(()) => debug!(account_id = account.id, "Password hash upgraded"),
            Err(e) => warn!(account_id = account.id, error = %e, "Failed to upgrade password hash"),
        }
    }
}

fn login_failed(cause: &'static str) -> AppError {
    warn!(cause, "Login rejected");
    counter!("auth_logins_total", "outcome" => "rejected").increment(1);
    AccountError::LoginFailed.into()
}
