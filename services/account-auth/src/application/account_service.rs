//! 账户业务操作

use std::sync::Arc;

use sentinel_adapter_postgres::TransactionManager;
use sentinel_auth_core::CredentialHasher;
use sentinel_common::{AccountId, PagedResult};
use sentinel_errors::{AppError, AppResult};
use sentinel_ports::FieldMap;
use tracing::info;

use crate::application::dto::{
    AccountPage, AccountView, PageRequest, RegisterAccountRequest, UpdateAccountRequest,
};
use crate::application::password::hash_password;
use crate::error::AccountError;
use crate::infrastructure::persistence::{AccountStore, PgTokenAllowList};

pub struct AccountService {
    accounts: AccountStore,
    tokens: PgTokenAllowList,
    transactions: TransactionManager,
    hasher: Arc<CredentialHasher>,
}

impl AccountService {
    pub fn new(
        accounts: AccountStore,
        tokens: PgTokenAllowList,
        transactions: TransactionManager,
        hasher: Arc<CredentialHasher>,
    ) -> Self {
        Self {
            accounts,
            tokens,
            transactions,
            hasher,
        }
    }

    /// 注册新账户
    pub async fn register(&self, request: RegisterAccountRequest) -> AppResult<AccountView> {
        request.validate()?;

        let hashed = hash_password(self.hasher.clone(), request.password).await?;
        let fields = FieldMap::new()
            .with("organization_name", request.organization_name)
            .with("email", request.email)
            .with("phone", request.phone)
            .with("hashed_password", hashed);

        let account = self.accounts.create(fields).await.map_err(email_conflict)?;
        info!(account_id = account.id, "Account registered");
        Ok(account.into())
    }

    pub async fn get(&self, account_id: AccountId) -> AppResult<AccountView> {
        self.accounts.get(account_id).await.map(AccountView::from)
    }

    /// 更新名称、邮箱或电话
    pub async fn update(
        &self,
        account_id: AccountId,
        request: UpdateAccountRequest,
    ) -> AppResult<AccountView> {
        request.validate()?;

        let account = self
            .accounts
            .update(account_id, request.into_fields())
            .await
            .map_err(email_conflict)?;
        Ok(account.into())
    }

    /// 撤销全部令牌并删除账户，两步在同一事务内完成
    pub async fn delete(&self, account_id: AccountId) -> AppResult<()> {
        let mut tx = self.transactions.begin().await?;

        let revoked = match self.tokens.delete_by_account_id_in(&mut *tx, account_id).await {
            Ok(revoked) => revoked,
            Err(e) => {
                TransactionManager::rollback(tx).await;
                return Err(e);
            }
        };

        if let Err(e) = self.accounts.delete_in(&mut *tx, account_id).await {
            TransactionManager::rollback(tx).await;
            return Err(if e.is_not_found() {
                AccountError::AccountNotFound.into()
            } else {
                e
            });
        }

        TransactionManager::commit(tx).await?;
        info!(account_id = %account_id, revoked, "Account deleted");
        Ok(())
    }

    /// 分页列出账户
    pub async fn list(&self, page: PageRequest) -> AppResult<AccountPage> {
        let pagination = page.validate()?;
        let (accounts, total) = self
            .accounts
            .get_multiple(pagination.offset(), pagination.limit())
            .await?;

        Ok(PagedResult::new(accounts, total, &pagination).map(AccountView::from))
    }
}

fn email_conflict(err: AppError) -> AppError {
    if err.is_unique_violation() {
        AccountError::EmailRegistered.into()
    } else {
        err
    }
}
