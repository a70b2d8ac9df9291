//! 领域端口

use async_trait::async_trait;
use sentinel_common::AccountId;
use sentinel_errors::AppResult;

use crate::domain::TokenRecord;

/// 令牌允许列表
#[async_trait]
pub trait TokenAllowList: Send + Sync {
    /// 登记新签发的令牌
    async fn insert(&self, token_value: &str, account_id: AccountId) -> AppResult<TokenRecord>;

    /// 查找令牌记录，不存在（已撤销或从未签发）时返回 `NotFound`
    async fn get_by_token_value(&self, token_value: &str) -> AppResult<TokenRecord>;

    /// 撤销单个令牌，不存在时返回 `NotFound`
    async fn delete_by_token_value(&self, token_value: &str) -> AppResult<()>;

    /// 撤销账户的全部令牌，返回撤销数量
    async fn delete_by_account_id(&self, account_id: AccountId) -> AppResult<u64>;
}
