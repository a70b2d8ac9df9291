//! EntityStore trait 定义

use async_trait::async_trait;
use sentinel_errors::{AppError, AppResult};

use crate::{Entity, EntityId, FieldMap, FieldValue};

/// 原始查询返回的一行（列名 → JSON 值）
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// 原始查询模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// 读取结果行
    Rows,
    /// 提交写入并返回受影响行数
    Affected,
}

/// 原始查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Rows(Vec<RawRow>),
    Affected(u64),
}

impl RawResult {
    pub fn into_rows(self) -> Vec<RawRow> {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected(_) => Vec::new(),
        }
    }

    /// 受影响行数；读取模式下为返回的行数
    pub fn affected(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Affected(count) => *count,
        }
    }
}

/// 通用实体存储
///
/// 每个操作只在自身执行期间占用一个连接或事务。写操作在提交后重新读取整行，
/// 以便返回服务端生成的字段。
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// 全表读取
    async fn get_all(&self) -> AppResult<Vec<E>>;

    /// 根据 ID 读取，不存在时返回 `NotFound`
    async fn get_one(&self, id: EntityId) -> AppResult<E>;

    /// 分页读取，同时返回未过滤的总行数
    ///
    /// `skip` 为 0 时不加 OFFSET，`limit` 为 0 时不加 LIMIT。
    async fn get_multiple(&self, skip: u64, limit: u64) -> AppResult<(Vec<E>, u64)>;

    /// 插入并返回规范化后的实体
    async fn create(&self, fields: FieldMap) -> AppResult<E>;

    /// 按字段映射部分更新
    async fn update(&self, id: EntityId, fields: FieldMap) -> AppResult<E>;

    /// 执行通用 CRUD 无法表达的查询，参数一律按位置绑定（`$1`, `$2`, ...）
    async fn execute_raw(&self, query: &str, parameters: &[FieldValue], fetch: Fetch) -> AppResult<RawResult>;

    /// 将后端原生的完整性错误解码为领域错误
    ///
    /// 错误码的含义取决于具体数据库，必须由每个后端实现提供。
    fn classify_integrity_error(&self, native_code: &str, native_message: &str) -> AppError;
}
