//! 实体 schema 描述

use sentinel_errors::{AppError, AppResult};

use crate::FieldMap;

/// 数据库主键
pub type EntityId = i64;

/// 可由 `EntityStore` 存取的实体
///
/// 列名都是编译期常量，调用方的字段映射只能引用 `WRITABLE` 中的列。
pub trait Entity: Send + Sync + Unpin + 'static {
    /// 表名
    const TABLE: &'static str;
    /// 查询时选取的列
    const COLUMNS: &'static [&'static str];
    /// 允许写入的列（不含主键和服务端生成的时间戳）
    const WRITABLE: &'static [&'static str];

    fn id(&self) -> EntityId;
}

/// 校验字段映射只包含实体的可写列
pub fn validate_fields<E: Entity>(fields: &FieldMap) -> AppResult<()> {
    if fields.is_empty() {
        return Err(AppError::bad_request(format!(
            "No fields supplied for {}",
            E::TABLE
        )));
    }

    if let Some(unknown) = fields.columns().find(|c| !E::WRITABLE.contains(c)) {
        return Err(AppError::bad_request(format!(
            "Unknown or read-only column '{}' for {}",
            unknown,
            E::TABLE
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    impl Entity for Widget {
        const TABLE: &'static str = "widgets";
        const COLUMNS: &'static [&'static str] = &["id", "name", "created_at"];
        const WRITABLE: &'static [&'static str] = &["name"];

        fn id(&self) -> EntityId {
            1
        }
    }

    #[test]
    fn test_accepts_writable_columns() {
        let fields = FieldMap::new().with("name", "gear");
        assert!(validate_fields::<Widget>(&fields).is_ok());
    }

    #[test]
    fn test_rejects_unknown_column() {
        let fields = FieldMap::new().with("name; DROP TABLE widgets", "x");
        assert!(matches!(
            validate_fields::<Widget>(&fields),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_rejects_server_generated_column() {
        let fields = FieldMap::new().with("created_at", "2020-01-01");
        assert!(validate_fields::<Widget>(&fields).is_err());
    }

    #[test]
    fn test_rejects_empty_map() {
        assert!(validate_fields::<Widget>(&FieldMap::new()).is_err());
    }
}
