//! 通用 CRUD 的 SQL 生成
//!
//! 表名和列名只来自 `Entity` 的编译期常量，调用方的值全部以 `$n` 占位符绑定。
//! NULL 直接写成字面量，避免无类型参数被推断为 TEXT。

use sentinel_errors::{AppError, AppResult};
use sentinel_ports::{Entity, EntityId, FieldMap, FieldValue};
use sqlx::Arguments;
use sqlx::postgres::PgArguments;

/// 生成的语句与按顺序绑定的参数
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    /// 追加参数，返回对应的占位符
    fn push(&mut self, value: FieldValue) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn arguments(&self) -> AppResult<PgArguments> {
        bind_all(&self.params)
    }
}

/// 将参数依次加入 PgArguments
pub fn bind_all(params: &[FieldValue]) -> AppResult<PgArguments> {
    let mut args = PgArguments::default();
    for value in params {
        let added = match value {
            FieldValue::Null => args.add(Option::<String>::None),
            FieldValue::Bool(v) => args.add(*v),
            FieldValue::Int(v) => args.add(*v),
            FieldValue::Float(v) => args.add(*v),
            FieldValue::Text(v) => args.add(v.clone()),
            FieldValue::Timestamp(v) => args.add(*v),
            FieldValue::Json(v) => args.add(v.clone()),
        };
        added.map_err(|e| AppError::internal(format!("Failed to bind parameter: {}", e)))?;
    }
    Ok(args)
}

fn column_list<E: Entity>() -> String {
    E::COLUMNS.join(", ")
}

fn has_updated_at<E: Entity>() -> bool {
    E::COLUMNS.contains(&"updated_at")
}

pub fn select_all<E: Entity>() -> Statement {
    Statement::new(format!(
        "SELECT {} FROM {} ORDER BY id",
        column_list::<E>(),
        E::TABLE
    ))
}

pub fn select_by_id<E: Entity>(id: EntityId) -> Statement {
    let mut stmt = Statement::new(String::new());
    let placeholder = stmt.push(FieldValue::Int(id));
    stmt.sql = format!(
        "SELECT {} FROM {} WHERE id = {}",
        column_list::<E>(),
        E::TABLE,
        placeholder
    );
    stmt
}

/// 分页查询；0 表示不限制
pub fn select_page<E: Entity>(skip: u64, limit: u64) -> AppResult<Statement> {
    let mut stmt = Statement::new(String::new());
    let mut sql = format!("SELECT {} FROM {} ORDER BY id", column_list::<E>(), E::TABLE);

    if skip > 0 {
        let placeholder = stmt.push(FieldValue::Int(to_i64(skip, "skip")?));
        sql.push_str(&format!(" OFFSET {}", placeholder));
    }
    if limit > 0 {
        let placeholder = stmt.push(FieldValue::Int(to_i64(limit, "limit")?));
        sql.push_str(&format!(" LIMIT {}", placeholder));
    }

    stmt.sql = sql;
    Ok(stmt)
}

pub fn count<E: Entity>() -> Statement {
    Statement::new(format!("SELECT COUNT(*) FROM {}", E::TABLE))
}

/// INSERT ... RETURNING id
pub fn insert<E: Entity>(fields: &FieldMap) -> Statement {
    let mut stmt = Statement::new(String::new());
    let columns: Vec<&str> = fields.columns().collect();
    let values: Vec<String> = fields.values().map(|v| stmt.push(v.clone())).collect();

    stmt.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
        E::TABLE,
        columns.join(", "),
        values.join(", ")
    );
    stmt
}

/// UPDATE ... RETURNING id，实体有 `updated_at` 时一并刷新
pub fn update<E: Entity>(id: EntityId, fields: &FieldMap) -> Statement {
    let mut stmt = Statement::new(String::new());
    let mut assignments: Vec<String> = fields
        .iter()
        .map(|(column, value)| format!("{} = {}", column, stmt.push(value.clone())))
        .collect();
    if has_updated_at::<E>() {
        assignments.push("updated_at = NOW()".to_string());
    }
    let id_placeholder = stmt.push(FieldValue::Int(id));

    stmt.sql = format!(
        "UPDATE {} SET {} WHERE id = {} RETURNING id",
        E::TABLE,
        assignments.join(", "),
        id_placeholder
    );
    stmt
}

pub fn delete<E: Entity>(id: EntityId) -> Statement {
    let mut stmt = Statement::new(String::new());
    let placeholder = stmt.push(FieldValue::Int(id));
    stmt.sql = format!("DELETE FROM {} WHERE id = {}", E::TABLE, placeholder);
    stmt
}

fn to_i64(value: u64, name: &str) -> AppResult<i64> {
    i64::try_from(value).map_err(|_| AppError::bad_request(format!("{} is out of range", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    impl Entity for Widget {
        const TABLE: &'static str = "widgets";
        const COLUMNS: &'static [&'static str] = &["id", "name", "weight", "created_at", "updated_at"];
        const WRITABLE: &'static [&'static str] = &["name", "weight"];

        fn id(&self) -> EntityId {
            0
        }
    }

    struct Tag;

    impl Entity for Tag {
        const TABLE: &'static str = "tags";
        const COLUMNS: &'static [&'static str] = &["id", "label"];
        const WRITABLE: &'static [&'static str] = &["label"];

        fn id(&self) -> EntityId {
            0
        }
    }

    #[test]
    fn test_select_by_id() {
        let stmt = select_by_id::<Widget>(7);
        assert_eq!(
            stmt.sql,
            "SELECT id, name, weight, created_at, updated_at FROM widgets WHERE id = $1"
        );
        assert_eq!(stmt.params, vec![FieldValue::Int(7)]);
    }

    #[test]
    fn test_select_page_omits_zero_bounds() {
        let stmt = select_page::<Tag>(0, 0).unwrap();
        assert_eq!(stmt.sql, "SELECT id, label FROM tags ORDER BY id");
        assert!(stmt.params.is_empty());

        let stmt = select_page::<Tag>(0, 5).unwrap();
        assert_eq!(stmt.sql, "SELECT id, label FROM tags ORDER BY id LIMIT $1");
        assert_eq!(stmt.params, vec![FieldValue::Int(5)]);

        let stmt = select_page::<Tag>(10, 5).unwrap();
        assert_eq!(stmt.sql, "SELECT id, label FROM tags ORDER BY id OFFSET $1 LIMIT $2");
        assert_eq!(stmt.params, vec![FieldValue::Int(10), FieldValue::Int(5)]);
    }

    #[test]
    fn test_select_page_rejects_huge_offset() {
        assert!(matches!(
            select_page::<Tag>(u64::MAX, 1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_insert_binds_values_in_column_order() {
        let fields = FieldMap::new().with("weight", 3_i64).with("name", "gear");
        let stmt = insert::<Widget>(&fields);
        assert_eq!(
            stmt.sql,
            "INSERT INTO widgets (name, weight) VALUES ($1, $2) RETURNING id"
        );
        assert_eq!(
            stmt.params,
            vec![FieldValue::Text("gear".into()), FieldValue::Int(3)]
        );
    }

    #[test]
    fn test_insert_null_is_literal() {
        let fields = FieldMap::new()
            .with("name", "gear")
            .with("weight", Option::<i64>::None);
        let stmt = insert::<Widget>(&fields);
        assert_eq!(
            stmt.sql,
            "INSERT INTO widgets (name, weight) VALUES ($1, NULL) RETURNING id"
        );
        assert_eq!(stmt.params.len(), 1);
    }

    #[test]
    fn test_update_refreshes_updated_at() {
        let fields = FieldMap::new().with("name", "cog");
        let stmt = update::<Widget>(4, &fields);
        assert_eq!(
            stmt.sql,
            "UPDATE widgets SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING id"
        );
        assert_eq!(
            stmt.params,
            vec![FieldValue::Text("cog".into()), FieldValue::Int(4)]
        );
    }

    #[test]
    fn test_update_without_updated_at() {
        let fields = FieldMap::new().with("label", "blue");
        let stmt = update::<Tag>(1, &fields);
        assert_eq!(stmt.sql, "UPDATE tags SET label = $1 WHERE id = $2 RETURNING id");
    }

    #[test]
    fn test_count_and_delete() {
        assert_eq!(count::<Tag>().sql, "SELECT COUNT(*) FROM tags");
        assert_eq!(delete::<Tag>(9).sql, "DELETE FROM tags WHERE id = $1");
    }

    #[test]
    fn test_bind_all_accepts_every_variant() {
        let params = vec![
            FieldValue::Null,
            FieldValue::Bool(true),
            FieldValue::Int(1),
            FieldValue::Float(1.5),
            FieldValue::Text("x".into()),
            FieldValue::Timestamp(chrono::Utc::now()),
            FieldValue::Json(serde_json::json!({"a": 1})),
        ];
        assert!(bind_all(&params).is_ok());
    }
}
