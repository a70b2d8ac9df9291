//! 数据库错误映射
//!
//! PostgreSQL SQLSTATE 的解码只存在于本适配器中。

use sentinel_errors::{AppError, ConstraintKind, IntegrityViolation};
use tracing::error;

/// SQLSTATE 类 23：完整性约束违规
const INTEGRITY_CLASS: &str = "23";

/// 是否为完整性约束违规
pub fn is_integrity_code(code: &str) -> bool {
    code.starts_with(INTEGRITY_CLASS)
}

/// 按 SQLSTATE 解码完整性违规
///
/// 参见 https://www.postgresql.org/docs/current/errcodes-appendix.html
pub fn classify_postgres_integrity(code: &str, message: &str) -> AppError {
    let kind = match code {
        "23505" => ConstraintKind::Unique,
        "23503" => ConstraintKind::ForeignKey,
        "23502" => ConstraintKind::NotNull,
        "23514" => ConstraintKind::Check,
        c if is_integrity_code(c) => ConstraintKind::Other,
        _ => {
            return AppError::internal(format!("Database error ({}): {}", code, message));
        }
    };

    AppError::integrity(IntegrityViolation::new(kind, code, message))
}

/// 将 SQLx 错误转换为 AppError
///
/// `classify` 负责完整性违规，其余错误在这里统一处理。
pub fn map_sqlx_error(err: sqlx::Error, classify: impl FnOnce(&str, &str) -> AppError) -> AppError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();

            if !is_integrity_code(&code) {
                error!(code = %code, error = %db_err, "Unclassified database error");
                return AppError::internal(format!("Database error ({}): {}", code, db_err));
            }

            let mut mapped = classify(&code, db_err.message());
            if let (AppError::Conflict(violation), Some(constraint)) = (&mut mapped, db_err.constraint()) {
                violation.constraint = Some(constraint.to_string());
            }
            mapped
        }
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::PoolTimedOut => {
            error!("Database connection pool timeout");
            AppError::internal("Database connection pool timeout")
        }
        sqlx::Error::PoolClosed => AppError::internal("Database connection pool is closed"),
        other => {
            error!(error = %other, "Unclassified database error");
            AppError::internal(format!("Database error: {}", other))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation() {
        let err = classify_postgres_integrity("23505", "duplicate key value");
        match err {
            AppError::Conflict(v) => {
                assert_eq!(v.kind, ConstraintKind::Unique);
                assert_eq!(v.code, "23505");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_integrity_codes() {
        let kinds = [
            ("23503", ConstraintKind::ForeignKey),
            ("23502", ConstraintKind::NotNull),
            ("23514", ConstraintKind::Check),
            ("23P01", ConstraintKind::Other),
        ];
        for (code, expected) in kinds {
            match classify_postgres_integrity(code, "boom") {
                AppError::Conflict(v) => assert_eq!(v.kind, expected, "code {}", code),
                other => panic!("unexpected {:?} for {}", other, code),
            }
        }
    }

    #[test]
    fn test_non_integrity_code_is_internal() {
        let err = classify_postgres_integrity("42P01", "relation does not exist");
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_row_not_found() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound, classify_postgres_integrity);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_pool_timeout() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut, classify_postgres_integrity);
        assert!(matches!(err, AppError::Internal(_)));
    }
}
