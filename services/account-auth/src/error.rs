//! 服务错误定义

use sentinel_errors::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Could not validate credentials")]
    InvalidCredentials,

    #[error("Incorrect email or password")]
    LoginFailed,

    #[error("Email already registered")]
    EmailRegistered,

    #[error("Account not found")]
    AccountNotFound,

    #[error("{0}")]
    Validation(String),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials | AccountError::LoginFailed => {
                AppError::unauthorized(err.to_string())
            }
            AccountError::EmailRegistered => AppError::conflict(err.to_string()),
            AccountError::AccountNotFound => AppError::not_found(err.to_string()),
            AccountError::Validation(msg) => AppError::bad_request(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(AccountError::InvalidCredentials).status_code(), 401);
        assert_eq!(AppError::from(AccountError::LoginFailed).status_code(), 401);
        assert_eq!(AppError::from(AccountError::EmailRegistered).status_code(), 409);
        assert_eq!(AppError::from(AccountError::AccountNotFound).status_code(), 404);
        assert_eq!(
            AppError::from(AccountError::Validation("bad".into())).status_code(),
            400
        );
    }
}
