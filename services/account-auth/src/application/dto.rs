//! 请求与响应 DTO
//!
//! 请求同时接受 snake_case 字段名和 camelCase 别名，拒绝未知字段。

use email_address::EmailAddress;
use sentinel_common::{Pagination, PagedResult};
use sentinel_errors::AppResult;
use sentinel_ports::FieldMap;
use serde::{Deserialize, Serialize};

use crate::domain::Account;
use crate::error::AccountError;

const MAX_PAGE_SIZE: u32 = 100;

/// 注册请求
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterAccountRequest {
    #[serde(alias = "organizationName")]
    pub organization_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

impl RegisterAccountRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("organization_name", &self.organization_name)?;
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(AccountError::Validation("password must not be empty".into()).into());
        }
        Ok(())
    }
}

/// 资料更新请求，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    #[serde(default, alias = "organizationName")]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.organization_name {
            require_non_empty("organization_name", name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    pub fn into_fields(self) -> FieldMap {
        let mut fields = FieldMap::new();
        if let Some(name) = self.organization_name {
            fields.insert("organization_name", name);
        }
        if let Some(email) = self.email {
            fields.insert("email", email);
        }
        if let Some(phone) = self.phone {
            fields.insert("phone", phone);
        }
        fields
    }
}

/// 登录请求
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

/// 分页请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageRequest {
    #[serde(default = "default_target_page", alias = "targetPage")]
    pub target_page: u32,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub page_size: u32,
}

fn default_target_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            target_page: default_target_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageRequest {
    pub fn new(target_page: u32, page_size: u32) -> Self {
        Self {
            target_page,
            page_size,
        }
    }

    pub fn validate(&self) -> AppResult<Pagination> {
        if self.target_page < 1 {
            return Err(AccountError::Validation("targetPage must be at least 1".into()).into());
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(AccountError::Validation(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            ))
            .into());
        }
        Ok(Pagination::new(self.target_page, self.page_size))
    }
}

/// 对外的账户视图，不含密码摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: i64,
    pub organization_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            organization_name: account.organization_name,
            email: account.email,
            phone: account.phone,
        }
    }
}

pub type AccountPage = PagedResult<AccountView>;

/// 登录与刷新的返回值，字段名固定为 snake_case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AccountError::Validation(format!("{} must not be empty", field)).into());
    }
    Ok(())
}

fn validate_email(email: &str) -> AppResult<()> {
    if !EmailAddress::is_valid(email) {
        return Err(AccountError::Validation(format!("'{}' is not a valid email address", email)).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sentinel_errors::AppError;
    use sentinel_ports::FieldValue;
    use serde_json::json;

    #[test]
    fn test_register_accepts_camel_case_alias() {
        let request: RegisterAccountRequest = serde_json::from_value(json!({
            "organizationName": "Acme",
            "email": "a@acme.io",
            "phone": "123",
            "password": "Secret1"
        }))
        .unwrap();

        assert_eq!(request.organization_name, "Acme");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_rejects_unknown_fields() {
        let result: Result<RegisterAccountRequest, _> = serde_json::from_value(json!({
            "organization_name": "Acme",
            "email": "a@acme.io",
            "password": "Secret1",
            "role": "admin"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_register_validation() {
        let mut request = RegisterAccountRequest {
            organization_name: "Acme".into(),
            email: "not-an-email".into(),
            phone: None,
            password: "Secret1".into(),
        };
        assert!(matches!(request.validate(), Err(AppError::BadRequest(_))));

        request.email = "a@acme.io".into();
        request.organization_name = "   ".into();
        assert!(matches!(request.validate(), Err(AppError::BadRequest(_))));

        request.organization_name = "Acme".into();
        request.password = String::new();
        assert!(matches!(request.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_into_fields_skips_absent() {
        let request = UpdateAccountRequest {
            organization_name: None,
            email: Some("new@acme.io".into()),
            phone: Some("456".into()),
        };
        assert!(request.validate().is_ok());

        let fields = request.into_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("email"), Some(&FieldValue::Text("new@acme.io".into())));
        assert!(fields.get("organization_name").is_none());
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(1, 10).validate().is_ok());
        assert!(PageRequest::new(1, 100).validate().is_ok());
        assert!(matches!(PageRequest::new(0, 10).validate(), Err(AppError::BadRequest(_))));
        assert!(matches!(PageRequest::new(1, 0).validate(), Err(AppError::BadRequest(_))));
        assert!(matches!(PageRequest::new(1, 101).validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_page_request_defaults_and_aliases() {
        let request: PageRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request, PageRequest::default());

        let request: PageRequest = serde_json::from_value(json!({"targetPage": 3, "pageSize": 25})).unwrap();
        assert_eq!(request, PageRequest::new(3, 25));
        assert_eq!(request.validate().unwrap().offset(), 50);
    }

    #[test]
    fn test_account_view_omits_hash() {
        let now = Utc::now();
        let view = AccountView::from(Account {
            id: 7,
            organization_name: "Acme".into(),
            email: "a@acme.io".into(),
            phone: None,
            hashed_password: "$argon2id$digest".into(),
            created_at: now,
            updated_at: now,
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["organizationName"], "Acme");
        assert!(!json.to_string().contains("argon2id"));
        assert!(json.get("hashedPassword").is_none());
    }

    #[test]
    fn test_token_pair_wire_keys() {
        let pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json, json!({"access_token": "a", "refresh_token": "r"}));
    }
}
