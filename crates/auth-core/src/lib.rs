//! sentinel-auth-core - 认证核心库
//!
//! 密码哈希、JWT Claims 与 access / refresh 两类令牌的签发和校验。
//! 这里不保存任何全局状态，实例在启动时按配置构造一次后注入使用方。

mod claims;
mod password;
mod token;

pub use claims::*;
pub use password::*;
pub use token::*;
