//! Account Auth Service Library
//!
//! - `domain`: 账户与令牌记录实体、允许列表端口
//! - `infrastructure`: PostgreSQL 存储与 schema 迁移
//! - `application`: 认证闸门、账户与会话业务操作

pub mod application;
pub mod context;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use context::AppContext;
