//! sentinel-bootstrap - 服务启动骨架
//!
//! 日志初始化、连接池创建、健康检查端点与优雅关闭

mod database;
mod health;
mod runtime;

pub use database::*;
pub use health::*;
pub use runtime::*;
