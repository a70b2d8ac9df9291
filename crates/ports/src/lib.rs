//! ports - 抽象 trait 层
//!
//! 定义与具体数据库无关的实体存储接口

mod entity;
mod entity_store;
mod field;

pub use entity::*;
pub use entity_store::*;
pub use field::*;
