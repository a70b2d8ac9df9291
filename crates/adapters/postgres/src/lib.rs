//! sentinel-adapter-postgres - PostgreSQL 适配器

mod connection;
mod entity_store;
mod error;
mod migration;
mod rows;
mod statement;
mod transaction;

pub use connection::*;
pub use entity_store::*;
pub use error::*;
pub use migration::*;
pub use statement::{Statement, bind_all};
pub use transaction::*;
