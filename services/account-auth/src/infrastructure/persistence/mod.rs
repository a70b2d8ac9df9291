//! PostgreSQL 持久化

mod account_store;
mod token_allow_list;

pub use account_store::*;
pub use token_allow_list::*;
