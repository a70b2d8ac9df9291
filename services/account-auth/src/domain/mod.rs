//! 领域层

mod account;
mod repositories;
mod token_record;

pub use account::*;
pub use repositories::*;
pub use token_record::*;
