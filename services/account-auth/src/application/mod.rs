//! 应用层

mod account_service;
pub mod dto;
mod gate;
mod password;
mod session_service;

pub use account_service::*;
pub use gate::*;
pub use password::*;
pub use session_service::*;
