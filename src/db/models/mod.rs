//! Database models split into domain-specific modules.

pub mod catch_status;
pub mod fish;
pub mod user;

pub use catch_status::*;
pub use fish::*;
pub use user::*;
