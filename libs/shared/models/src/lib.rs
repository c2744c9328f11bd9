pub mod error;
pub mod roles;
