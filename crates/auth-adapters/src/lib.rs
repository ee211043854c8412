//! # auth-adapters
//!
//! Credential checking and session token generation for the admin login.

pub mod credentials;
pub mod token;

pub use credentials::{hash_password, StaticCredentials};
pub use token::RandomTokenSource;
