pub mod auth;
pub mod backend;
