pub mod token;
pub mod user;

pub use token::{InMemoryTokenRepository, Rotation, TokenRepository};
pub use user::{InMemoryUserRepository, UserRepository};
