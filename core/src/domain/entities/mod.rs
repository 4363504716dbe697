//! Domain entities representing core business objects.

pub mod token;
pub mod user;


// Re-export commonly used types
pub use token::{
    Claims, NewRefreshToken, RefreshToken, RefreshTokenState, DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
    DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
};
pub use user::User;
