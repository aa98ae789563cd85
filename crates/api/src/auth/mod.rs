//! JWT access-token handling.

pub mod jwt;

pub use jwt::{generate_access_token, validate_token, Claims, JwtConfig};
