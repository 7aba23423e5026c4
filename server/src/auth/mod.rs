//! Bearer-token authentication: JWT issuance and verification, bcrypt
//! password hashing, and the request extractors that guard routes.

pub mod extract;
pub mod jwt;
pub mod password;

pub use extract::{AdminUser, AuthUser};
pub use jwt::{Claims, TokenKeys};
