//! Request authentication
//!
//! Extractors resolving the calling user from a JWT.

pub mod auth;

pub use auth::{AdminUser, AuthError, AuthUser, Claims, MaybeAuthUser};
