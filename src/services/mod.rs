//! Business logic services

pub mod auth;
pub mod conversion;
pub mod readings;

pub use auth::AuthService;
pub use conversion::{compute_cik, redo_cik};
pub use readings::{ConversionContext, MemberReadings};
