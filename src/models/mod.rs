//! Data models

mod meter;
mod preferences;
mod reading;
mod time_interval;
mod unit;
mod user;

pub use meter::*;
pub use preferences::*;
pub use reading::*;
pub use time_interval::*;
pub use unit::*;
pub use user::*;
