//! Driver configuration
//!
//! [`DriverConfig`] carries the bus and timing parameters of the driver.
//! Boards embed a small TOML file which [`parse_config`] turns into one.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ConfigError};
pub use types::*;
