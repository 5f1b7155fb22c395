//! Tool configuration.

#[expect(clippy::module_inception, reason = "Config type lives in its own file")]
mod config;

pub use config::{Config, DEFAULT_CONFIG_TOML};
