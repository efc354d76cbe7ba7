//! Logging utilities
//!
//! The crate logs through the `log` facade. Binaries call [`init`] once to
//! install `env_logger`; `RUST_LOG` overrides the default `info` filter.

pub use log::{debug, error, info, trace, warn};

/// Default filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the logging system
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
        .init();
}

/// Initialize the logging system, tolerating an already installed logger
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
        .try_init()
}
