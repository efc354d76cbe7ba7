//! Foundation module - shared utilities
//!
//! - Logging initialisation

pub mod logging;
