//! Schema module - Player configuration.

mod config;

pub use config::*;
