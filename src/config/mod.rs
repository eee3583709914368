//! Configuration management
//!
//! Node settings (listen address, submission queue capacity, spend policy and
//! log level) resolved from defaults, an optional TOML file and environment
//! overrides, plus the process-wide `GLOBAL_CONFIG` used by the binary.

pub mod settings;

pub use settings::{Config, Settings, GLOBAL_CONFIG};
