//! Configuration for the Herald runtime.
//!
//! Layered loading via figment, a serde schema and validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    HeraldConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, MessageConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
