//! Herald Runtime - configuration, logging and composition root.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `HeraldConfig`)
//! - Logging setup from configuration (`LoggingBuilder`)
//! - The runtime that owns the broadcaster (`HeraldRuntime`)
//!
//! ```ignore
//! use herald_runtime::HeraldRuntime;
//!
//! fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::new()?;
//!     let document = runtime.emitter(Props::new());
//!     runtime.watch("saved", &document, None)?;
//!     runtime.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, HeraldConfig, LoggingConfig, MessageConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HeraldRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
