//! # Herald
//!
//! Synchronous, in-process events for Rust.
//!
//! ## Overview
//!
//! Any component can own an [`Emitter`](herald_core::Emitter) and publish named
//! events to its listeners. A single broadcaster, the
//! [`Message`](herald_core::Message), relays selected events from many emitters
//! so that unrelated parts of a program can react to each other without holding
//! direct references.
//!
//! ```text
//! ┌──────────┐  watch("saved")  ┌─────────┐
//! │ Emitter  │─────────────────▶│         │──▶ listener
//! └──────────┘                  │ Message │──▶ listener
//! ┌──────────┐  watch("closed") │         │──▶ ...
//! │ Emitter  │─────────────────▶│         │
//! └──────────┘                  └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::new()?;
//!     let document = runtime.emitter(Props::new().with("title", "report"));
//!
//!     runtime.watch("saved", &document, Some("document"))?;
//!     runtime.message().on(
//!         "saved",
//!         &Listener::from_fn(|payload| info!(file = ?payload.as_str(), "saved")),
//!         RemovalPolicy::Persistent,
//!     )?;
//!
//!     document.emit("saved", &Payload::new("report.txt"))?;
//!     runtime.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): load `herald.toml`
//! - `yaml-config`: load `herald.yaml`
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    // Runtime - composition root
    pub use herald_runtime::{HeraldConfig, HeraldRuntime, RuntimeError, RuntimeResult};

    // Events
    pub use herald_core::prelude::*;
    pub use herald_core::{PropertyBag, coerce};

    // Logging macros
    pub use herald_runtime::prelude::*;
}
