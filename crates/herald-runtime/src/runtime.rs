//! Composition root: configuration, logging and the broadcaster.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! // Loads herald.toml from the current directory, or defaults.
//! let runtime = HeraldRuntime::new()?;
//!
//! let document = runtime.emitter(Props::new());
//! runtime.watch("saved", &document, Some("document"))?;
//! ```

use std::sync::Arc;

use herald_core::{Emitter, Message, Props};
use tracing::{debug, info};

use crate::config::{ConfigLoader, HeraldConfig};
use crate::error::RuntimeResult;
use crate::logging;

/// Snapshot of the broadcaster's registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Events with at least one listener, the garbage-collect hook included.
    pub topics: usize,
    /// Listeners across all events.
    pub listeners: usize,
}

/// Owns the configuration and the broadcaster handed to application code.
///
/// A global runtime holds the process-wide slot until it is shut down or
/// dropped, whichever comes first.
#[derive(Debug)]
pub struct HeraldRuntime {
    config: HeraldConfig,
    message: Arc<Message>,
    /// Whether this runtime put `message` into the process-wide slot.
    installed: bool,
}

impl HeraldRuntime {
    /// Creates a runtime, loading configuration from the default locations.
    ///
    /// A configuration that fails to load is reported on stderr and replaced by
    /// defaults, since logging is not set up yet at that point.
    pub fn new() -> RuntimeResult<Self> {
        let config = ConfigLoader::new()
            .with_current_dir()
            .with_user_config_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                HeraldConfig::default()
            });

        Self::from_config(&config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration.
    ///
    /// # Errors
    ///
    /// [`herald_core::EmitterError::SingletonViolation`] when `message.global`
    /// is set and the process-wide slot is already occupied.
    pub fn from_config(config: &HeraldConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);

        let props = config.message.to_props();
        let (message, installed) = if config.message.global {
            (Message::create(props)?, true)
        } else {
            (Message::new(props), false)
        };

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            global = installed,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config: config.clone(),
            message,
            installed,
        })
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// Returns the broadcaster.
    pub fn message(&self) -> &Arc<Message> {
        &self.message
    }

    /// Whether the broadcaster lives in the process-wide slot.
    pub fn is_global(&self) -> bool {
        self.installed
    }

    /// Creates an emitter with the given initial properties.
    pub fn emitter(&self, props: impl Into<Props>) -> Emitter {
        Emitter::with_props(props)
    }

    /// Relays `name` from `target` onto the broadcaster.
    pub fn watch(
        &self,
        name: &str,
        target: &Emitter,
        identifier: Option<&str>,
    ) -> RuntimeResult<()> {
        self.message.watch(name, target, identifier)?;
        Ok(())
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            topics: self.message.event_names().len(),
            listeners: self.message.total_listeners(),
        }
    }

    /// Drops every broadcaster listener and frees the process-wide slot if
    /// this runtime filled it.
    pub fn shutdown(mut self) {
        let stats = self.stats();
        self.message.remove(None);
        self.release_slot();

        info!(
            topics = stats.topics,
            listeners = stats.listeners,
            "Runtime shut down"
        );
    }

    fn release_slot(&mut self) {
        if !std::mem::take(&mut self.installed) {
            return;
        }
        if Message::current().is_some_and(|current| Arc::ptr_eq(&current, &self.message)) {
            Message::release();
            debug!("Released process-wide message slot");
        }
    }
}

impl Drop for HeraldRuntime {
    fn drop(&mut self) {
        self.release_slot();
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`HeraldRuntime`] with custom configuration sources.
///
/// ```rust,ignore
/// let runtime = HeraldRuntime::builder()
///     .config_file("config/herald.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a programmatic configuration layer.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<HeraldRuntime> {
        let config = self.config_loader.load()?;
        HeraldRuntime::from_config(&config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use herald_core::{GARBAGE_COLLECT, Listener, Payload, RemovalPolicy};
    use serde_json::json;

    use super::*;
    use crate::error::RuntimeError;

    fn isolated_config() -> HeraldConfig {
        let mut config = HeraldConfig::default();
        config.message.global = false;
        config
    }

    #[test]
    fn test_isolated_runtime() {
        let runtime = HeraldRuntime::from_config(&isolated_config()).unwrap();
        assert!(!runtime.is_global());
        assert_eq!(
            runtime.stats(),
            RuntimeStats {
                topics: 1,
                listeners: 1
            }
        );
        assert!(runtime.message().is_listening(GARBAGE_COLLECT));
    }

    #[test]
    fn test_props_from_config() {
        let mut config = isolated_config();
        config.message.props.insert("name".into(), json!("bus"));

        let runtime = HeraldRuntime::from_config(&config).unwrap();
        assert_eq!(runtime.message().prop("name"), Some(json!("bus")));
    }

    #[test]
    fn test_watch_relays_to_message() {
        let runtime = HeraldRuntime::from_config(&isolated_config()).unwrap();
        let document = runtime.emitter(Props::new().with("title", "report"));
        runtime.watch("saved", &document, Some("document")).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        runtime
            .message()
            .on(
                "saved",
                &Listener::from_fn(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                RemovalPolicy::Persistent,
            )
            .unwrap();

        document.emit("saved", &Payload::none()).unwrap();
        document.emit("saved", &Payload::none()).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.stats().topics, 2);
    }

    #[test]
    fn test_watch_rejects_empty_name() {
        let runtime = HeraldRuntime::from_config(&isolated_config()).unwrap();
        let document = runtime.emitter(Props::new());
        let result = runtime.watch("", &document, None);
        assert!(matches!(result, Err(RuntimeError::Emitter(_))));
    }

    #[test]
    fn test_global_runtime_lifecycle() {
        let runtime = HeraldRuntime::from_config(&HeraldConfig::default()).unwrap();
        assert!(runtime.is_global());
        let current = Message::current().unwrap();
        assert!(Arc::ptr_eq(&current, runtime.message()));

        // The slot is taken until the first runtime shuts down.
        let second = HeraldRuntime::from_config(&HeraldConfig::default());
        assert!(matches!(second, Err(RuntimeError::Emitter(_))));

        runtime.shutdown();
        assert!(Message::current().is_none());

        // Dropping without shutdown frees the slot as well.
        let again = HeraldRuntime::from_config(&HeraldConfig::default()).unwrap();
        assert!(again.is_global());
        drop(again);
        assert!(Message::current().is_none());

        let last = HeraldRuntime::from_config(&HeraldConfig::default()).unwrap();
        assert!(last.is_global());
        last.shutdown();
        assert!(Message::current().is_none());
    }

    #[test]
    fn test_builder_rejects_missing_file() {
        let result = HeraldRuntime::builder()
            .without_env()
            .config_file("/nonexistent/herald.toml")
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
