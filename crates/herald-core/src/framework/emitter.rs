//! The event emitter.
//!
//! An [`Emitter`] owns a [`ListenerRegistry`] and a [`PropertyBag`]. Listeners
//! are registered per event name and run synchronously, in registration
//! order, on the thread that calls [`Emitter::emit`].
//!
//! # Dispatch
//!
//! 1. A snapshot of the event's sequence is taken and the registry lock released
//! 2. Each record still active is claimed and invoked with the payload
//! 3. Records whose policy is exhausted, or whose listener returned
//!    [`ListenerOutcome::RemoveListener`], are removed
//! 4. A listener error stops the dispatch and is returned to the caller
//!
//! Because no lock is held while a listener runs, listeners may freely call
//! `on`, `off*` and `emit` on the same emitter.
//!
//! ```rust,ignore
//! use herald_core::{Emitter, Listener, Payload, RemovalPolicy};
//!
//! let emitter = Emitter::new();
//! let greet = Listener::from_fn(|p| println!("hello {:?}", p.as_str()));
//!
//! emitter
//!     .on("greet", &greet, RemovalPolicy::Times(2))?
//!     .emit("greet", &Payload::new("world"))?;
//!
//! emitter.off_listener("greet", &greet);
//! ```

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{Level, debug, span, trace};

use crate::error::{EmitterError, EmitterResult};
use crate::foundation::listener::{Listener, ListenerOutcome, RemovalPolicy};
use crate::foundation::payload::Payload;
use crate::foundation::props::{PropertyBag, Props};
use crate::framework::registry::ListenerRegistry;

/// Registers, dispatches and removes named-event listeners.
///
/// # Thread Safety
///
/// `Emitter` is `Send + Sync`; its state sits behind `parking_lot` mutexes
/// that are never held across a listener call.
#[derive(Default)]
pub struct Emitter {
    registry: Mutex<ListenerRegistry>,
    props: Mutex<PropertyBag>,
}

impl Emitter {
    /// Creates an emitter with no listeners and no properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an emitter and applies `props` through the coercion rules.
    pub fn with_props(props: impl Into<Props>) -> Self {
        Self::with_properties(PropertyBag::new(), props)
    }

    /// Creates an emitter from declared properties, then applies `props`.
    pub fn with_properties(mut declared: PropertyBag, props: impl Into<Props>) -> Self {
        declared.set(props);
        Self {
            registry: Mutex::new(ListenerRegistry::new()),
            props: Mutex::new(declared),
        }
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Registers `listener` for `name`.
    ///
    /// # Errors
    ///
    /// [`EmitterError::InvalidArgument`] if `name` is empty.
    pub fn on(
        &self,
        name: &str,
        listener: &Listener,
        policy: impl Into<RemovalPolicy>,
    ) -> EmitterResult<&Self> {
        self.on_optional(name, Some(listener), policy)
    }

    /// Registers `listener` for `name` if one is given.
    ///
    /// Without a listener this returns the emitter untouched and creates no
    /// sequence for `name`. The name is still validated.
    pub fn on_optional(
        &self,
        name: &str,
        listener: Option<&Listener>,
        policy: impl Into<RemovalPolicy>,
    ) -> EmitterResult<&Self> {
        if name.is_empty() {
            return Err(EmitterError::invalid_argument(
                "an event name is required to register a listener",
            ));
        }
        if let Some(listener) = listener {
            self.attach(name, listener.clone(), policy.into());
        }
        Ok(self)
    }

    /// Registers without validating the name.
    pub(crate) fn attach(&self, name: &str, listener: Listener, policy: RemovalPolicy) -> u64 {
        let id = self.registry.lock().insert(name, listener, policy.clone());
        trace!(event = %name, id, ?policy, "Listener registered");
        id
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Dispatches `payload` to every listener of `name`.
    ///
    /// Emitting an event nobody listens to is a no-op.
    ///
    /// # Errors
    ///
    /// [`EmitterError::Listener`] if a listener fails; listeners after it are
    /// not invoked for this dispatch.
    pub fn emit(&self, name: &str, payload: &Payload) -> EmitterResult<&Self> {
        let records = self.registry.lock().snapshot(name);
        if records.is_empty() {
            trace!(event = %name, "No listeners registered");
            return Ok(self);
        }

        let span = span!(Level::TRACE, "emit", event = %name, listeners = records.len());
        let _enter = span.enter();

        for record in records {
            let Some(last_call) = record.claim() else {
                continue;
            };

            let outcome = match record.listener().call(payload) {
                Ok(outcome) => outcome,
                Err(source) => {
                    if last_call {
                        self.registry.lock().remove_record(name, record.id());
                    }
                    return Err(EmitterError::listener(name, source));
                }
            };

            if last_call || outcome == ListenerOutcome::RemoveListener {
                self.registry.lock().remove_record(name, record.id());
                debug!(
                    event = %name,
                    id = record.id(),
                    requested = outcome == ListenerOutcome::RemoveListener,
                    "Listener removed after dispatch"
                );
            }
        }

        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------------

    /// Removes every listener of `name`.
    pub fn off(&self, name: &str) -> &Self {
        let removed = self.registry.lock().remove_event(name);
        if removed > 0 {
            debug!(event = %name, removed, "Event listeners removed");
        }
        self
    }

    /// Removes the listeners of `name` that are the same handle as `listener`.
    pub fn off_listener(&self, name: &str, listener: &Listener) -> &Self {
        let removed = self.registry.lock().remove_listener(name, listener);
        if removed > 0 {
            debug!(event = %name, removed, "Listener removed by reference");
        }
        self
    }

    /// Removes the listeners of `name` registered with `tag`.
    pub fn off_tag(&self, name: &str, tag: &str) -> &Self {
        let removed = self.registry.lock().remove_tagged(name, tag);
        if removed > 0 {
            debug!(event = %name, tag, removed, "Listener removed by tag");
        }
        self
    }

    /// Removes every listener of every event.
    pub fn clear(&self) -> &Self {
        let removed = self.registry.lock().clear();
        debug!(removed, "All listeners removed");
        self
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Returns the number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry.lock().listener_count(name)
    }

    /// Returns `true` if at least one listener is registered for `name`.
    pub fn is_listening(&self, name: &str) -> bool {
        self.listener_count(name) > 0
    }

    /// Returns the number of listeners across all events.
    pub fn total_listeners(&self) -> usize {
        self.registry.lock().total_listeners()
    }

    /// Returns the names of events with listeners, sorted.
    pub fn event_names(&self) -> Vec<String> {
        self.registry.lock().event_names()
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// Applies property assignments, coercing against existing values.
    pub fn set(&self, props: impl Into<Props>) -> &Self {
        self.props.lock().set(props);
        self
    }

    /// Declares a property with a default value.
    pub fn declare(&self, key: impl Into<String>, default: impl Into<Value>) -> &Self {
        self.props.lock().declare(key, default);
        self
    }

    /// Returns a copy of a property value.
    pub fn prop(&self, key: &str) -> Option<Value> {
        self.props.lock().get(key).cloned()
    }

    /// Returns a copy of all properties.
    pub fn properties(&self) -> PropertyBag {
        self.props.lock().clone()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("events", &self.event_names())
            .field("listeners", &self.total_listeners())
            .finish()
    }
}
