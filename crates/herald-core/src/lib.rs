//! # Herald Core
//!
//! Synchronous, in-process publish/subscribe.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Payloads**: type-erased values handed to listeners ([`Payload`])
//! - **Listeners**: shared callbacks and their removal policies
//!   ([`Listener`], [`ListenerOutcome`], [`RemovalPolicy`])
//! - **Properties**: typed property bag with coercion ([`PropertyBag`], [`coerce`])
//!
//! ### Framework Layer
//!
//! - **Registry**: per-event listener sequences ([`ListenerRegistry`])
//! - **Emitter**: `on` / `emit` / `off` ([`Emitter`])
//! - **Broadcaster**: cross-emitter relay and singleton slot ([`Message`], [`MessageSlot`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use herald_core::{Emitter, Listener, Message, Payload, Props, RemovalPolicy};
//!
//! let message = Message::new(Props::new());
//! let document = Emitter::new();
//!
//! // Anything emitted as "saved" on the document now reaches the broadcaster.
//! message.watch("saved", &document, Some("document"))?;
//! message.on(
//!     "saved",
//!     &Listener::from_fn(|p| println!("saved {:?}", p.as_str())),
//!     RemovalPolicy::Persistent,
//! )?;
//!
//! document.emit("saved", &Payload::new("report.txt"))?;
//! ```

pub mod error;
pub mod foundation;
pub mod framework;

pub use error::{EmitterError, EmitterResult, ListenerError, ListenerResult};
pub use foundation::{
    Listener, ListenerFn, ListenerOutcome, Payload, PropKind, PropertyBag, Props, RemovalPolicy,
    coerce,
};
pub use framework::{
    Emitter, GARBAGE_COLLECT, ListenerRecord, ListenerRegistry, Message, MessageSlot,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::error::{EmitterError, EmitterResult, ListenerResult};
    pub use super::foundation::{Listener, ListenerOutcome, Payload, Props, RemovalPolicy};
    pub use super::framework::{Emitter, GARBAGE_COLLECT, Message, MessageSlot};
}
