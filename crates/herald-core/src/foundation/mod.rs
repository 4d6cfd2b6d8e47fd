//! Foundation layer - payloads, listener handles and property coercion.
//!
//! This module contains the building blocks the emitter is made of:
//! - Type-erased payloads passed to every listener
//! - Listener handles, outcomes and removal policies
//! - The property bag and its coercion rules

pub mod listener;
pub mod payload;
pub mod props;

pub use listener::{Listener, ListenerFn, ListenerOutcome, RemovalPolicy};
pub use payload::Payload;
pub use props::{PropKind, PropertyBag, Props, coerce};
