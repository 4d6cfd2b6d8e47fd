//! Framework layer - registration, dispatch and broadcasting.
//!
//! This module contains the event machinery:
//! - Listener registry with snapshot-safe removal
//! - The emitter (`on` / `emit` / `off`)
//! - The broadcaster and its singleton slot

pub mod emitter;
pub mod message;
pub mod registry;

pub use emitter::Emitter;
pub use message::{GARBAGE_COLLECT, Message, MessageSlot};
pub use registry::{ListenerRecord, ListenerRegistry};
