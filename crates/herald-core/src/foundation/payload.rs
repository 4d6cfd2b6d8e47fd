//! Type-erased event payloads.
//!
//! A [`Payload`] wraps any `Send + Sync` value in an `Arc` so it can be handed
//! to every listener of an event without cloning the value itself. Listeners
//! recover the concrete type with [`Payload::downcast_ref`].
//!
//! ```rust,ignore
//! use herald_core::Payload;
//!
//! let payload = Payload::new(42_u32);
//! assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
//!
//! let empty = Payload::none();
//! assert!(empty.is_none());
//! ```

use std::any::Any;
use std::sync::Arc;

/// A cheaply clonable, possibly empty event payload.
#[derive(Clone, Default)]
pub struct Payload {
    inner: Option<Arc<dyn Any + Send + Sync>>,
}

impl Payload {
    /// Wraps a value as a payload.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
        }
    }

    /// An empty payload, for events that carry no data.
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// Returns `true` if the payload carries no value.
    pub fn is_none(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns `true` if the payload holds a value of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.as_ref().is_some_and(|v| v.is::<T>())
    }

    /// Attempts to downcast to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_ref()?.downcast_ref()
    }

    /// Reads the payload as a string slice.
    ///
    /// Accepts both `String` and `&'static str` payloads.
    pub fn as_str(&self) -> Option<&str> {
        if let Some(s) = self.downcast_ref::<String>() {
            return Some(s.as_str());
        }
        self.downcast_ref::<&'static str>().copied()
    }

    /// Returns `true` if both payloads share the same underlying value.
    pub fn ptr_eq(&self, other: &Payload) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (None, None) => true,
            _ => false,
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Some(s) => f.debug_tuple("Payload").field(&s).finish(),
            None if self.is_none() => f.write_str("Payload(None)"),
            None => f.write_str("Payload(..)"),
        }
    }
}
