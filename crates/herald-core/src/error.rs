//! Error types for the Herald core.
//!
//! Listener failures are boxed so callbacks can return any error type; the
//! emitter wraps them with the event name they were dispatched for.

use thiserror::Error;

/// Error returned by a listener callback.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Emitter Errors
// =============================================================================

/// Errors that can occur while registering, dispatching or constructing emitters.
#[derive(Debug, Error)]
pub enum EmitterError {
    /// A required argument was missing or empty.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// A second broadcaster was constructed while one is already installed.
    #[error("only one message instance can be used at any one time, use Message::instance")]
    SingletonViolation,

    /// A listener failed while an event was being dispatched.
    #[error("listener for '{event}' failed: {source}")]
    Listener {
        /// The event being dispatched.
        event: String,
        /// The error returned by the listener.
        source: ListenerError,
    },
}

impl EmitterError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Wraps a listener failure for the given event.
    pub fn listener(event: impl Into<String>, source: ListenerError) -> Self {
        Self::Listener {
            event: event.into(),
            source,
        }
    }

    /// Returns `true` if this error came from a listener callback.
    pub fn is_listener(&self) -> bool {
        matches!(self, Self::Listener { .. })
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for emitter operations.
pub type EmitterResult<T> = Result<T, EmitterError>;

/// Result type returned by listener callbacks.
pub type ListenerResult = Result<crate::foundation::listener::ListenerOutcome, ListenerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_listener_error_keeps_source() {
        let err = EmitterError::listener("tick", "boom".into());
        assert!(err.is_listener());
        assert_eq!(err.to_string(), "listener for 'tick' failed: boom");
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".into()));
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = EmitterError::invalid_argument("event name must not be empty");
        assert!(!err.is_listener());
        assert_eq!(
            err.to_string(),
            "invalid argument: event name must not be empty"
        );
    }
}
