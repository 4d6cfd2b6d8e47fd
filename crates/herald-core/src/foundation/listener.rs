//! Listener handles and removal policies.
//!
//! A [`Listener`] is a shared callback. Cloning it yields another handle to the
//! same callback, and handles compare equal only when they come from the same
//! original, which is what [`Emitter::off_listener`] matches on.
//!
//! Each registration also carries a [`RemovalPolicy`] deciding when the
//! listener is dropped automatically:
//!
//! | Policy | Behaviour |
//! |---|---|
//! | `Persistent` | Only removed by `off*` or by returning [`ListenerOutcome::RemoveListener`] |
//! | `Times(n)` | Removed after its `n`-th call |
//! | `Once` | Removed after its first call |
//! | `Tagged(id)` | Like `Persistent`, but removable with `off_tag(name, id)` |
//!
//! [`Emitter::off_listener`]: crate::framework::emitter::Emitter::off_listener

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ListenerResult;
use crate::foundation::payload::Payload;

/// What a listener asks the emitter to do after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerOutcome {
    /// Keep the listener registered (subject to its removal policy).
    #[default]
    Continue,
    /// Remove the listener now, whatever its removal policy.
    RemoveListener,
}

/// The rule governing when a listener is unregistered automatically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Never removed automatically.
    #[default]
    Persistent,
    /// Removed after the given number of calls. Zero behaves like one.
    Times(u32),
    /// Removed after the first call.
    Once,
    /// Never removed automatically; the identifier allows targeted removal.
    Tagged(String),
}

impl RemovalPolicy {
    /// Number of calls this policy allows, or `None` when unlimited.
    pub fn call_budget(&self) -> Option<u32> {
        match self {
            Self::Times(n) => Some((*n).max(1)),
            Self::Once => Some(1),
            Self::Persistent | Self::Tagged(_) => None,
        }
    }

    /// The identifier attached to a `Tagged` policy.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tagged(tag) => Some(tag),
            _ => None,
        }
    }
}

impl From<bool> for RemovalPolicy {
    fn from(once: bool) -> Self {
        if once { Self::Once } else { Self::Persistent }
    }
}

impl From<u32> for RemovalPolicy {
    fn from(times: u32) -> Self {
        Self::Times(times)
    }
}

impl From<&str> for RemovalPolicy {
    fn from(tag: &str) -> Self {
        Self::Tagged(tag.to_owned())
    }
}

impl From<String> for RemovalPolicy {
    fn from(tag: String) -> Self {
        Self::Tagged(tag)
    }
}

/// A type-erased listener callback.
pub type ListenerFn = dyn Fn(&Payload) -> ListenerResult + Send + Sync;

/// A shared, identity-comparable listener handle.
#[derive(Clone)]
pub struct Listener {
    callback: Arc<ListenerFn>,
}

impl Listener {
    /// Creates a listener from a fallible callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Payload) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(f),
        }
    }

    /// Creates a listener that always stays registered and never fails.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        Self::new(move |payload| {
            f(payload);
            Ok(ListenerOutcome::Continue)
        })
    }

    /// Invokes the callback.
    pub fn call(&self, payload: &Payload) -> ListenerResult {
        (self.callback)(payload)
    }

    /// Returns `true` if both handles refer to the same callback.
    pub fn same_as(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.callback), Arc::as_ptr(&other.callback))
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Listener {}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &Arc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_are_identical() {
        let a = Listener::from_fn(|_| {});
        let b = a.clone();
        let c = Listener::from_fn(|_| {});
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_call_returns_outcome() {
        let keep = Listener::from_fn(|_| {});
        let drop = Listener::new(|_| Ok(ListenerOutcome::RemoveListener));
        assert_eq!(keep.call(&Payload::none()).unwrap(), ListenerOutcome::Continue);
        assert_eq!(
            drop.call(&Payload::none()).unwrap(),
            ListenerOutcome::RemoveListener
        );
    }

    #[test]
    fn test_policy_conversions() {
        assert_eq!(RemovalPolicy::from(true), RemovalPolicy::Once);
        assert_eq!(RemovalPolicy::from(false), RemovalPolicy::Persistent);
        assert_eq!(RemovalPolicy::from(3_u32), RemovalPolicy::Times(3));
        assert_eq!(RemovalPolicy::from("relay"), RemovalPolicy::Tagged("relay".into()));
    }

    #[test]
    fn test_call_budget() {
        assert_eq!(RemovalPolicy::Persistent.call_budget(), None);
        assert_eq!(RemovalPolicy::Tagged("x".into()).call_budget(), None);
        assert_eq!(RemovalPolicy::Once.call_budget(), Some(1));
        assert_eq!(RemovalPolicy::Times(4).call_budget(), Some(4));
        assert_eq!(RemovalPolicy::Times(0).call_budget(), Some(1));
    }
}
