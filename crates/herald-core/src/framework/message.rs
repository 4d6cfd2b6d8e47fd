//! The broadcaster.
//!
//! A [`Message`] is an [`Emitter`] that other emitters can be bridged into with
//! [`Message::watch`]. Objects that never reference each other can then talk
//! through the broadcaster: one side watches an event on its source emitter,
//! the other listens for that event on the broadcaster.
//!
//! ```text
//! ┌──────────┐  emit("saved")  ┌─────────┐  emit("saved")  ┌────────────┐
//! │ Document │────────────────▶│ Message │────────────────▶│  Listener  │
//! │ (Emitter)│   relay (watch) │         │                 │ (anywhere) │
//! └──────────┘                 └─────────┘                 └────────────┘
//! ```
//!
//! # Instances
//!
//! Collaborators should receive an `Arc<Message>` explicitly. Composition
//! roots that want a single shared broadcaster use a [`MessageSlot`], which
//! holds at most one instance; [`Message::instance`] and friends operate on a
//! process-wide slot.
//!
//! # Garbage Collection
//!
//! Every broadcaster listens for [`GARBAGE_COLLECT`] on itself. Emitting it
//! with a topic name as payload drops every listener for that topic; emitting
//! it with no topic resets the broadcaster.
//!
//! ```rust,ignore
//! use herald_core::{GARBAGE_COLLECT, Message, Payload};
//!
//! let message = Message::instance(Props::new());
//! message.emit(GARBAGE_COLLECT, &Payload::new("document.saved"))?;
//! ```

use std::ops::Deref;
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{EmitterError, EmitterResult};
use crate::foundation::listener::{Listener, ListenerOutcome, RemovalPolicy};
use crate::foundation::payload::Payload;
use crate::foundation::props::Props;
use crate::framework::emitter::Emitter;

/// Reserved event asking a broadcaster to drop the listeners of a topic.
pub const GARBAGE_COLLECT: &str = "message.garbagecollect";

/// An emitter that relays events from other emitters.
pub struct Message {
    emitter: Emitter,
    this: Weak<Message>,
}

impl Message {
    /// Creates a standalone broadcaster.
    ///
    /// The instance is not registered anywhere; pass it to the components that
    /// need it.
    pub fn new(props: impl Into<Props>) -> Arc<Self> {
        let props = props.into();
        let message = Arc::new_cyclic(|this| Self {
            emitter: Emitter::with_props(props),
            this: this.clone(),
        });
        message.arm_garbage_collect();
        message
    }

    fn arm_garbage_collect(&self) {
        let this = self.this.clone();
        let hook = Listener::new(move |payload| {
            let Some(message) = this.upgrade() else {
                return Ok(ListenerOutcome::RemoveListener);
            };
            message.remove(payload.as_str());
            Ok(ListenerOutcome::Continue)
        });
        self.emitter.attach(GARBAGE_COLLECT, hook, RemovalPolicy::Persistent);
    }

    /// Relays `name` from `target` onto this broadcaster.
    ///
    /// Whenever `target` emits `name`, the broadcaster emits `name` with the
    /// same payload. When `identifier` is given the relay can be removed with
    /// `target.off_tag(name, identifier)`. The relay does not keep the
    /// broadcaster alive; once it is dropped the relay removes itself the next
    /// time it fires.
    ///
    /// # Errors
    ///
    /// [`EmitterError::InvalidArgument`] if `name` is empty.
    pub fn watch(
        &self,
        name: &str,
        target: &Emitter,
        identifier: Option<&str>,
    ) -> EmitterResult<&Self> {
        let this = self.this.clone();
        let event = name.to_owned();
        let relay = Listener::new(move |payload| {
            let Some(message) = this.upgrade() else {
                return Ok(ListenerOutcome::RemoveListener);
            };
            message.emit(&event, payload)?;
            Ok(ListenerOutcome::Continue)
        });

        let policy = identifier.map_or(RemovalPolicy::Persistent, |id| {
            RemovalPolicy::Tagged(id.to_owned())
        });
        target.on(name, &relay, policy)?;
        debug!(event = %name, identifier, "Watching emitter");
        Ok(self)
    }

    /// Drops the listeners of `name`, or of every event when `name` is `None`.
    ///
    /// A full reset re-arms the garbage-collect hook afterwards, so
    /// [`GARBAGE_COLLECT`] stays registered with exactly one listener. Only
    /// `remove(Some(GARBAGE_COLLECT))` takes the hook away.
    pub fn remove(&self, name: Option<&str>) -> &Self {
        match name {
            Some(name) => {
                self.emitter.off(name);
            }
            None => {
                self.emitter.clear();
                self.arm_garbage_collect();
            }
        }
        self
    }

    /// Returns the underlying emitter.
    pub fn as_emitter(&self) -> &Emitter {
        &self.emitter
    }
}

impl Deref for Message {
    type Target = Emitter;

    fn deref(&self) -> &Self::Target {
        &self.emitter
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("emitter", &self.emitter)
            .finish()
    }
}

// ─── Singleton slot ───────────────────────────────────────────────────────────

/// Holds at most one broadcaster.
#[derive(Debug, Default)]
pub struct MessageSlot {
    current: Mutex<Option<Arc<Message>>>,
}

impl MessageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the installed broadcaster, creating it from `props` if needed.
    ///
    /// `props` are ignored when an instance already exists.
    pub fn instance(&self, props: impl Into<Props>) -> Arc<Message> {
        let mut current = self.current.lock();
        if let Some(message) = current.as_ref() {
            return Arc::clone(message);
        }
        let message = Message::new(props);
        *current = Some(Arc::clone(&message));
        info!("Message instance created");
        message
    }

    /// Creates and installs a broadcaster.
    ///
    /// # Errors
    ///
    /// [`EmitterError::SingletonViolation`] if the slot is occupied.
    pub fn create(&self, props: impl Into<Props>) -> EmitterResult<Arc<Message>> {
        let mut current = self.current.lock();
        if current.is_some() {
            return Err(EmitterError::SingletonViolation);
        }
        let message = Message::new(props);
        *current = Some(Arc::clone(&message));
        info!("Message instance created");
        Ok(message)
    }

    /// Returns the installed broadcaster, if any.
    pub fn current(&self) -> Option<Arc<Message>> {
        self.current.lock().clone()
    }

    /// Uninstalls and returns the broadcaster.
    pub fn release(&self) -> Option<Arc<Message>> {
        let released = self.current.lock().take();
        if released.is_some() {
            info!("Message instance released");
        }
        released
    }

    pub fn is_occupied(&self) -> bool {
        self.current.lock().is_some()
    }
}

static GLOBAL_SLOT: LazyLock<MessageSlot> = LazyLock::new(MessageSlot::new);

impl Message {
    /// Process-wide accessor: the shared broadcaster, created on first use.
    pub fn instance(props: impl Into<Props>) -> Arc<Message> {
        GLOBAL_SLOT.instance(props)
    }

    /// Creates the process-wide broadcaster.
    ///
    /// # Errors
    ///
    /// [`EmitterError::SingletonViolation`] if one already exists; use
    /// [`Message::instance`] instead.
    pub fn create(props: impl Into<Props>) -> EmitterResult<Arc<Message>> {
        GLOBAL_SLOT.create(props)
    }

    /// Returns the process-wide broadcaster, if one exists.
    pub fn current() -> Option<Arc<Message>> {
        GLOBAL_SLOT.current()
    }

    /// Uninstalls the process-wide broadcaster.
    pub fn release() -> Option<Arc<Message>> {
        GLOBAL_SLOT.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener = Listener::from_fn(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn test_slot_returns_one_instance() {
        let slot = MessageSlot::new();
        let first = slot.instance(Props::new());
        let second = slot.instance(Props::new());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_slot_create_twice_fails() {
        let slot = MessageSlot::new();
        let first = slot.create(Props::new()).unwrap();

        let err = slot.create(Props::new()).unwrap_err();
        assert!(matches!(err, EmitterError::SingletonViolation));
        assert!(Arc::ptr_eq(&first, &slot.current().unwrap()));
    }

    #[test]
    fn test_slot_create_after_instance_fails() {
        let slot = MessageSlot::new();
        slot.instance(Props::new());
        assert!(slot.create(Props::new()).is_err());
    }

    #[test]
    fn test_slot_release_allows_new_instance() {
        let slot = MessageSlot::new();
        let first = slot.instance(Props::new());
        let released = slot.release().unwrap();
        assert!(Arc::ptr_eq(&first, &released));
        assert!(!slot.is_occupied());

        let second = slot.create(Props::new()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_instance_ignores_props_once_created() {
        let slot = MessageSlot::new();
        slot.instance(Props::new().with("name", "bus"));
        let again = slot.instance(Props::new().with("name", "other"));
        assert_eq!(again.prop("name"), Some(json!("bus")));
    }

    #[test]
    fn test_global_singleton_lifecycle() {
        // The only test touching the process-wide slot.
        let first = Message::instance(Props::new());
        let second = Message::instance(Props::new());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(
            Message::create(Props::new()),
            Err(EmitterError::SingletonViolation)
        ));
        assert!(Arc::ptr_eq(&first, &Message::current().unwrap()));

        Message::release();
        assert!(Message::current().is_none());
        let fresh = Message::create(Props::new()).unwrap();
        assert!(!Arc::ptr_eq(&first, &fresh));
        Message::release();
    }

    #[test]
    fn test_watch_relays_events() {
        let message = Message::new(Props::new());
        let emitter = Emitter::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let r = Arc::clone(&received);

        message
            .watch("test.event", &emitter, None)
            .unwrap()
            .on(
                "test.event",
                &Listener::from_fn(move |p| {
                    r.lock().push(p.downcast_ref::<u32>().copied());
                }),
                RemovalPolicy::Persistent,
            )
            .unwrap();

        emitter.emit("test.event", &Payload::new(7_u32)).unwrap();

        assert_eq!(*received.lock(), vec![Some(7)]);
    }

    #[test]
    fn test_watch_only_relays_the_named_event() {
        let message = Message::new(Props::new());
        let emitter = Emitter::new();
        let (count, listener) = counter();
        message.watch("a", &emitter, None).unwrap();
        message.on("b", &listener, RemovalPolicy::Persistent).unwrap();

        emitter.emit("b", &Payload::none()).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_watch_identifier_removes_relay() {
        let message = Message::new(Props::new());
        let emitter = Emitter::new();
        let (count, listener) = counter();
        message.watch("x", &emitter, Some("relay")).unwrap();
        message.on("x", &listener, RemovalPolicy::Persistent).unwrap();

        emitter.off_tag("x", "relay");
        emitter.emit("x", &Payload::none()).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!emitter.is_listening("x"));
    }

    #[test]
    fn test_relay_removes_itself_after_drop() {
        let emitter = Emitter::new();
        let message = Message::new(Props::new());
        message.watch("x", &emitter, None).unwrap();
        drop(message);

        emitter.emit("x", &Payload::none()).unwrap();

        assert!(!emitter.is_listening("x"));
    }

    #[test]
    fn test_relay_propagates_listener_errors() {
        let message = Message::new(Props::new());
        let emitter = Emitter::new();
        message.watch("x", &emitter, None).unwrap();
        message
            .on(
                "x",
                &Listener::new(|_| Err("rejected".into())),
                RemovalPolicy::Persistent,
            )
            .unwrap();

        let err = emitter.emit("x", &Payload::none()).unwrap_err();
        assert!(err.is_listener());
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn test_garbage_collect_drops_topic() {
        let message = Message::new(Props::new());
        let (kept, kept_listener) = counter();
        let (dropped, dropped_listener) = counter();
        message.on("keep", &kept_listener, RemovalPolicy::Persistent).unwrap();
        message.on("drop", &dropped_listener, RemovalPolicy::Persistent).unwrap();

        message
            .emit(GARBAGE_COLLECT, &Payload::new("drop"))
            .unwrap()
            .emit("keep", &Payload::none())
            .unwrap()
            .emit("drop", &Payload::none())
            .unwrap();

        assert_eq!(kept.load(Ordering::SeqCst), 1);
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        assert!(message.is_listening(GARBAGE_COLLECT));
    }

    #[test]
    fn test_garbage_collect_without_topic_resets() {
        let message = Message::new(Props::new());
        let (_, listener) = counter();
        message.on("a", &listener, RemovalPolicy::Persistent).unwrap();
        message.on("b", &listener, RemovalPolicy::Persistent).unwrap();

        message.emit(GARBAGE_COLLECT, &Payload::none()).unwrap();

        assert_eq!(message.event_names(), vec![GARBAGE_COLLECT.to_string()]);
        assert_eq!(message.listener_count(GARBAGE_COLLECT), 1);
    }

    #[test]
    fn test_remove_by_name() {
        let message = Message::new(Props::new());
        let (count, listener) = counter();
        message.on("a", &listener, RemovalPolicy::Persistent).unwrap();
        message.on("b", &listener, RemovalPolicy::Persistent).unwrap();

        message.remove(Some("a"));
        message.emit("a", &Payload::none()).unwrap();
        message.emit("b", &Payload::none()).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_all_keeps_garbage_collect_hook() {
        let message = Message::new(Props::new());
        let (_, listener) = counter();
        message.on("a", &listener, RemovalPolicy::Persistent).unwrap();

        message.remove(None).remove(None);

        assert!(!message.is_listening("a"));
        assert_eq!(message.listener_count(GARBAGE_COLLECT), 1);
    }

    #[test]
    fn test_isolated_instances_are_independent() {
        let first = Message::new(Props::new());
        let second = Message::new(Props::new());
        let (count, listener) = counter();
        first.on("x", &listener, RemovalPolicy::Persistent).unwrap();

        second.emit("x", &Payload::none()).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
