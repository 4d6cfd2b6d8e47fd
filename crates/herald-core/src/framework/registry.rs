//! Per-event listener storage.
//!
//! The registry maps event names to listener records in registration order.
//! Dispatch never iterates the live sequences: [`ListenerRegistry::snapshot`]
//! hands out shared records, and every record carries an `active` flag that
//! removal clears. A dispatch in progress skips records that were removed
//! after its snapshot was taken, so removing a listener mid-dispatch never
//! shifts or re-invokes its neighbours.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::foundation::listener::{Listener, RemovalPolicy};

/// A registered listener and its removal state.
#[derive(Debug)]
pub struct ListenerRecord {
    id: u64,
    listener: Listener,
    tag: Option<String>,
    /// Calls left for counted policies.
    remaining: Option<AtomicU32>,
    active: AtomicBool,
}

impl ListenerRecord {
    fn new(id: u64, listener: Listener, policy: RemovalPolicy) -> Self {
        Self {
            id,
            listener,
            remaining: policy.call_budget().map(AtomicU32::new),
            tag: match policy {
                RemovalPolicy::Tagged(tag) => Some(tag),
                _ => None,
            },
            active: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Reserves one invocation.
    ///
    /// Returns `None` if the record must not be invoked, otherwise whether this
    /// is the last call its policy allows. The last claim deactivates the
    /// record so nested dispatches skip it.
    pub fn claim(&self) -> Option<bool> {
        if !self.is_active() {
            return None;
        }
        let Some(remaining) = &self.remaining else {
            return Some(false);
        };
        let previous = remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()?;
        if previous == 1 {
            self.deactivate();
            Some(true)
        } else {
            Some(false)
        }
    }
}

/// Event name to listener sequence mapping.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    events: HashMap<String, Vec<Arc<ListenerRecord>>>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener to `name`'s sequence and returns the record id.
    pub fn insert(&mut self, name: &str, listener: Listener, policy: RemovalPolicy) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.events
            .entry(name.to_owned())
            .or_default()
            .push(Arc::new(ListenerRecord::new(id, listener, policy)));
        id
    }

    /// Returns the current sequence for `name`, empty when nothing listens.
    pub fn snapshot(&self, name: &str) -> Vec<Arc<ListenerRecord>> {
        self.events.get(name).cloned().unwrap_or_default()
    }

    /// Removes a single record by id.
    pub fn remove_record(&mut self, name: &str, id: u64) -> bool {
        self.remove_where(name, |record| record.id == id) > 0
    }

    /// Removes every record for `name` whose listener is `listener`.
    pub fn remove_listener(&mut self, name: &str, listener: &Listener) -> usize {
        self.remove_where(name, |record| record.listener.same_as(listener))
    }

    /// Removes every record for `name` registered with `tag`.
    pub fn remove_tagged(&mut self, name: &str, tag: &str) -> usize {
        self.remove_where(name, |record| record.tag() == Some(tag))
    }

    /// Drops the whole sequence for `name`.
    pub fn remove_event(&mut self, name: &str) -> usize {
        let Some(records) = self.events.remove(name) else {
            return 0;
        };
        records.iter().for_each(|record| record.deactivate());
        records.len()
    }

    /// Drops every sequence.
    pub fn clear(&mut self) -> usize {
        let mut removed = 0;
        for (_, records) in self.events.drain() {
            records.iter().for_each(|record| record.deactivate());
            removed += records.len();
        }
        removed
    }

    fn remove_where<F>(&mut self, name: &str, mut pred: F) -> usize
    where
        F: FnMut(&ListenerRecord) -> bool,
    {
        let Some(records) = self.events.get_mut(name) else {
            return 0;
        };
        let before = records.len();
        records.retain(|record| {
            if pred(record) {
                record.deactivate();
                false
            } else {
                true
            }
        });
        let removed = before - records.len();
        if records.is_empty() {
            self.events.remove(name);
        }
        removed
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.events.get(name).map_or(0, Vec::len)
    }

    pub fn total_listeners(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    /// Event names with at least one listener, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.events.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Listener {
        Listener::from_fn(|_| {})
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut registry = ListenerRegistry::new();
        let first = registry.insert("a", noop(), RemovalPolicy::Persistent);
        let second = registry.insert("a", noop(), RemovalPolicy::Persistent);

        let ids: Vec<u64> = registry.snapshot("a").iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(registry.listener_count("a"), 2);
    }

    #[test]
    fn test_snapshot_of_unknown_event_is_empty() {
        let registry = ListenerRegistry::new();
        assert!(registry.snapshot("missing").is_empty());
    }

    #[test]
    fn test_removal_deactivates_snapshot_records() {
        let mut registry = ListenerRegistry::new();
        let listener = noop();
        registry.insert("a", listener.clone(), RemovalPolicy::Persistent);
        let snapshot = registry.snapshot("a");

        assert_eq!(registry.remove_listener("a", &listener), 1);
        assert!(!snapshot[0].is_active());
        assert_eq!(snapshot[0].claim(), None);
    }

    #[test]
    fn test_empty_sequences_are_dropped() {
        let mut registry = ListenerRegistry::new();
        registry.insert("a", noop(), RemovalPolicy::Tagged("tag".into()));
        assert_eq!(registry.remove_tagged("a", "tag"), 1);
        assert!(registry.event_names().is_empty());
    }

    #[test]
    fn test_claim_counts_down() {
        let mut registry = ListenerRegistry::new();
        registry.insert("a", noop(), RemovalPolicy::Times(2));
        let snapshot = registry.snapshot("a");
        let record = &snapshot[0];

        assert_eq!(record.claim(), Some(false));
        assert_eq!(record.claim(), Some(true));
        assert_eq!(record.claim(), None);
        assert!(!record.is_active());
    }

    #[test]
    fn test_claim_unlimited() {
        let mut registry = ListenerRegistry::new();
        registry.insert("a", noop(), RemovalPolicy::Persistent);
        let snapshot = registry.snapshot("a");
        let record = &snapshot[0];

        for _ in 0..10 {
            assert_eq!(record.claim(), Some(false));
        }
    }

    #[test]
    fn test_clear_counts_everything() {
        let mut registry = ListenerRegistry::new();
        registry.insert("a", noop(), RemovalPolicy::Persistent);
        registry.insert("b", noop(), RemovalPolicy::Once);
        registry.insert("b", noop(), RemovalPolicy::Once);

        assert_eq!(registry.total_listeners(), 3);
        assert_eq!(registry.event_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.clear(), 3);
        assert_eq!(registry.total_listeners(), 0);
    }
}
