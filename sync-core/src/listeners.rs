//! Ordered callback registrations for one listener kind.
//!
//! The client keeps five independent registries (global, presence, invite,
//! leave, ephemeral). The registry itself is kind-agnostic: it stores
//! callbacks of any type in insertion order, hands out opaque registration
//! ids, and answers "which callbacks match this event type" for the
//! filterable kinds. Delivery order is always registration order.

use std::fmt;
use uuid::Uuid;

/// Opaque handle identifying one listener registration.
///
/// Process-unique; removing by handle never disturbs the positions of other
/// registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ListenerEntry<C> {
    id: ListenerId,
    filter: Option<String>,
    callback: C,
}

/// An ordered collection of callback registrations.
///
/// Insertion order is delivery order. An entry's optional filter restricts
/// it to events of exactly that type; `None` matches every type.
pub struct ListenerRegistry<C> {
    entries: Vec<ListenerEntry<C>>,
}

impl<C> ListenerRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a callback, returning its registration handle.
    pub fn register(&mut self, callback: C, filter: Option<String>) -> ListenerId {
        let id = ListenerId::generate();
        self.entries.push(ListenerEntry {
            id,
            filter,
            callback,
        });
        id
    }

    /// Remove the registration with the given handle.
    ///
    /// Idempotent; removing an absent handle is not an error.
    pub fn unregister(&mut self, id: &ListenerId) {
        self.entries.retain(|entry| entry.id != *id);
    }

    /// Callbacks whose filter is `None` or equals `event_type`, in
    /// registration order.
    pub fn matching_mut<'a>(
        &'a mut self,
        event_type: &'a str,
    ) -> impl Iterator<Item = &'a mut C> + 'a {
        self.entries
            .iter_mut()
            .filter(move |entry| match entry.filter.as_deref() {
                None => true,
                Some(filter) => filter == event_type,
            })
            .map(|entry| &mut entry.callback)
    }

    /// All callbacks in registration order, ignoring filters.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut C> {
        self.entries.iter_mut().map(|entry| &mut entry.callback)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no registrations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for ListenerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ListenerRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_returns_unique_ids() {
        let mut registry: ListenerRegistry<u32> = ListenerRegistry::new();
        let a = registry.register(1, None);
        let b = registry.register(2, None);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn delivery_order_is_registration_order() {
        let mut registry: ListenerRegistry<&str> = ListenerRegistry::new();
        registry.register("first", None);
        registry.register("second", Some("m.room.message".into()));
        registry.register("third", None);

        let order: Vec<&str> = registry
            .matching_mut("m.room.message")
            .map(|c| *c)
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn filter_excludes_other_event_types() {
        let mut registry: ListenerRegistry<&str> = ListenerRegistry::new();
        registry.register("messages", Some("m.room.message".into()));
        registry.register("everything", None);

        let order: Vec<&str> = registry.matching_mut("m.typing").map(|c| *c).collect();
        assert_eq!(order, vec!["everything"]);
    }

    #[test]
    fn unregister_removes_only_the_target() {
        let mut registry: ListenerRegistry<&str> = ListenerRegistry::new();
        let a = registry.register("a", None);
        registry.register("b", None);

        registry.unregister(&a);
        let order: Vec<&str> = registry.iter_mut().map(|c| *c).collect();
        assert_eq!(order, vec!["b"]);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut registry: ListenerRegistry<&str> = ListenerRegistry::new();
        let a = registry.register("a", None);
        registry.unregister(&a);
        registry.unregister(&a);
        assert!(registry.is_empty());
    }

    #[test]
    fn callbacks_are_mutably_borrowed_for_dispatch() {
        let mut registry: ListenerRegistry<Vec<u32>> = ListenerRegistry::new();
        registry.register(Vec::new(), None);
        for sink in registry.iter_mut() {
            sink.push(7);
        }
        let collected: Vec<Vec<u32>> = registry.iter_mut().map(|c| c.clone()).collect();
        assert_eq!(collected, vec![vec![7]]);
    }
}
