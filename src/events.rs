//! Minimal publish/subscribe.
//!
//! # Responsibilities
//! - Register listeners per event kind, in subscription order
//! - Deliver an event synchronously to every listener of its kind
//! - Hand out a [`Subscription`] that removes its listener on demand
//!
//! # Design Decisions
//! - Listeners are snapshotted before delivery, so a listener may subscribe or
//!   unsubscribe while an event is being emitted
//! - Emission never waits for work a listener spawns
//! - Dropping a `Subscription` keeps the listener; call `unsubscribe` to remove it

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// An event that knows which channel it is published on.
pub trait Event: Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listeners<E: Event> {
    by_kind: HashMap<E::Kind, Vec<(u64, Listener<E>)>>,
}

impl<E: Event> Listeners<E> {
    fn remove(&mut self, kind: E::Kind, id: u64) -> bool {
        let Some(list) = self.by_kind.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        before != list.len()
    }
}

struct Shared<E: Event> {
    listeners: Mutex<Listeners<E>>,
    next_id: AtomicU64,
}

impl<E: Event> Shared<E> {
    fn lock(&self) -> MutexGuard<'_, Listeners<E>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Typed event emitter, cheap to clone.
pub struct EventEmitter<E: Event> {
    shared: Arc<Shared<E>>,
}

impl<E: Event> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                listeners: Mutex::new(Listeners {
                    by_kind: HashMap::new(),
                }),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribe `listener` to events of `kind`.
    pub fn on<F>(&self, kind: E::Kind, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .lock()
            .by_kind
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));

        let weak: Weak<Shared<E>> = Arc::downgrade(&self.shared);
        Subscription {
            remove: Some(Box::new(move || {
                weak.upgrade()
                    .map(|shared| shared.lock().remove(kind, id))
                    .unwrap_or(false)
            })),
        }
    }

    /// Deliver `event` to the listeners of its kind, in subscription order.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = match self.shared.lock().by_kind.get(&event.kind()) {
            Some(list) => list.iter().map(|(_, l)| l.clone()).collect(),
            None => return,
        };
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of listeners currently subscribed to `kind`.
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.shared
            .lock()
            .by_kind
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

/// Handle returned by [`EventEmitter::on`].
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() -> bool + Send + Sync>>,
}

impl Subscription {
    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(mut self) -> bool {
        self.remove.take().is_some_and(|remove| remove())
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Ping {
        A(u32),
        B,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PingKind {
        A,
        B,
    }

    impl Event for Ping {
        type Kind = PingKind;

        fn kind(&self) -> PingKind {
            match self {
                Ping::A(_) => PingKind::A,
                Ping::B => PingKind::B,
            }
        }
    }

    #[test]
    fn test_listeners_run_in_subscription_order() {
        let emitter = EventEmitter::<Ping>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = seen.clone();
            let _sub = emitter.on(PingKind::A, move |e| {
                seen.lock().unwrap().push(format!("{tag}:{e:?}"));
            });
        }

        emitter.emit(&Ping::A(7));
        emitter.emit(&Ping::B);

        assert_eq!(*seen.lock().unwrap(), vec!["first:A(7)", "second:A(7)"]);
    }

    #[test]
    fn test_unsubscribe() {
        let emitter = EventEmitter::<Ping>::new();
        let count = Arc::new(AtomicU64::new(0));

        let c = count.clone();
        let sub = emitter.on(PingKind::B, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&Ping::B);
        assert!(sub.unsubscribe());
        emitter.emit(&Ping::B);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(PingKind::B), 0);
    }

    #[test]
    fn test_unsubscribe_after_emitter_dropped() {
        let emitter = EventEmitter::<Ping>::new();
        let sub = emitter.on(PingKind::A, |_| {});
        drop(emitter);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let emitter = EventEmitter::<Ping>::new();
        let inner = emitter.clone();
        let _sub = emitter.on(PingKind::A, move |_| {
            let _nested = inner.on(PingKind::A, |_| {});
        });

        emitter.emit(&Ping::A(1));
        assert_eq!(emitter.listener_count(PingKind::A), 2);
    }
}
