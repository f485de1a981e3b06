// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Listener registry for change notifications.
//!
//! An [`Emitter`] holds a list of callbacks keyed by [`ListenerId`].
//! Subscribing returns the id that must later be handed back to
//! [`Emitter::unsubscribe`]; forgetting to do so leaks the registration
//! for as long as the emitter lives.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle identifying one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Thread-safe registry of listeners for events of type `E`.
pub struct Emitter<E> {
    listeners: Mutex<Vec<(ListenerId, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> Emitter<E> {
    /// Create an emitter with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener registered at the time of the call.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// unsubscribe re-entrantly.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_all_listeners() {
        let emitter: Emitter<String> = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::clone(&seen);
        emitter.subscribe(move |t: &String| a.lock().push(format!("a:{}", t)));
        let b = Arc::clone(&seen);
        emitter.subscribe(move |t: &String| b.lock().push(format!("b:{}", t)));

        emitter.emit(&"tempo".to_string());

        assert_eq!(*seen.lock(), vec!["a:tempo", "b:tempo"]);
    }

    #[test]
    fn test_unsubscribe() {
        let emitter: Emitter<()> = Emitter::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = emitter.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&());
        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        emitter.emit(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_reentrant_unsubscribe() {
        let emitter: Arc<Emitter<()>> = Arc::new(Emitter::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let e = Arc::clone(&emitter);
        let s = Arc::clone(&slot);
        let id = emitter.subscribe(move |_| {
            if let Some(id) = s.lock().take() {
                e.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        emitter.emit(&());
        assert_eq!(emitter.listener_count(), 0);
    }
}
