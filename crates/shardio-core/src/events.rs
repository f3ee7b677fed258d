//! Listener plumbing shared by shardio components.
//!
//! Components describe what happened as a value implementing [`Event`] and
//! hand it to an [`EventListeners`] collection. Listeners are plain
//! closures or types implementing [`EventListener`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An observable occurrence inside a shardio component.
pub trait Event: Send + Sync + fmt::Debug {
    /// Short, stable name of the event (e.g. `"retry"`, `"exhausted"`).
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;

    /// Name of the component instance that emitted the event.
    fn instance_name(&self) -> &str;
}

/// Receives events of type `E`.
pub trait EventListener<E: Event>: Send + Sync {
    /// Called once per emitted event.
    fn on_event(&self, event: &E);
}

impl<E, F> EventListener<E> for F
where
    E: Event,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        self(event)
    }
}

/// An ordered set of listeners for one event type.
pub struct EventListeners<E: Event> {
    listeners: Vec<Arc<dyn EventListener<E>>>,
}

impl<E: Event> EventListeners<E> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Appends a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// A panicking listener is isolated; the remaining listeners still run.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            #[cfg(feature = "tracing")]
            {
                if outcome.is_err() {
                    tracing::warn!(
                        event = event.event_type(),
                        instance = event.instance_name(),
                        "event listener panicked"
                    );
                }
            }
            #[cfg(not(feature = "tracing"))]
            let _ = outcome;
        }
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: Event> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E: Event> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}
