use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::signal::Signal;

/// Handed to [`Listener::WithContext`](crate::Listener::WithContext) listeners for the duration of one dispatch.
/// Listeners deferred past a halt receive the same context; halting it again has no further effect.
pub struct DispatchContext<T, R>(Arc<Inner<T, R>>);

struct Inner<T, R> {
    signal: Signal<T, R>,
    halted: AtomicBool,
    // set once the dispatch first satisfied its resolution policy
    yielded: AtomicBool,
}

impl<T, R> Clone for DispatchContext<T, R> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, R> std::fmt::Debug for DispatchContext<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("signal", &self.0.signal.id())
            .field("halted", &self.was_halted())
            .field("yielded", &self.was_yielded())
            .finish()
    }
}

impl<T, R> DispatchContext<T, R> {
    pub(crate) fn new(signal: Signal<T, R>) -> Self {
        Self(Arc::new(Inner { signal, halted: AtomicBool::new(false), yielded: AtomicBool::new(false) }))
    }

    /// The signal being dispatched
    pub fn signal(&self) -> &Signal<T, R> { &self.0.signal }

    /// Stop propagation to lower priority listeners. Listeners not yet reached still run later in the background,
    /// but their outcomes are not part of the dispatch result.
    pub fn halt(&self) {
        if self.0.halted.swap(true, Ordering::SeqCst) {
            warn!(signal = %self.0.signal.id(), "halt was already called on this dispatch context");
        }
        if self.was_yielded() {
            warn!(signal = %self.0.signal.id(), "halt called after the dispatch resolved has no effect on its result");
        }
    }

    pub fn was_halted(&self) -> bool { self.0.halted.load(Ordering::SeqCst) }

    /// Halt on behalf of the resolution policy, without the misuse warnings
    pub(crate) fn stop(&self) { self.0.halted.store(true, Ordering::SeqCst); }

    pub(crate) fn was_yielded(&self) -> bool { self.0.yielded.load(Ordering::SeqCst) }

    pub(crate) fn mark_yielded(&self) { self.0.yielded.store(true, Ordering::SeqCst); }
}
