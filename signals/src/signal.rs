use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::{debug, warn};

use crate::binding::{Binding, BindingId, BindingInner, BindingOptions, BindingOwner, Target};
use crate::config::SignalConfig;
use crate::context::DispatchContext;
use crate::error::SignalError;
use crate::listener::{IntoListener, Listener};
use crate::outcome::{Outcome, Outcomes};
use crate::resolution::ResolutionState;
use crate::task;

/// A unique identifier for a signal, derived from its allocation
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SignalId(usize);

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{:#x}", self.0) }
}

/// Broadcasts one payload type to prioritized listeners, one listener at a time, and reports their outcomes.
///
/// Cloning a signal yields another handle to the same listeners.
pub struct Signal<T, R = ()>(Arc<Inner<T, R>>);

struct Inner<T, R> {
    config: SignalConfig<R>,
    // registration order; sorted into a snapshot on every dispatch
    bindings: RwLock<Vec<Arc<BindingInner<T, R>>>>,
    latest: Mutex<Option<T>>,
    suspended: AtomicBool,
    next_id: AtomicUsize,
}

impl<T, R> Clone for Signal<T, R> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, R> std::fmt::Debug for Signal<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("config", &self.0.config)
            .field("bindings", &self.len())
            .field("suspended", &self.is_suspended())
            .finish()
    }
}

impl<T, R> Default for Signal<T, R> {
    fn default() -> Self { Self::new(SignalConfig::default()) }
}

impl<T, R> Inner<T, R> {
    /// Bound, non-suspended bindings ordered for dispatch.
    /// Ascending stable sort then reverse, so equal priorities run most recently registered first.
    fn snapshot(&self) -> Vec<Arc<BindingInner<T, R>>> {
        let mut snapshot: Vec<_> = {
            let bindings = self.bindings.read().expect("bindings lock is poisoned");
            bindings.iter().filter(|binding| binding.is_live()).cloned().collect()
        };
        snapshot.sort_by_key(|binding| binding.priority());
        snapshot.reverse();
        snapshot
    }

    fn find(&self, listener: &Listener<T, R>, target: Option<&Target>) -> Option<Arc<BindingInner<T, R>>> {
        let bindings = self.bindings.read().expect("bindings lock is poisoned");
        bindings.iter().find(|binding| binding.is_same(listener.id(), target)).cloned()
    }

    fn take_bindings(&self) -> Vec<Arc<BindingInner<T, R>>> {
        std::mem::take(&mut *self.bindings.write().expect("bindings lock is poisoned"))
    }

    /// Once-bindings leave the signal after their first execution that did not fail
    fn settle(&self, binding: &BindingInner<T, R>, outcome: &Outcome<R>) {
        if binding.is_once() && !outcome.is_failed() {
            self.remove(binding.id());
            binding.destroy();
        }
    }

    fn remove(&self, id: BindingId) -> bool {
        let mut bindings = self.bindings.write().expect("bindings lock is poisoned");
        match bindings.iter().position(|binding| binding.id() == id) {
            Some(index) => {
                bindings.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<T, R> BindingOwner<T, R> for Inner<T, R>
where T: Send
{
    fn remove_binding(&self, id: BindingId) -> bool { self.remove(id) }
}

impl<T, R> Signal<T, R> {
    pub fn new(config: SignalConfig<R>) -> Self {
        Self(Arc::new(Inner {
            config,
            bindings: RwLock::new(Vec::new()),
            latest: Mutex::new(None),
            suspended: AtomicBool::new(false),
            next_id: AtomicUsize::new(0),
        }))
    }

    pub fn id(&self) -> SignalId { SignalId(Arc::as_ptr(&self.0) as usize) }

    pub fn config(&self) -> &SignalConfig<R> { &self.0.config }

    /// Number of registered bindings, including suspended ones
    pub fn len(&self) -> usize { self.0.bindings.read().expect("bindings lock is poisoned").len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Whether a binding for this listener and target is registered
    pub fn has(&self, listener: &Listener<T, R>, target: Option<&Target>) -> bool { self.0.find(listener, target).is_some() }

    /// Detach every binding, leaving their handles unbound. The memoized payload is kept.
    pub fn remove_all(&self) {
        let bindings = self.0.take_bindings();
        debug!(signal = %self.id(), count = bindings.len(), "removing all bindings");
        for binding in bindings {
            binding.destroy();
        }
    }

    /// Forget the memoized payload
    pub fn forget(&self) { self.0.latest.lock().expect("latest payload lock is poisoned").take(); }

    /// Drop all bindings and the memoized payload. The signal stays usable.
    pub fn dispose(&self) {
        self.0.take_bindings();
        self.forget();
    }

    /// Reject every dispatch until resumed
    pub fn suspend(&self) { self.0.suspended.store(true, Ordering::SeqCst); }

    pub fn resume(&self) { self.0.suspended.store(false, Ordering::SeqCst); }

    pub fn is_suspended(&self) -> bool { self.0.suspended.load(Ordering::SeqCst) }

    pub fn is_memoized(&self) -> bool { self.0.config.memoize }
}

impl<T, R> Signal<T, R>
where T: Clone
{
    /// The memoized payload, if any
    pub fn latest(&self) -> Option<T> { self.0.latest.lock().expect("latest payload lock is poisoned").clone() }
}

impl<T, R> Signal<T, R>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
{
    /// Register a listener at priority 0
    pub fn add<L>(&self, listener: L) -> Binding<T, R>
    where L: IntoListener<T, R> {
        self.add_with(listener, BindingOptions::default())
    }

    /// Register a listener that is removed after its first successful execution
    pub fn add_once<L>(&self, listener: L) -> Binding<T, R>
    where L: IntoListener<T, R> {
        self.add_with(listener, BindingOptions::default().once())
    }

    pub fn add_once_with<L>(&self, listener: L, options: BindingOptions) -> Binding<T, R>
    where L: IntoListener<T, R> {
        self.add_with(listener, options.once())
    }

    /// Register a listener. If the same listener is already bound with the same target, the existing binding is
    /// returned unchanged and the new options are ignored.
    ///
    /// On a memoizing signal that has dispatched before, adding a new binding replays the latest payload
    /// to all listeners in the background.
    pub fn add_with<L>(&self, listener: L, options: BindingOptions) -> Binding<T, R>
    where L: IntoListener<T, R> {
        let listener = listener.into_listener();
        let binding = {
            let mut bindings = self.0.bindings.write().expect("bindings lock is poisoned");
            if let Some(existing) = bindings.iter().find(|binding| binding.is_same(listener.id(), options.target.as_ref())) {
                return Binding(existing.clone());
            }
            let id = BindingId(self.0.next_id.fetch_add(1, Ordering::Relaxed));
            let owner: Weak<dyn BindingOwner<T, R>> = Arc::downgrade(&self.0) as Weak<dyn BindingOwner<T, R>>;
            let binding = Arc::new(BindingInner::new(id, owner, listener, options));
            bindings.push(binding.clone());
            binding
        };
        debug!(signal = %self.id(), binding = %binding.id(), priority = binding.priority(), once = binding.is_once(), "listener added");

        if self.0.config.memoize {
            self.replay();
        }
        Binding(binding)
    }

    /// Detach the binding registered for this listener and target. Returns false if there was none.
    pub fn remove(&self, listener: &Listener<T, R>, target: Option<&Target>) -> bool {
        match self.0.find(listener, target) {
            Some(binding) => {
                Binding(binding).detach();
                true
            }
            None => false,
        }
    }

    /// Invoke every bound, non-suspended listener in priority order, awaiting each before starting the next.
    ///
    /// Listener errors and panics are recorded as [`Outcome::Failed`]; the only error returned is
    /// [`SignalError::Suspended`]. When the dispatch halts, listeners not yet reached are run once in the
    /// background and their outcomes are discarded.
    pub async fn dispatch(&self, payload: T) -> Result<Outcomes<R>, SignalError> {
        if self.is_suspended() {
            debug!(signal = %self.id(), "dispatch rejected, signal is suspended");
            return Err(SignalError::Suspended);
        }
        if self.0.config.memoize {
            *self.0.latest.lock().expect("latest payload lock is poisoned") = Some(payload.clone());
        }

        let config = &self.0.config;
        let mut snapshot = self.0.snapshot();
        let context = DispatchContext::new(self.clone());
        debug!(signal = %self.id(), listeners = snapshot.len(), resolution = %config.resolution, "dispatching");

        let mut outcomes = Vec::with_capacity(snapshot.len());
        let mut resolved = false;
        let mut next = 0;
        while next < snapshot.len() {
            let binding = snapshot[next].clone();
            next += 1;
            let Some(outcome) = binding.execute(payload.clone(), &context).await else {
                continue;
            };
            self.0.settle(&binding, &outcome);
            outcomes.push(outcome);

            // bindings suspended or detached since the snapshot no longer need to report
            let pending = snapshot[next..].iter().filter(|binding| binding.is_live()).count();
            let state = ResolutionState { pending, stopped: context.was_halted() };
            if !resolved && config.resolution.is_resolved(&outcomes, &config.success_test, state) {
                resolved = true;
                if config.halt_on_resolve {
                    context.stop();
                }
                context.mark_yielded();
            }
            if context.was_halted() {
                break;
            }
        }
        // an empty snapshot, or a tail of skipped bindings, still gets a verdict
        if !resolved && next == snapshot.len() {
            let state = ResolutionState { pending: 0, stopped: context.was_halted() };
            if config.resolution.is_resolved(&outcomes, &config.success_test, state) {
                resolved = true;
                context.mark_yielded();
            }
        }

        let deferred = snapshot.split_off(next);
        let deferred_count = deferred.len();
        if !deferred.is_empty() {
            self.defer(deferred, payload, context.clone());
        }
        debug!(signal = %self.id(), invoked = outcomes.len(), deferred = deferred_count, resolved, "dispatch complete");

        Ok(Outcomes { outcomes, resolved, halted: context.was_halted(), deferred: deferred_count })
    }

    /// Run bindings skipped by a halt in a detached task. Nothing they return is observable.
    fn defer(&self, bindings: Vec<Arc<BindingInner<T, R>>>, payload: T, context: DispatchContext<T, R>) {
        let count = bindings.len();
        let spawned = task::spawn(async move {
            for binding in bindings {
                if let Some(outcome) = binding.execute(payload.clone(), &context).await {
                    if let Outcome::Failed(error) = &outcome {
                        debug!(binding = %binding.id(), "deferred listener failed: {}", error);
                    }
                    context.signal().0.settle(&binding, &outcome);
                }
            }
        });
        if !spawned {
            warn!(signal = %self.id(), deferred = count, "no async runtime available, dropping deferred listeners");
        }
    }

    /// Dispatch the memoized payload again in the background
    fn replay(&self) {
        let Some(payload) = self.latest() else {
            return;
        };
        let signal = self.clone();
        let spawned = task::spawn(async move {
            if let Err(error) = signal.dispatch(payload).await {
                debug!(signal = %signal.id(), "memoized replay skipped: {}", error);
            }
        });
        if !spawned {
            warn!(signal = %self.id(), "no async runtime available, skipping memoized replay");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_order() {
        let signal = Signal::<(), ()>::default();
        let low = signal.add_with(Listener::notify_only(|| async {}), BindingOptions::new().priority(-1));
        let first = signal.add(Listener::notify_only(|| async {}));
        let high = signal.add_with(Listener::notify_only(|| async {}), BindingOptions::new().priority(5));
        let second = signal.add(Listener::notify_only(|| async {}));

        let order: Vec<BindingId> = signal.0.snapshot().iter().map(|binding| binding.id()).collect();
        assert_eq!(order, vec![high.id(), second.id(), first.id(), low.id()]);
    }

    #[test]
    fn test_snapshot_skips_suspended() {
        let signal = Signal::<(), ()>::default();
        let a = signal.add(Listener::notify_only(|| async {}));
        let b = signal.add(Listener::notify_only(|| async {}));
        b.suspend().unwrap();

        assert_eq!(signal.0.snapshot().len(), 1);
        assert!(!b.0.is_live());
        assert_eq!(signal.len(), 2);

        b.resume().unwrap();
        assert_eq!(signal.0.snapshot().len(), 2);
        a.detach();
        assert_eq!(signal.0.snapshot().len(), 1);
    }

    #[test]
    fn test_dedup_ignores_new_options() {
        let signal = Signal::<(), ()>::default();
        let listener = Listener::notify_only(|| async {});
        let first = signal.add(listener.clone());
        let again = signal.add_once_with(listener.clone(), BindingOptions::new().priority(10));
        assert_eq!(first, again);
        assert_eq!(again.priority(), 0);
        assert!(!again.is_once());
        assert_eq!(signal.len(), 1);

        // a different target is a different registration
        let other = signal.add_with(listener.clone(), BindingOptions::new().target(Target::new("other")));
        assert_ne!(first, other);
        assert_eq!(signal.len(), 2);
    }
}
