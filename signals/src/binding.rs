use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures::FutureExt;
use tracing::debug;

use crate::context::DispatchContext;
use crate::error::{ListenerError, SignalError};
use crate::listener::{Listener, ListenerId};
use crate::outcome::Outcome;

/// Identifies a binding within its signal
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BindingId(pub(crate) usize);

impl std::fmt::Display for BindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// The value a listener was bound with. Only its identity matters: two targets are the same
/// if they share an allocation, which is what lets one listener be bound once per target.
#[derive(Clone)]
pub struct Target(Arc<dyn Any + Send + Sync>);

impl Target {
    pub fn new<V: Any + Send + Sync>(value: V) -> Self { Self(Arc::new(value)) }

    /// Use an existing allocation as the target, so clones of `value` identify the same target
    pub fn from_arc<V: Any + Send + Sync>(value: Arc<V>) -> Self { Self(value) }

    pub fn id(&self) -> usize { Arc::as_ptr(&self.0) as *const () as usize }

    pub fn downcast_ref<V: Any>(&self) -> Option<&V> { self.0.downcast_ref::<V>() }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool { self.id() == other.id() }
}
impl Eq for Target {}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Target({:#x})", self.id()) }
}

/// Registration options for [`Signal::add_with`](crate::Signal::add_with)
#[derive(Debug, Clone, Default)]
pub struct BindingOptions {
    pub target: Option<Target>,
    /// Higher priorities run first
    pub priority: i32,
    /// Remove the binding after its first successful execution
    pub once: bool,
}

impl BindingOptions {
    pub fn new() -> Self { Self::default() }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// What a binding needs from the signal that owns it
pub(crate) trait BindingOwner<T, R>: Send + Sync {
    fn remove_binding(&self, id: BindingId) -> bool;
}

struct Bound<T, R> {
    owner: Weak<dyn BindingOwner<T, R>>,
    listener: Listener<T, R>,
    target: Option<Target>,
}

pub(crate) struct BindingInner<T, R> {
    id: BindingId,
    priority: i32,
    once: bool,
    suspended: AtomicBool,
    // None once detached or destroyed
    state: Mutex<Option<Bound<T, R>>>,
}

impl<T, R> BindingInner<T, R> {
    pub(crate) fn new(id: BindingId, owner: Weak<dyn BindingOwner<T, R>>, listener: Listener<T, R>, options: BindingOptions) -> Self {
        Self {
            id,
            priority: options.priority,
            once: options.once,
            suspended: AtomicBool::new(false),
            state: Mutex::new(Some(Bound { owner, listener, target: options.target })),
        }
    }

    pub(crate) fn id(&self) -> BindingId { self.id }
    pub(crate) fn priority(&self) -> i32 { self.priority }
    pub(crate) fn is_once(&self) -> bool { self.once }
    pub(crate) fn is_suspended(&self) -> bool { self.suspended.load(Ordering::SeqCst) }

    pub(crate) fn is_bound(&self) -> bool {
        let state = self.state.lock().expect("binding state lock is poisoned");
        state.as_ref().is_some_and(|bound| bound.owner.strong_count() > 0)
    }

    /// Bound and not suspended
    pub(crate) fn is_live(&self) -> bool { !self.is_suspended() && self.is_bound() }

    /// Whether this binding was registered with the given listener and target
    pub(crate) fn is_same(&self, listener: ListenerId, target: Option<&Target>) -> bool {
        let state = self.state.lock().expect("binding state lock is poisoned");
        state.as_ref().is_some_and(|bound| bound.listener.id() == listener && bound.target.as_ref() == target)
    }

    pub(crate) fn listener(&self) -> Option<Listener<T, R>> {
        self.state.lock().expect("binding state lock is poisoned").as_ref().map(|bound| bound.listener.clone())
    }

    fn target(&self) -> Option<Target> {
        self.state.lock().expect("binding state lock is poisoned").as_ref().and_then(|bound| bound.target.clone())
    }

    fn owner(&self) -> Option<Arc<dyn BindingOwner<T, R>>> {
        self.state.lock().expect("binding state lock is poisoned").as_ref().and_then(|bound| bound.owner.upgrade())
    }

    /// Release the signal, listener and target
    pub(crate) fn destroy(&self) { self.state.lock().expect("binding state lock is poisoned").take(); }

    /// Run the listener to completion. Returns None if the binding was suspended or released before it could run.
    pub(crate) async fn execute(&self, payload: T, context: &DispatchContext<T, R>) -> Option<Outcome<R>> {
        if self.is_suspended() {
            debug!(binding = %self.id, "skipping suspended binding");
            return None;
        }
        let Some(listener) = self.listener() else {
            debug!(binding = %self.id, "skipping released binding");
            return None;
        };
        let context = context.clone();
        // the call itself happens inside the guarded future so a panic while starting the listener is caught too
        let invocation = AssertUnwindSafe(async move { listener.invoke(payload, &context).await });
        Some(match invocation.catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Outcome::Failed(ListenerError::from_panic(panic)),
        })
    }
}

/// Handle to a listener registration. Dropping the handle does not remove the listener; call [`Binding::detach`].
pub struct Binding<T, R>(pub(crate) Arc<BindingInner<T, R>>);

impl<T, R> Clone for Binding<T, R> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, R> PartialEq for Binding<T, R> {
    fn eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T, R> std::fmt::Debug for Binding<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.0.id)
            .field("priority", &self.0.priority)
            .field("once", &self.0.once)
            .field("suspended", &self.0.is_suspended())
            .field("bound", &self.0.is_bound())
            .finish()
    }
}

impl<T, R> Binding<T, R> {
    pub fn id(&self) -> BindingId { self.0.id }
    pub fn priority(&self) -> i32 { self.0.priority }
    pub fn is_once(&self) -> bool { self.0.once }
    pub fn is_suspended(&self) -> bool { self.0.is_suspended() }

    /// True while the binding still references a live signal and its listener
    pub fn is_bound(&self) -> bool { self.0.is_bound() }

    /// The registered listener, or None once detached
    pub fn listener(&self) -> Option<Listener<T, R>> { self.0.listener() }

    pub fn target(&self) -> Option<Target> { self.0.target() }

    /// Remove this binding from its signal and release everything it references. Does nothing if already unbound.
    pub fn detach(&self) {
        // owner lookup must not hold the state lock while the signal takes its own lock
        if let Some(owner) = self.0.owner() {
            owner.remove_binding(self.0.id);
        }
        self.0.destroy();
    }

    /// Exclude this binding from subsequent dispatches until resumed
    pub fn suspend(&self) -> Result<(), SignalError> { self.set_suspended(true) }

    pub fn resume(&self) -> Result<(), SignalError> { self.set_suspended(false) }

    fn set_suspended(&self, suspended: bool) -> Result<(), SignalError> {
        if !self.0.is_bound() {
            return Err(SignalError::Unbound);
        }
        self.0.suspended.store(suspended, Ordering::SeqCst);
        Ok(())
    }
}
