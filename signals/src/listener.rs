use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::context::DispatchContext;
use crate::outcome::Outcome;

type NotifyFn<R> = dyn Fn() -> BoxFuture<'static, Outcome<R>> + Send + Sync + 'static;
type PayloadFn<T, R> = dyn Fn(T) -> BoxFuture<'static, Outcome<R>> + Send + Sync + 'static;
type ContextFn<T, R> = dyn Fn(T, DispatchContext<T, R>) -> BoxFuture<'static, Outcome<R>> + Send + Sync + 'static;

/// Identity of a listener. Clones of a [`Listener`] share it, so registering a clone twice is deduplicated.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{:#x}", self.0) }
}

/// A registered callback. The variant decides which arguments the callback is invoked with;
/// a listener is never handed more than it declared.
pub enum Listener<T, R> {
    /// Called with no arguments
    NotifyOnly(Arc<NotifyFn<R>>),
    /// Called with the dispatched payload
    Payload(Arc<PayloadFn<T, R>>),
    /// Called with the payload and the dispatch context, so it can halt propagation
    WithContext(Arc<ContextFn<T, R>>),
}

impl<T, R> Clone for Listener<T, R> {
    fn clone(&self) -> Self {
        match self {
            Listener::NotifyOnly(f) => Listener::NotifyOnly(f.clone()),
            Listener::Payload(f) => Listener::Payload(f.clone()),
            Listener::WithContext(f) => Listener::WithContext(f.clone()),
        }
    }
}

impl<T, R> std::fmt::Debug for Listener<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Listener::NotifyOnly(_) => "NotifyOnly",
            Listener::Payload(_) => "Payload",
            Listener::WithContext(_) => "WithContext",
        };
        write!(f, "Listener::{}({})", kind, self.id())
    }
}

impl<T, R> Listener<T, R>
where
    T: 'static,
    R: Send + 'static,
{
    pub fn notify_only<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome<R>>,
    {
        Listener::NotifyOnly(Arc::new(move || {
            let fut = f();
            async move {
                let outcome: Outcome<R> = fut.await.into();
                outcome
            }
            .boxed()
        }))
    }

    pub fn payload<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome<R>>,
    {
        Listener::Payload(Arc::new(move |payload| {
            let fut = f(payload);
            async move {
                let outcome: Outcome<R> = fut.await.into();
                outcome
            }
            .boxed()
        }))
    }

    pub fn with_context<F, Fut>(f: F) -> Self
    where
        F: Fn(T, DispatchContext<T, R>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<Outcome<R>>,
    {
        Listener::WithContext(Arc::new(move |payload, context| {
            let fut = f(payload, context);
            async move {
                let outcome: Outcome<R> = fut.await.into();
                outcome
            }
            .boxed()
        }))
    }
}

impl<T, R> Listener<T, R> {
    pub fn id(&self) -> ListenerId {
        let ptr = match self {
            Listener::NotifyOnly(f) => Arc::as_ptr(f) as *const () as usize,
            Listener::Payload(f) => Arc::as_ptr(f) as *const () as usize,
            Listener::WithContext(f) => Arc::as_ptr(f) as *const () as usize,
        };
        ListenerId(ptr)
    }

    /// Start the callback with exactly the arguments its variant declares
    pub(crate) fn invoke(&self, payload: T, context: &DispatchContext<T, R>) -> BoxFuture<'static, Outcome<R>> {
        match self {
            Listener::NotifyOnly(f) => f(),
            Listener::Payload(f) => f(payload),
            Listener::WithContext(f) => f(payload, context.clone()),
        }
    }
}

/// Trait for types that can be registered on a signal.
/// Plain closures taking the payload register as [`Listener::Payload`].
pub trait IntoListener<T, R> {
    fn into_listener(self) -> Listener<T, R>;
}

impl<T, R> IntoListener<T, R> for Listener<T, R> {
    fn into_listener(self) -> Listener<T, R> { self }
}

impl<F, Fut, T, R> IntoListener<T, R> for F
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Into<Outcome<R>>,
    T: 'static,
    R: Send + 'static,
{
    fn into_listener(self) -> Listener<T, R> { Listener::payload(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_identity() {
        let listener = Listener::<u8, ()>::payload(|_| async {});
        let other = Listener::<u8, ()>::payload(|_| async {});
        assert_eq!(listener.id(), listener.clone().id());
        assert_ne!(listener.id(), other.id());
    }

    #[test]
    fn test_closure_registers_as_payload() {
        let listener: Listener<u8, u8> = (|value: u8| async move { Some(value) }).into_listener();
        assert!(matches!(listener, Listener::Payload(_)));
    }
}
