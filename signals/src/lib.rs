/*!
Prioritized async signals with pluggable resolution policies

A [`Signal`] broadcasts one payload type to a set of listeners. Listeners run one at a time, highest
priority first, and each one is awaited before the next starts. After every listener the signal's
[`Resolution`] policy decides whether the dispatch is resolved; with `halt_on_resolve` a resolved
dispatch stops early, and listeners can stop it themselves through their [`DispatchContext`].

# Design requirements:
- Listeners declare what they want to receive: nothing, the payload, or the payload and the dispatch context
- A listener is registered at most once per binding target
- A dispatch iterates a snapshot; registrations and removals during a dispatch only affect later dispatches
- Listener failures never escape `dispatch`; they are recorded as [`Outcome::Failed`]
- Listeners skipped by a halt still run, later, in the background

# Basic usage

```rust
use dispatch_signals::*;

# tokio_test::block_on(async {
let signal: Signal<u32, u32> = Signal::default();
signal.add_with(|n: u32| async move { Some(n * 2) }, BindingOptions::new().priority(1));
signal.add(|n: u32| async move { Some(n + 1) });

let outcomes = signal.dispatch(20).await.unwrap();
assert_eq!(outcomes.values().copied().collect::<Vec<_>>(), vec![40, 21]);
# });
```

# Halting

```rust
use dispatch_signals::*;

# tokio_test::block_on(async {
let signal: Signal<&'static str, bool> =
    Signal::new(SignalConfig::default().with_resolution(Resolution::Any).with_halt_on_resolve(true).with_success_test(|ok: &bool| *ok));

signal.add_with(|_: &'static str| async { Some(false) }, BindingOptions::new().priority(2));
signal.add_with(|_: &'static str| async { Some(true) }, BindingOptions::new().priority(1));
signal.add(|_: &'static str| async { Some(true) });

let outcomes = signal.dispatch("ping").await.unwrap();
assert!(outcomes.is_resolved());
assert_eq!(outcomes.len(), 2);
assert_eq!(outcomes.deferred(), 1);
# });
```
*/

mod binding;
mod config;
mod context;
mod error;
mod listener;
mod outcome;
mod resolution;
mod signal;
mod task;

pub use binding::{Binding, BindingId, BindingOptions, Target};
pub use config::SignalConfig;
pub use context::DispatchContext;
pub use error::{ListenerError, SignalError};
pub use listener::{IntoListener, Listener, ListenerId};
pub use outcome::{Outcome, Outcomes};
pub use resolution::{ParseResolutionError, Resolution, ResolutionState, SuccessTest, Verdict};
pub use signal::{Signal, SignalId};
