use serde::Deserialize;

use crate::resolution::{Resolution, SuccessTest};

/// Configuration for a [`Signal`](crate::Signal).
///
/// Deserializes from any serde format; the success test cannot be expressed in data and is always the default
/// after deserialization. Use [`SignalConfig::with_success_test`] to replace it.
///
/// ```rust
/// use dispatch_signals::{Resolution, SignalConfig};
///
/// let config = SignalConfig::<bool>::default()
///     .with_resolution(Resolution::Any)
///     .with_halt_on_resolve(true)
///     .with_success_test(|value: &bool| *value);
/// assert_eq!(config.resolution, Resolution::Any);
/// ```
#[derive(Deserialize)]
#[serde(default, bound = "")]
pub struct SignalConfig<R> {
    pub resolution: Resolution,
    #[serde(alias = "haltOnResolve")]
    pub halt_on_resolve: bool,
    pub memoize: bool,
    #[serde(skip)]
    pub success_test: SuccessTest<R>,
}

impl<R> Default for SignalConfig<R> {
    fn default() -> Self { Self { resolution: Resolution::All, halt_on_resolve: false, memoize: false, success_test: SuccessTest::default() } }
}

impl<R> Clone for SignalConfig<R> {
    fn clone(&self) -> Self {
        Self {
            resolution: self.resolution,
            halt_on_resolve: self.halt_on_resolve,
            memoize: self.memoize,
            success_test: self.success_test.clone(),
        }
    }
}

impl<R> std::fmt::Debug for SignalConfig<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalConfig")
            .field("resolution", &self.resolution)
            .field("halt_on_resolve", &self.halt_on_resolve)
            .field("memoize", &self.memoize)
            .finish_non_exhaustive()
    }
}

impl<R> SignalConfig<R> {
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_halt_on_resolve(mut self, halt_on_resolve: bool) -> Self {
        self.halt_on_resolve = halt_on_resolve;
        self
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Replace the test that classifies returned values.
    ///
    /// Only [`Outcome::Value`](crate::Outcome::Value) reaches the test. A listener that returned nothing
    /// ([`Outcome::Empty`](crate::Outcome::Empty)) is always [`Verdict::Neutral`](crate::Verdict::Neutral)
    /// and a failed listener is always [`Verdict::Failure`](crate::Verdict::Failure), whatever the test says.
    /// Return `Some(..)` from a listener when its result should be judged.
    pub fn with_success_test<F>(mut self, test: F) -> Self
    where F: Fn(&R) -> bool + Send + Sync + 'static {
        self.success_test = SuccessTest::new(test);
        self
    }
}
