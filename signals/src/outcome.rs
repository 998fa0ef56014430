use crate::error::ListenerError;

/// What a single listener produced during a dispatch
#[derive(Debug)]
pub enum Outcome<R> {
    /// The listener returned a value
    Value(R),
    /// The listener returned nothing
    Empty,
    /// The listener returned an error or panicked
    Failed(ListenerError),
}

impl<R> Outcome<R> {
    pub fn is_value(&self) -> bool { matches!(self, Outcome::Value(_)) }
    pub fn is_empty(&self) -> bool { matches!(self, Outcome::Empty) }
    pub fn is_failed(&self) -> bool { matches!(self, Outcome::Failed(_)) }

    pub fn value(&self) -> Option<&R> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<R> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ListenerError> {
        match self {
            Outcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<R> From<()> for Outcome<R> {
    fn from(_: ()) -> Self { Outcome::Empty }
}

impl<R> From<Option<R>> for Outcome<R> {
    fn from(value: Option<R>) -> Self {
        match value {
            Some(value) => Outcome::Value(value),
            None => Outcome::Empty,
        }
    }
}

// Listeners may return a Result of anything that is itself an outcome
impl<R, T, E> From<Result<T, E>> for Outcome<R>
where
    T: Into<Outcome<R>>,
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(error) => Outcome::Failed(ListenerError::failed(error)),
        }
    }
}

/// The report of one dispatch: the outcome of every listener invoked before the loop ended, in invocation order.
/// Listeners deferred past a halt are counted but their outcomes are never observed.
#[derive(Debug)]
pub struct Outcomes<R> {
    pub(crate) outcomes: Vec<Outcome<R>>,
    pub(crate) resolved: bool,
    pub(crate) halted: bool,
    pub(crate) deferred: usize,
}

impl<R> Outcomes<R> {
    pub fn len(&self) -> usize { self.outcomes.len() }
    pub fn is_empty(&self) -> bool { self.outcomes.is_empty() }
    pub fn as_slice(&self) -> &[Outcome<R>] { &self.outcomes }
    pub fn iter(&self) -> std::slice::Iter<'_, Outcome<R>> { self.outcomes.iter() }
    pub fn into_vec(self) -> Vec<Outcome<R>> { self.outcomes }

    /// Whether the resolution policy was satisfied at some point during the dispatch
    pub fn is_resolved(&self) -> bool { self.resolved }

    /// Whether the dispatch loop was halted, by the policy or by a listener
    pub fn was_halted(&self) -> bool { self.halted }

    /// Number of listeners handed to the background task after a halt
    pub fn deferred(&self) -> usize { self.deferred }

    /// Values returned by listeners, skipping empty and failed outcomes
    pub fn values(&self) -> impl Iterator<Item = &R> { self.outcomes.iter().filter_map(Outcome::value) }
}

impl<R> IntoIterator for Outcomes<R> {
    type Item = Outcome<R>;
    type IntoIter = std::vec::IntoIter<Outcome<R>>;
    fn into_iter(self) -> Self::IntoIter { self.outcomes.into_iter() }
}

impl<'a, R> IntoIterator for &'a Outcomes<R> {
    type Item = &'a Outcome<R>;
    type IntoIter = std::slice::Iter<'a, Outcome<R>>;
    fn into_iter(self) -> Self::IntoIter { self.outcomes.iter() }
}
