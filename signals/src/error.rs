use thiserror::Error;

/// Structural misuse of a signal or binding, surfaced to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    #[error("Signal suspended")]
    Suspended,
    #[error("Binding is no longer bound to a signal")]
    Unbound,
}

/// Why a single listener failed. Always absorbed into the dispatch outcomes, never returned from `dispatch`.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Listener failed: {0}")]
    Failed(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("Listener panicked: {0}")]
    Panicked(String),
}

impl ListenerError {
    /// Wrap any error returned by a listener
    pub fn failed<E>(error: E) -> Self
    where E: Into<Box<dyn std::error::Error + Send + Sync + 'static>> {
        ListenerError::Failed(error.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            message.to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "opaque panic payload".to_string()
        };
        ListenerError::Panicked(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payloads() {
        let err = ListenerError::from_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "Listener panicked: boom");

        let err = ListenerError::from_panic(Box::new(format!("code {}", 7)));
        assert_eq!(err.to_string(), "Listener panicked: code 7");

        let err = ListenerError::from_panic(Box::new(42u8));
        assert_eq!(err.to_string(), "Listener panicked: opaque panic payload");
    }

    #[test]
    fn test_failed_from_str() {
        let err = ListenerError::failed("nope");
        assert!(matches!(err, ListenerError::Failed(_)));
        assert_eq!(err.to_string(), "Listener failed: nope");
    }
}
