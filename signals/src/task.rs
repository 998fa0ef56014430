use std::future::Future;

/// Spawn a detached task on the ambient tokio runtime. Returns false if there is no runtime to spawn onto.
pub(crate) fn spawn<F>(future: F) -> bool
where F: Future<Output = ()> + Send + 'static {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_runs_on_ambient_runtime() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        assert!(spawn(async move {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[test]
    fn test_spawn_without_runtime() { assert!(!spawn(async {})); }
}
