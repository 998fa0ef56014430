use std::sync::{Arc, Mutex};

#[allow(unused)]
pub type Record<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Returns a recorder that listeners can clone, and a check function that drains what was recorded so far
#[allow(unused)]
pub fn watcher<T: Send + 'static>() -> (Record<T>, Box<dyn Fn() -> Vec<T> + Send + Sync>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let record: Record<T> = {
        let changes = changes.clone();
        Arc::new(move |value: T| {
            changes.lock().unwrap().push(value);
        })
    };

    let check = Box::new(move || {
        let changes: Vec<T> = changes.lock().unwrap().drain(..).collect();
        changes
    });

    (record, check)
}

#[allow(unused)]
pub fn init_tracing() { let _ = tracing_subscriber::fmt().with_test_writer().try_init(); }

/// Let background tasks spawned by a dispatch run to completion
#[allow(unused)]
pub async fn settle() { tokio::time::sleep(std::time::Duration::from_millis(10)).await; }
