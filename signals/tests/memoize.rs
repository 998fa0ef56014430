mod common;
use common::{settle, watcher};
use dispatch_signals::*;

fn memoized() -> Signal<u32> { Signal::new(SignalConfig::default().with_memoize(true)) }

#[tokio::test]
async fn test_late_listener_receives_latest_payload() {
    let signal = memoized();
    let (record, check) = watcher();
    {
        let record = record.clone();
        signal.add(move |n: u32| {
            record(("early", n));
            async {}
        });
    }
    signal.dispatch(7).await.unwrap();
    assert_eq!(check(), [("early", 7)]);

    signal.add(move |n: u32| {
        record(("late", n));
        async {}
    });
    settle().await;

    // the replay is a full dispatch, so the early listener sees the payload again in the same pass
    let mut seen = check();
    seen.sort();
    assert_eq!(seen, [("early", 7), ("late", 7)]);
}

#[tokio::test]
async fn test_no_replay_before_first_dispatch() {
    let signal = memoized();
    let (record, check) = watcher();
    signal.add(move |n: u32| {
        record(n);
        async {}
    });
    settle().await;
    assert!(check().is_empty());
    assert_eq!(signal.latest(), None);
}

#[tokio::test]
async fn test_forget_stops_replay() {
    let signal = memoized();
    signal.dispatch(1).await.unwrap();
    assert_eq!(signal.latest(), Some(1));

    signal.forget();
    assert_eq!(signal.latest(), None);

    let (record, check) = watcher();
    signal.add(move |n: u32| {
        record(n);
        async {}
    });
    settle().await;
    assert!(check().is_empty());
}

#[tokio::test]
async fn test_duplicate_add_does_not_replay() {
    let signal = memoized();
    let (record, check) = watcher();
    let listener = Listener::payload(move |n: u32| {
        record(n);
        async {}
    });
    signal.add(listener.clone());
    signal.dispatch(3).await.unwrap();
    assert_eq!(check(), [3]);

    signal.add(listener);
    settle().await;
    assert!(check().is_empty());
}

#[tokio::test]
async fn test_payload_is_memoized_before_listeners_run() {
    let signal = memoized();
    let (record, check) = watcher();
    signal.add(Listener::with_context(move |_: u32, context: DispatchContext<u32, ()>| {
        record(context.signal().latest());
        async {}
    }));

    signal.dispatch(11).await.unwrap();
    assert_eq!(check(), [Some(11)]);
}

#[tokio::test]
async fn test_suspended_signal_skips_replay() {
    let signal = memoized();
    signal.dispatch(4).await.unwrap();
    signal.suspend();

    let (record, check) = watcher();
    signal.add(move |n: u32| {
        record(n);
        async {}
    });
    settle().await;
    assert!(check().is_empty());
    // a rejected dispatch does not overwrite the memoized payload
    assert_eq!(signal.dispatch(5).await.unwrap_err(), SignalError::Suspended);
    assert_eq!(signal.latest(), Some(4));
}

#[tokio::test]
async fn test_plain_signal_does_not_memoize() {
    let signal: Signal<u32> = Signal::default();
    assert!(!signal.is_memoized());
    signal.dispatch(9).await.unwrap();
    assert_eq!(signal.latest(), None);
}
