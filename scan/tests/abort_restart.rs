use mocks::{media_item, ScriptedBackend};
use scan::{ScanCoordinator, ScanError, ScanEvent, ScanSettings, ScanStop};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

#[tokio::test(start_paused = true)]
async fn test_second_start_is_rejected_while_running() {
    let backend = Arc::new(ScriptedBackend::new());
    let coordinator = ScanCoordinator::new(backend.clone(), ScanSettings::default());
    let (tx, _rx) = mpsc::unbounded_channel();

    let handle = coordinator.start(tx.clone()).await.unwrap();
    let second = coordinator.start(tx.clone()).await;
    assert_eq!(second.err(), Some(ScanError::AlreadyRunning));
    assert_eq!(backend.trigger_calls(), 1);

    handle.cancel();
    assert_eq!(handle.wait().await, Some(ScanStop::Cancelled));

    // Once stopped, a new scan can be started.
    let again = coordinator.start(tx).await.unwrap();
    assert_eq!(backend.trigger_calls(), 2);
    again.cancel();
    again.wait().await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_all_handles_stops_loop() {
    let backend = Arc::new(ScriptedBackend::new().with_media(vec![media_item(1, "image/jpeg")]));
    let coordinator = ScanCoordinator::new(backend.clone(), ScanSettings::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = coordinator.start(tx).await.unwrap();
    let clone = handle.clone();
    drop(handle);
    // One clone is still alive, so the loop keeps polling.
    let _ = rx.recv().await;
    assert!(matches!(rx.recv().await, Some(ScanEvent::Polled { .. })));
    drop(clone);

    let finished = timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Some(ScanEvent::Finished(stop)) => return Some(stop),
                Some(_) => continue,
                None => return None,
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(finished, Some(ScanStop::Cancelled));
    assert!(!coordinator.is_scanning());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_finish_is_noop() {
    let backend = Arc::new(ScriptedBackend::new());
    let settings = ScanSettings {
        scan_timeout: Duration::from_secs(3),
        ..ScanSettings::default()
    };
    let coordinator = ScanCoordinator::new(backend, settings);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = coordinator.start(tx).await.unwrap();
    assert_eq!(handle.wait().await, Some(ScanStop::TimedOut));
    handle.cancel();
    handle.cancel();
    assert_eq!(handle.wait().await, Some(ScanStop::TimedOut));

    let mut finished = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ScanEvent::Finished(_)) {
            finished += 1;
        }
    }
    assert_eq!(finished, 1);
}
