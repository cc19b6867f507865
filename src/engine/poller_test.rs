use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counting(count: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<bool> + Send + 'static {
    let count = count.clone();
    move || {
        count.fetch_add(1, Ordering::SeqCst);
        std::future::ready(true)
    }
}

#[tokio::test(start_paused = true)]
async fn ticks_once_per_period_after_start() {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = PollHandle::spawn(Duration::from_secs(10), counting(&count));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(handle.is_running());
    assert_eq!(handle.period(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_polling() {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = PollHandle::spawn(Duration::from_secs(10), counting(&count));

    tokio::time::sleep(Duration::from_secs(11)).await;
    handle.stop();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn tick_returning_false_ends_loop() {
    let count = Arc::new(AtomicUsize::new(0));
    let task_count = count.clone();
    let handle = PollHandle::spawn(Duration::from_secs(1), move || {
        let n = task_count.fetch_add(1, Ordering::SeqCst) + 1;
        std::future::ready(n < 3)
    });

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert!(!handle.is_running());
}
