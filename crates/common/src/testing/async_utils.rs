//! Async test utilities

use std::future::Future;
use std::time::Duration;

/// Poll `condition` every `interval` until it returns `true` or `timeout`
/// elapses.
///
/// Uses tokio's clock, so it also works under `start_paused` tests.
///
/// # Example
///
/// ```ignore
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use mgsdb_common::testing::poll_until;
///
/// let flag = Arc::new(AtomicBool::new(false));
/// let flag_clone = flag.clone();
///
/// tokio::spawn(async move {
///     tokio::time::sleep(Duration::from_millis(20)).await;
///     flag_clone.store(true, Ordering::SeqCst);
/// });
///
/// let result = poll_until(Duration::from_secs(1), Duration::from_millis(5), || async {
///     flag.load(Ordering::SeqCst)
/// })
/// .await;
///
/// assert!(result);
/// ```
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }

    condition().await
}
