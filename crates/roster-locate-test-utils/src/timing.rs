//! Timing helpers for tests that assert on wall-clock behavior
//!
//! - [`measure_sync`]: time a synchronous closure
//! - [`measure_async`]: time a future
//! - [`assert_duration_below`]: assert an upper bound
//! - [`assert_duration_above`]: assert a lower bound

use std::future::Future;
use std::time::{Duration, Instant};

fn report(label: &str, elapsed: Duration) {
    println!("[TIMING] {label}: {}ms", elapsed.as_millis());
}

/// Runs `f` and returns its result with the elapsed time
///
/// ```
/// use roster_locate_test_utils::timing::measure_sync;
///
/// let (sum, _elapsed) = measure_sync("sum", || (1..=10).sum::<u32>());
/// assert_eq!(sum, 55);
/// ```
pub fn measure_sync<F, T>(label: &str, f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let started = Instant::now();
    let value = f();
    let elapsed = started.elapsed();
    report(label, elapsed);
    (value, elapsed)
}

/// Awaits `fut` and returns its output with the elapsed time
pub async fn measure_async<F, T>(label: &str, fut: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let value = fut.await;
    let elapsed = started.elapsed();
    report(label, elapsed);
    (value, elapsed)
}

/// Panics unless `elapsed <= limit`
///
/// ```
/// use roster_locate_test_utils::timing::assert_duration_below;
/// use std::time::Duration;
///
/// assert_duration_below(Duration::from_millis(500), Duration::from_secs(1), "ocr");
/// ```
pub fn assert_duration_below(elapsed: Duration, limit: Duration, label: &str) {
    if elapsed > limit {
        panic!(
            "{label}: {}ms exceeds the {}ms limit",
            elapsed.as_millis(),
            limit.as_millis()
        );
    }
}

/// Panics unless `elapsed >= floor`
///
/// Catches loops that were expected to wait but returned early.
pub fn assert_duration_above(elapsed: Duration, floor: Duration, label: &str) {
    if elapsed < floor {
        panic!(
            "{label}: {}ms is under the {}ms floor",
            elapsed.as_millis(),
            floor.as_millis()
        );
    }
}
