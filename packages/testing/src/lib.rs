#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in the resource pool workspace.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use resource_pool::Resource;

/// Runs a test with a timeout to prevent infinite hangs.
///
/// Pool tests that share a pool between threads could hang forever if a lock is never
/// released. This wraps the test closure so that such a hang fails the test instead.
///
/// The timeout is 10 seconds under normal conditions and 60 seconds under Miri, where thread
/// synchronization primitives are significantly slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test function is executed directly. This allows mutation testing to properly detect
/// hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has timed out.
        drop(tx.send(result));
    });

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("Test exceeded {}-second timeout", timeout.as_secs());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("Test thread disconnected unexpectedly"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// A pooled resource that detects being held by two parties at the same time.
///
/// Call [`enter()`][Self::enter] after acquiring and [`leave()`][Self::leave] before releasing.
#[derive(Debug)]
pub struct TrackedResource {
    id: u32,
    held: AtomicBool,
    scratch: Vec<u32>,
}

impl TrackedResource {
    /// Creates a resource with the given identity.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            held: AtomicBool::new(false),
            scratch: Vec::new(),
        }
    }

    /// Marks the resource as held by the caller.
    ///
    /// # Panics
    ///
    /// Panics if someone else is already holding the resource.
    pub fn enter(&self) {
        let was_held = self.held.swap(true, Ordering::AcqRel);
        assert!(!was_held, "resource {} is held by two parties", self.id);
    }

    /// Marks the resource as no longer held by the caller.
    pub fn leave(&self) {
        self.held.store(false, Ordering::Release);
    }

    /// Request-scoped state. Cleared when the resource is released back into a pool.
    #[must_use]
    pub fn scratch(&self) -> &[u32] {
        &self.scratch
    }

    /// Appends to the request-scoped state.
    pub fn record(&mut self, value: u32) {
        self.scratch.push(value);
    }
}

impl Resource for TrackedResource {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn reset(&mut self) {
        self.scratch.clear();
    }
}

/// Returns a factory that produces [`TrackedResource`]s with ids 1, 2, 3 and so on, together
/// with a counter of how many resources the factory has produced.
#[must_use]
pub fn sequential_factory() -> (
    impl Fn() -> Result<TrackedResource, std::convert::Infallible> + Send + Sync + 'static,
    Arc<AtomicU32>,
) {
    let constructed = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&constructed);

    let factory = move || {
        let id = counter
            .fetch_add(1, Ordering::Relaxed)
            .checked_add(1)
            .expect("test never constructs u32::MAX resources");

        Ok(TrackedResource::new(id))
    };

    (factory, constructed)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn watchdog_allows_fast_tests() {
        let result = with_watchdog(|| 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn sequential_factory_counts_up() {
        let (factory, constructed) = sequential_factory();

        assert_eq!(factory().unwrap().id(), 1);
        assert_eq!(factory().unwrap().id(), 2);
        assert_eq!(constructed.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn reset_clears_scratch() {
        let mut resource = TrackedResource::new(5);
        resource.record(1);
        resource.record(2);
        assert_eq!(resource.scratch(), &[1, 2]);

        resource.reset();
        assert!(resource.scratch().is_empty());
    }

    #[test]
    #[should_panic]
    fn entering_twice_panics() {
        let resource = TrackedResource::new(1);
        resource.enter();
        resource.enter();
    }

    #[test]
    fn enter_after_leave_is_fine() {
        let resource = TrackedResource::new(1);
        resource.enter();
        resource.leave();
        resource.enter();
    }
}
