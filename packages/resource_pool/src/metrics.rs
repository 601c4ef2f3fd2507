//! Metrics for resource pools.
//!
//! The events are shared by all pools in the process. They use per-thread event instances to
//! minimize contention.

use nm::{Event, Magnitude};

/// Histogram buckets for resource construction time in milliseconds.
///
/// Pooled resources are by definition expensive to construct (connections, workers), so we
/// expect a wide distribution reaching into seconds.
const CONSTRUCT_TIME_MS_BUCKETS: &[Magnitude] = &[0, 1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000];

thread_local! {
    /// A resource was successfully handed out, whether reused or newly constructed.
    pub(crate) static ACQUIRED: Event = Event::builder()
        .name("resource_pool_acquired")
        .build();

    /// A new resource was constructed by the factory.
    pub(crate) static CREATED: Event = Event::builder()
        .name("resource_pool_created")
        .build();

    /// An acquire attempt failed because the pool was at capacity.
    pub(crate) static EXHAUSTED: Event = Event::builder()
        .name("resource_pool_exhausted")
        .build();

    /// The factory failed to construct a resource.
    pub(crate) static CONSTRUCTION_FAILED: Event = Event::builder()
        .name("resource_pool_construction_failed")
        .build();

    /// A resource was returned to the pool.
    pub(crate) static RELEASED: Event = Event::builder()
        .name("resource_pool_released")
        .build();

    /// A resource was dropped on release because its reset hook panicked.
    pub(crate) static DISCARDED: Event = Event::builder()
        .name("resource_pool_discarded")
        .build();

    /// Time spent inside the factory, successful or not.
    ///
    /// The magnitude is the construction time in milliseconds.
    pub(crate) static CONSTRUCT_TIME_MS: Event = Event::builder()
        .name("resource_pool_construct_time_ms")
        .histogram(CONSTRUCT_TIME_MS_BUCKETS)
        .build();
}
