use std::any::type_name;
use std::collections::VecDeque;
use std::fmt;
use std::thread;

use foldhash::{HashSet, HashSetExt};
use nm::Event;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::metrics::{
    ACQUIRED, CONSTRUCT_TIME_MS, CONSTRUCTION_FAILED, CREATED, DISCARDED, EXHAUSTED, RELEASED,
};
use crate::{
    AcquireError, DropPolicy, FactoryError, PoolStatus, PooledResource, Resource,
    ResourcePoolBuilder, ReusePolicy, UnknownResource,
};

/// Type-erased resource constructor.
pub(crate) type Factory<T> = Box<dyn Fn() -> Result<T, FactoryError> + Send + Sync>;

/// A bounded pool of reusable, possibly expensive-to-construct resources.
///
/// Resources are created lazily by a factory supplied at pool creation, only when no idle
/// resource exists and the pool is below capacity. Once created, a resource is never destroyed
/// by the pool unless explicitly drained via [`drain_available()`][1].
///
/// Every resource the pool knows about is either *available* (idle in the pool) or *in use*
/// (checked out by a caller), never both. The sum of the two never exceeds the capacity.
///
/// There are two ways to check out a resource:
///
/// * [`acquire()`][2] moves the resource to the caller, who must hand it back via
///   [`release()`][3].
/// * [`checkout()`][4] wraps the resource in a [`PooledResource`] guard that releases it
///   automatically when dropped.
///
/// # Exhaustion
///
/// No operation ever blocks waiting for capacity. When the pool is at capacity and nothing is
/// idle, acquiring fails immediately with [`AcquireError::PoolExhausted`].
///
/// # Thread safety
///
/// The pool is thread-safe ([`Send`] + [`Sync`]) as long as both the resource and its
/// [identity type][Resource::Id] are [`Send`]. All bookkeeping happens under a single lock.
/// The factory runs outside the lock, with a capacity slot reserved for the duration of the
/// construction.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use resource_pool::{Resource, ResourcePool};
///
/// #[derive(Debug)]
/// struct Connection {
///     id: u32,
/// }
///
/// impl Resource for Connection {
///     type Id = u32;
///
///     fn id(&self) -> u32 {
///         self.id
///     }
/// }
///
/// let next_id = AtomicU32::new(1);
/// let pool = ResourcePool::new(2, move || {
///     Ok::<_, Infallible>(Connection {
///         id: next_id.fetch_add(1, Ordering::Relaxed),
///     })
/// });
///
/// let first = pool.acquire().unwrap();
/// let second = pool.acquire().unwrap();
/// assert!(pool.acquire().unwrap_err().is_exhausted());
///
/// pool.release(first).unwrap();
/// let reused = pool.acquire().unwrap();
/// assert_eq!(reused.id, 1);
/// # pool.release(second).unwrap();
/// # pool.release(reused).unwrap();
/// ```
///
/// [1]: Self::drain_available
/// [2]: Self::acquire
/// [3]: Self::release
/// [4]: Self::checkout
pub struct ResourcePool<T: Resource> {
    state: Mutex<PoolState<T>>,
    factory: Factory<T>,

    max_size: usize,
    reuse_policy: ReusePolicy,
    drop_policy: DropPolicy,
}

struct PoolState<T: Resource> {
    /// Idle resources. New arrivals are always pushed to the back, the reuse policy decides
    /// which end we take from.
    available: VecDeque<T>,

    /// Identities of resources currently held by callers.
    in_use: HashSet<T::Id>,

    /// Capacity slots reserved by threads that are running the factory right now.
    constructing: usize,
}

impl<T: Resource> PoolState<T> {
    fn new() -> Self {
        Self {
            available: VecDeque::new(),
            in_use: HashSet::new(),
            constructing: 0,
        }
    }

    /// Every slot that counts against capacity: idle, checked out or under construction.
    fn occupied(&self) -> usize {
        self.available
            .len()
            .checked_add(self.in_use.len())
            .and_then(|n| n.checked_add(self.constructing))
            .expect("pool occupancy is bounded by max_size so cannot overflow")
    }

    fn take_available(&mut self, policy: ReusePolicy) -> Option<T> {
        match policy {
            ReusePolicy::MostRecentlyReleased => self.available.pop_back(),
            ReusePolicy::LeastRecentlyReleased => self.available.pop_front(),
        }
    }

    fn tracks(&self, id: T::Id) -> bool {
        self.in_use.contains(&id) || self.available.iter().any(|r| r.id() == id)
    }
}

impl<T: Resource> ResourcePool<T> {
    pub(crate) fn new_inner(
        max_size: usize,
        factory: Factory<T>,
        reuse_policy: ReusePolicy,
        drop_policy: DropPolicy,
    ) -> Self {
        Self {
            state: Mutex::new(PoolState::new()),
            factory,
            max_size,
            reuse_policy,
            drop_policy,
        }
    }

    /// Creates a pool with the given capacity and factory, using the default configuration for
    /// everything else.
    ///
    /// A capacity of zero is permitted. Such a pool fails every acquire attempt with
    /// [`AcquireError::PoolExhausted`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::io;
    ///
    /// use resource_pool::{Resource, ResourcePool};
    /// # struct Socket(u16);
    /// # impl Resource for Socket {
    /// #     type Id = u16;
    /// #     fn id(&self) -> u16 { self.0 }
    /// # }
    ///
    /// let pool = ResourcePool::new(3, || -> io::Result<Socket> { Ok(Socket(8080)) });
    /// assert_eq!(pool.max_size(), 3);
    /// assert!(pool.is_empty());
    /// ```
    #[must_use]
    pub fn new<F, E>(max_size: usize, factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<FactoryError>,
    {
        Self::builder().max_size(max_size).factory(factory).build()
    }

    /// Starts building a new [`ResourcePool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    pub fn builder() -> ResourcePoolBuilder<T> {
        ResourcePoolBuilder::new()
    }

    /// Checks out a resource.
    ///
    /// The most suitable idle resource (per the [`ReusePolicy`]) is handed out if one exists.
    /// Otherwise, if the pool is below capacity, a new resource is constructed via the factory.
    /// The returned resource is tracked as in use until it is passed to [`release()`][1].
    ///
    /// # Errors
    ///
    /// * [`AcquireError::PoolExhausted`] if the pool is at capacity and nothing is idle.
    /// * [`AcquireError::ResourceConstructionFailed`] if the factory failed. The pool state is
    ///   unchanged in this case.
    ///
    /// # Panics
    ///
    /// Panics if the factory produces a resource whose identity the pool is already tracking.
    ///
    /// [1]: Self::release
    pub fn acquire(&self) -> Result<T, AcquireError> {
        let slot = {
            let mut state = self.state.lock();

            if let Some(resource) = state.take_available(self.reuse_policy) {
                let id = resource.id();
                let newly_tracked = state.in_use.insert(id);
                drop(state);

                debug_assert!(
                    newly_tracked,
                    "an available resource cannot also be in use"
                );

                trace!(?id, "reusing available resource");
                ACQUIRED.with(Event::observe_once);
                return Ok(resource);
            }

            let Some(slot) = self.reserve_slot(&mut state) else {
                drop(state);

                debug!(max_size = self.max_size, "resource pool exhausted");
                EXHAUSTED.with(Event::observe_once);
                return Err(AcquireError::PoolExhausted {
                    max_size: self.max_size,
                });
            };

            slot
        };

        let resource = slot.construct()?;
        slot.commit_in_use(&resource);

        ACQUIRED.with(Event::observe_once);
        Ok(resource)
    }

    /// Checks out a resource wrapped in a guard that releases it back into the pool when
    /// dropped.
    ///
    /// # Errors
    ///
    /// Same as [`acquire()`][1].
    ///
    /// # Example
    ///
    /// ```
    /// use std::convert::Infallible;
    ///
    /// use resource_pool::{Resource, ResourcePool};
    /// # struct Conn(u32);
    /// # impl Resource for Conn {
    /// #     type Id = u32;
    /// #     fn id(&self) -> u32 { self.0 }
    /// # }
    ///
    /// let pool = ResourcePool::new(1, || Ok::<_, Infallible>(Conn(1)));
    ///
    /// {
    ///     let conn = pool.checkout().unwrap();
    ///     assert_eq!(conn.0, 1);
    ///     assert_eq!(pool.in_use_len(), 1);
    /// }
    ///
    /// assert_eq!(pool.in_use_len(), 0);
    /// assert_eq!(pool.available_len(), 1);
    /// ```
    ///
    /// [1]: Self::acquire
    pub fn checkout(&self) -> Result<PooledResource<'_, T>, AcquireError> {
        self.acquire()
            .map(|resource| PooledResource::new(self, resource))
    }

    /// Returns a checked out resource to the pool.
    ///
    /// The resource's [reset hook][Resource::reset] is invoked and the resource becomes
    /// available for reuse.
    ///
    /// # Panics
    ///
    /// If the reset hook panics, the panic is propagated and the resource is discarded. Its
    /// capacity slot is freed, so a later acquire may construct a replacement.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownResource`] if the resource is not currently checked out from this pool,
    /// e.g. because it was already released or was never acquired from this pool. The pool
    /// state is not modified and the resource is handed back inside the error, not reset.
    pub fn release(&self, mut resource: T) -> Result<(), UnknownResource<T, T::Id>> {
        let id = resource.id();
        let mut state = self.state.lock();

        if !state.in_use.remove(&id) {
            drop(state);

            debug!(?id, "rejected release of resource that is not checked out");
            return Err(UnknownResource::new(id, resource));
        }

        // Runs under the lock. If it panics, the resource is dropped during unwinding and its
        // slot stays freed, as the id has already left `in_use`.
        let mut watch = ResetWatch::new(id);
        resource.reset();
        watch.completed = true;

        state.available.push_back(resource);
        drop(state);

        trace!(?id, "resource released");
        RELEASED.with(Event::observe_once);
        Ok(())
    }

    /// Adds an externally constructed resource to the pool as an available resource.
    ///
    /// This can be used to seed the pool with resources that were created through some other
    /// channel than the factory.
    ///
    /// # Errors
    ///
    /// Returns the resource back if the pool is at capacity or if it is already tracking a
    /// resource with the same identity.
    pub fn try_insert(&self, resource: T) -> Result<(), T> {
        let id = resource.id();
        let mut state = self.state.lock();

        if state.occupied() >= self.max_size || state.tracks(id) {
            return Err(resource);
        }

        state.available.push_back(resource);
        drop(state);

        trace!(?id, "external resource inserted");
        Ok(())
    }

    /// Eagerly constructs up to `count` resources and makes them available, so that later
    /// acquire calls do not pay the construction cost.
    ///
    /// Stops early when the pool reaches capacity. Returns the number of resources created.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::ResourceConstructionFailed`] if the factory fails. Resources
    /// constructed before the failure remain in the pool.
    ///
    /// # Panics
    ///
    /// Panics if the factory produces a resource whose identity the pool is already tracking.
    pub fn prefill(&self, count: usize) -> Result<usize, AcquireError> {
        let mut created: usize = 0;

        while created < count {
            let Some(slot) = self.reserve_slot(&mut self.state.lock()) else {
                break;
            };

            let resource = slot.construct()?;
            slot.commit_available(resource);

            created = created
                .checked_add(1)
                .expect("bounded by count so cannot overflow");
        }

        debug!(requested = count, created, "prefilled resource pool");
        Ok(created)
    }

    /// Removes every available resource from the pool and hands them to the caller.
    ///
    /// Checked out resources are not affected. The capacity freed up by the drained resources
    /// becomes usable for constructing new resources.
    #[must_use]
    pub fn drain_available(&self) -> Vec<T> {
        let drained: Vec<T> = self.state.lock().available.drain(..).collect();

        debug!(count = drained.len(), "drained available resources");
        drained
    }

    /// The capacity of the pool.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The number of resources managed by the pool, whether available or in use.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.lock();

        state
            .available
            .len()
            .checked_add(state.in_use.len())
            .expect("bounded by max_size so cannot overflow")
    }

    /// Whether the pool manages no resources at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of idle resources ready to be handed out.
    #[must_use]
    pub fn available_len(&self) -> usize {
        self.state.lock().available.len()
    }

    /// The number of resources currently checked out.
    #[must_use]
    pub fn in_use_len(&self) -> usize {
        self.state.lock().in_use.len()
    }

    /// Whether the resource with the given identity is currently checked out from this pool.
    #[must_use]
    pub fn is_checked_out(&self, id: T::Id) -> bool {
        self.state.lock().in_use.contains(&id)
    }

    /// A consistent snapshot of the pool occupancy.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.state.lock();

        PoolStatus {
            available: state.available.len(),
            in_use: state.in_use.len(),
            constructing: state.constructing,
            max_size: self.max_size,
        }
    }

    /// Reserves capacity for one resource under construction, if the pool has room.
    fn reserve_slot(&self, state: &mut PoolState<T>) -> Option<ConstructionSlot<'_, T>> {
        if state.occupied() >= self.max_size {
            return None;
        }

        state.constructing = state
            .constructing
            .checked_add(1)
            .expect("bounded by max_size so cannot overflow");

        Some(ConstructionSlot {
            pool: self,
            armed: true,
        })
    }
}

/// A capacity slot reserved for a resource that is being constructed outside the lock.
///
/// If the slot is dropped without being committed (factory failure or panic), the reservation
/// is returned to the pool.
struct ConstructionSlot<'a, T: Resource> {
    pool: &'a ResourcePool<T>,
    armed: bool,
}

impl<'a, T: Resource> ConstructionSlot<'a, T> {
    /// Runs the factory. The slot remains reserved until it is committed or dropped.
    fn construct(&self) -> Result<T, AcquireError> {
        CONSTRUCT_TIME_MS
            .with(|e| e.observe_duration_millis(|| (self.pool.factory)()))
            .map_err(|source| {
                debug!(error = %source, "resource construction failed");
                CONSTRUCTION_FAILED.with(Event::observe_once);
                AcquireError::ResourceConstructionFailed { source }
            })
    }

    /// Tracks the constructed resource as checked out by the caller.
    fn commit_in_use(self, resource: &T) {
        let id = resource.id();
        self.settle(id).in_use.insert(id);

        debug!(?id, "constructed new resource");
        CREATED.with(Event::observe_once);
    }

    /// Adds the constructed resource to the idle set.
    fn commit_available(self, resource: T) {
        let id = resource.id();
        self.settle(id).available.push_back(resource);

        debug!(?id, "constructed new resource for prefill");
        CREATED.with(Event::observe_once);
    }

    /// Turns the reservation into a real resource slot, returning the locked state so the
    /// caller can place the resource without any other thread observing the gap.
    fn settle(mut self, id: T::Id) -> MutexGuard<'a, PoolState<T>> {
        let mut state = self.pool.state.lock();

        self.armed = false;
        state.constructing = state
            .constructing
            .checked_sub(1)
            .expect("a reserved slot is always counted in constructing");

        assert!(
            !state.tracks(id),
            "factory produced resource {id:?} but the pool is already tracking a resource with that identity"
        );

        state
    }
}

impl<T: Resource> Drop for ConstructionSlot<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut state = self.pool.state.lock();
        state.constructing = state
            .constructing
            .checked_sub(1)
            .expect("a reserved slot is always counted in constructing");
    }
}

/// Records a resource lost to a panicking reset hook.
struct ResetWatch<Id: fmt::Debug> {
    id: Id,
    completed: bool,
}

impl<Id: fmt::Debug> ResetWatch<Id> {
    fn new(id: Id) -> Self {
        Self {
            id,
            completed: false,
        }
    }
}

impl<Id: fmt::Debug> Drop for ResetWatch<Id> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        warn!(id = ?self.id, "resource reset panicked, resource discarded");
        DISCARDED.with(Event::observe_once);
    }
}

impl<T: Resource> fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status();

        f.debug_struct(type_name::<Self>())
            .field("max_size", &self.max_size)
            .field("available", &status.available)
            .field("in_use", &status.in_use)
            .field("constructing", &status.constructing)
            .field("reuse_policy", &self.reuse_policy)
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}

impl<T: Resource> Drop for ResourcePool<T> {
    fn drop(&mut self) {
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was.
        if self.drop_policy == DropPolicy::MustNotLeakCheckouts && !thread::panicking() {
            let in_use = self.state.get_mut().in_use.len();

            assert!(
                in_use == 0,
                "dropped a resource pool with {in_use} resources still checked out while using DropPolicy::MustNotLeakCheckouts"
            );
        }
    }
}
