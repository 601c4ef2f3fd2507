use std::any::type_name;
use std::fmt;

use crate::pool::Factory;
use crate::{DropPolicy, FactoryError, Resource, ResourcePool, ReusePolicy};

/// Capacity used when the builder is not given one, matching a typical small connection pool.
pub const DEFAULT_MAX_SIZE: usize = 5;

/// Builder for creating an instance of [`ResourcePool`].
///
/// The factory is mandatory, whereas other settings are optional. The defaults are a capacity
/// of [`DEFAULT_MAX_SIZE`], [`ReusePolicy::MostRecentlyReleased`] and
/// [`DropPolicy::MayLeakCheckouts`].
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use resource_pool::{DropPolicy, ResourcePool, ReusePolicy};
/// # use resource_pool::Resource;
/// # struct Conn(u32);
/// # impl Resource for Conn {
/// #     type Id = u32;
/// #     fn id(&self) -> u32 { self.0 }
/// # }
///
/// let pool = ResourcePool::builder()
///     .max_size(10)
///     .factory(|| -> io::Result<Conn> { Ok(Conn(1)) })
///     .reuse_policy(ReusePolicy::LeastRecentlyReleased)
///     .drop_policy(DropPolicy::MustNotLeakCheckouts)
///     .build();
///
/// assert_eq!(pool.max_size(), 10);
/// ```
#[must_use]
pub struct ResourcePoolBuilder<T: Resource> {
    max_size: usize,
    factory: Option<Factory<T>>,
    reuse_policy: ReusePolicy,
    drop_policy: DropPolicy,
}

impl<T: Resource> fmt::Debug for ResourcePoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePoolBuilder")
            .field("resource_type", &format_args!("{}", type_name::<T>()))
            .field("max_size", &self.max_size)
            .field("has_factory", &self.factory.is_some())
            .field("reuse_policy", &self.reuse_policy)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T: Resource> ResourcePoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            factory: None,
            reuse_policy: ReusePolicy::default(),
            drop_policy: DropPolicy::default(),
        }
    }

    /// Sets the capacity of the pool: the maximum number of resources, idle or checked out,
    /// that the pool will ever manage at the same time.
    ///
    /// Zero is permitted and yields a pool on which every acquire attempt fails.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the factory used to construct new resources on demand.
    ///
    /// The factory may fail. Its error is surfaced to the caller of
    /// [`ResourcePool::acquire()`] as
    /// [`ResourceConstructionFailed`][crate::AcquireError::ResourceConstructionFailed].
    ///
    /// Every resource produced by the factory must have an identity distinct from all other
    /// resources the pool is tracking.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::atomic::{AtomicU64, Ordering};
    ///
    /// use resource_pool::ResourcePool;
    /// # use resource_pool::Resource;
    /// # struct Conn(u64);
    /// # impl Resource for Conn {
    /// #     type Id = u64;
    /// #     fn id(&self) -> u64 { self.0 }
    /// # }
    ///
    /// let next_id = AtomicU64::new(1);
    ///
    /// let pool = ResourcePool::builder()
    ///     .factory(move || {
    ///         let id = next_id.fetch_add(1, Ordering::Relaxed);
    ///
    ///         if id > 2 {
    ///             return Err("database refused the connection");
    ///         }
    ///
    ///         Ok(Conn(id))
    ///     })
    ///     .build();
    ///
    /// let a = pool.acquire().unwrap();
    /// let b = pool.acquire().unwrap();
    /// assert!(pool.acquire().is_err());
    /// # pool.release(a).unwrap();
    /// # pool.release(b).unwrap();
    /// ```
    pub fn factory<F, E>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<FactoryError>,
    {
        self.factory = Some(Box::new(move || factory().map_err(Into::into)));
        self
    }

    /// Sets the [reuse policy][ReusePolicy], which decides which idle resource is handed out
    /// when more than one is available.
    pub fn reuse_policy(mut self, policy: ReusePolicy) -> Self {
        self.reuse_policy = policy;
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat resources
    /// that are still checked out when the pool is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the resource pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if no factory has been set using [`factory()`][Self::factory].
    #[must_use]
    pub fn build(self) -> ResourcePool<T> {
        let factory = self
            .factory
            .expect("factory must be set using .factory() before calling .build()");

        ResourcePool::new_inner(self.max_size, factory, self.reuse_policy, self.drop_policy)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::convert::Infallible;

    use static_assertions::assert_impl_all;

    use super::*;

    #[derive(Debug)]
    struct Token(u16);

    impl Resource for Token {
        type Id = u16;

        fn id(&self) -> u16 {
            self.0
        }
    }

    assert_impl_all!(ResourcePoolBuilder<Token>: Send, Sync, fmt::Debug);

    #[test]
    fn builder_new_creates_default_state() {
        let builder = ResourcePoolBuilder::<Token>::new();

        assert_eq!(builder.max_size, DEFAULT_MAX_SIZE);
        assert!(builder.factory.is_none());
        assert_eq!(builder.reuse_policy, ReusePolicy::default());
        assert_eq!(builder.drop_policy, DropPolicy::default());
    }

    #[test]
    fn settings_are_carried_into_the_pool() {
        let pool = ResourcePoolBuilder::new()
            .max_size(2)
            .factory(|| Ok::<_, Infallible>(Token(1)))
            .reuse_policy(ReusePolicy::LeastRecentlyReleased)
            .drop_policy(DropPolicy::MustNotLeakCheckouts)
            .build();

        assert_eq!(pool.max_size(), 2);

        let debug = format!("{pool:?}");
        assert!(debug.contains("LeastRecentlyReleased"));
        assert!(debug.contains("MustNotLeakCheckouts"));
    }

    #[test]
    fn factory_error_is_type_erased() {
        let pool = ResourcePoolBuilder::<Token>::new()
            .factory(|| Err("no tokens left"))
            .build();

        let error = pool.acquire().unwrap_err();
        let source = std::error::Error::source(&error).unwrap();

        assert_eq!(source.to_string(), "no tokens left");
    }

    #[test]
    fn debug_reports_factory_presence() {
        let builder = ResourcePoolBuilder::<Token>::new();
        assert!(format!("{builder:?}").contains("has_factory: false"));

        let builder = builder.factory(|| Ok::<_, Infallible>(Token(1)));
        assert!(format!("{builder:?}").contains("has_factory: true"));
    }

    #[test]
    #[should_panic]
    fn build_without_factory_panics() {
        drop(ResourcePoolBuilder::<Token>::new().build());
    }
}
