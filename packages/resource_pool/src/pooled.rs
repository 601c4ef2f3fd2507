use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::{Resource, ResourcePool};

/// A checked out resource that is released back into its pool when dropped.
///
/// Returned by [`ResourcePool::checkout()`]. Dereferences to the resource.
///
/// Use [`detach()`][Self::detach] to take the resource out of the guard without releasing it,
/// e.g. to hand it over to code that calls [`ResourcePool::release()`] on its own terms.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
///
/// use resource_pool::{Resource, ResourcePool};
///
/// struct Buffer {
///     id: u8,
///     data: Vec<u8>,
/// }
///
/// impl Resource for Buffer {
///     type Id = u8;
///
///     fn id(&self) -> u8 {
///         self.id
///     }
///
///     fn reset(&mut self) {
///         self.data.clear();
///     }
/// }
///
/// let pool = ResourcePool::new(1, || {
///     Ok::<_, Infallible>(Buffer {
///         id: 1,
///         data: Vec::new(),
///     })
/// });
///
/// {
///     let mut buffer = pool.checkout().unwrap();
///     buffer.data.extend_from_slice(b"request-scoped");
/// }
///
/// // The guard released the buffer, which was reset on the way back in.
/// let buffer = pool.checkout().unwrap();
/// assert!(buffer.data.is_empty());
/// ```
pub struct PooledResource<'a, T: Resource> {
    pool: &'a ResourcePool<T>,

    // Only `None` after `detach()` or during drop.
    resource: Option<T>,
}

impl<'a, T: Resource> PooledResource<'a, T> {
    pub(crate) fn new(pool: &'a ResourcePool<T>, resource: T) -> Self {
        Self {
            pool,
            resource: Some(resource),
        }
    }

    /// Takes the resource out of the guard without releasing it.
    ///
    /// The resource remains checked out. The caller becomes responsible for eventually passing
    /// it to [`ResourcePool::release()`].
    #[must_use]
    pub fn detach(mut self) -> T {
        self.resource
            .take()
            .expect("resource is only taken by detach() or drop, both of which consume the guard")
    }

    /// The pool this resource was checked out from.
    #[must_use]
    pub fn pool(&self) -> &'a ResourcePool<T> {
        self.pool
    }

    fn get(&self) -> &T {
        self.resource
            .as_ref()
            .expect("resource is only taken by detach() or drop, both of which consume the guard")
    }

    fn get_mut(&mut self) -> &mut T {
        self.resource
            .as_mut()
            .expect("resource is only taken by detach() or drop, both of which consume the guard")
    }
}

impl<T: Resource> Deref for PooledResource<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T: Resource> DerefMut for PooledResource<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<T: Resource> Drop for PooledResource<'_, T> {
    fn drop(&mut self) {
        let Some(resource) = self.resource.take() else {
            return;
        };

        // Only possible if the resource changed its identity while checked out. The resource is
        // dropped and its old identity stays checked out forever, so the capacity is lost.
        if let Err(rejected) = self.pool.release(resource) {
            warn!(
                id = ?rejected.id(),
                "pooled resource changed identity while checked out and could not be released"
            );
        }
    }
}

impl<T: Resource> fmt::Debug for PooledResource<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResource")
            .field("id", &self.resource.as_ref().map(Resource::id))
            .finish_non_exhaustive()
    }
}
