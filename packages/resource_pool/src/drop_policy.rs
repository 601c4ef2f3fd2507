/// Determines pool behavior when the pool is dropped while resources are still checked out.
///
/// By default, the pool is dropped silently and checked out resources simply remain owned by
/// whoever holds them.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use resource_pool::{DropPolicy, ResourcePool};
/// # use resource_pool::Resource;
/// # struct Conn(u32);
/// # impl Resource for Conn {
/// #     type Id = u32;
/// #     fn id(&self) -> u32 { self.0 }
/// # }
///
/// let pool = ResourcePool::builder()
///     .factory(|| Ok::<_, Infallible>(Conn(1)))
///     .drop_policy(DropPolicy::MustNotLeakCheckouts)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool may be dropped while resources are checked out. This is the default.
    #[default]
    MayLeakCheckouts,

    /// The pool will panic if it still has resources checked out when it is dropped.
    ///
    /// This may be valuable to detect code paths that acquire a resource and never release it.
    MustNotLeakCheckouts,
}
