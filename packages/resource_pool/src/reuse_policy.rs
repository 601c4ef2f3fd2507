/// Determines which available resource is handed out when several are idle.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use resource_pool::{ResourcePool, ReusePolicy};
/// # use resource_pool::Resource;
/// # struct Conn(u32);
/// # impl Resource for Conn {
/// #     type Id = u32;
/// #     fn id(&self) -> u32 { self.0 }
/// # }
///
/// let pool = ResourcePool::builder()
///     .max_size(4)
///     .factory(|| Ok::<_, Infallible>(Conn(1)))
///     .reuse_policy(ReusePolicy::LeastRecentlyReleased)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum ReusePolicy {
    /// The most recently released resource is reused first. This is the default.
    ///
    /// Keeps a small set of resources "warm" (e.g. open connections with primed caches) and lets
    /// the rest go idle.
    #[default]
    MostRecentlyReleased,

    /// The least recently released resource is reused first.
    ///
    /// Spreads usage evenly over all idle resources.
    LeastRecentlyReleased,
}
