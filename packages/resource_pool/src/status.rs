/// A point-in-time snapshot of the occupancy of a [`ResourcePool`][crate::ResourcePool].
///
/// All fields are captured under the same lock, so they are consistent with each other.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct PoolStatus {
    /// Resources that are idle and ready to be handed out.
    pub available: usize,

    /// Resources that are currently checked out.
    pub in_use: usize,

    /// Resources whose construction is in progress on some thread.
    pub constructing: usize,

    /// The capacity of the pool.
    pub max_size: usize,
}

impl PoolStatus {
    /// How many more resources could be acquired right now without failing with
    /// [`PoolExhausted`][crate::AcquireError::PoolExhausted], counting both idle resources
    /// and unused capacity.
    #[must_use]
    pub fn headroom(&self) -> usize {
        self.max_size
            .saturating_sub(self.in_use)
            .saturating_sub(self.constructing)
    }
}
