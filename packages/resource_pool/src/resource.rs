use std::fmt::Debug;
use std::hash::Hash;

/// A reusable object that can be managed by a [`ResourcePool`][crate::ResourcePool].
///
/// The pool never looks inside a resource. It only needs two things from it:
///
/// * A stable identity, used to track which resources are currently checked out. Two distinct
///   resources created by the same pool must never share an identity.
/// * An optional reset hook, invoked when the resource is released back into the pool. Use it
///   to clear any state that a consumer set on the resource while it held it.
///
/// Whether a resource is "in use" is tracked by the pool, not by the resource itself.
///
/// # Example
///
/// ```
/// use resource_pool::Resource;
///
/// struct Worker {
///     id: u32,
///     current_task: Option<String>,
/// }
///
/// impl Resource for Worker {
///     type Id = u32;
///
///     fn id(&self) -> u32 {
///         self.id
///     }
///
///     fn reset(&mut self) {
///         self.current_task = None;
///     }
/// }
/// ```
pub trait Resource {
    /// The identity type of the resource.
    type Id: Copy + Eq + Hash + Debug;

    /// Returns the identity of the resource.
    ///
    /// The identity must not change while the resource is managed by a pool.
    fn id(&self) -> Self::Id;

    /// Clears any task-scoped state before the resource becomes available for reuse.
    ///
    /// This is called while the pool's lock is held, so it should be quick and must not block
    /// or call back into the same pool. If it panics, the pool discards the resource and frees
    /// its capacity slot.
    ///
    /// The default implementation does nothing.
    #[cfg_attr(test, mutants::skip)] // Empty by default, nothing to mutate.
    fn reset(&mut self) {}
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    struct Plain(u8);

    impl Resource for Plain {
        type Id = u8;

        fn id(&self) -> u8 {
            self.0
        }
    }

    struct Scratch {
        id: u64,
        buffer: Vec<u8>,
    }

    impl Resource for Scratch {
        type Id = u64;

        fn id(&self) -> u64 {
            self.id
        }

        fn reset(&mut self) {
            self.buffer.clear();
        }
    }

    #[test]
    fn default_reset_leaves_resource_unchanged() {
        let mut plain = Plain(7);
        plain.reset();
        assert_eq!(plain.id(), 7);
    }

    #[test]
    fn custom_reset_clears_state_but_keeps_identity() {
        let mut scratch = Scratch {
            id: 3,
            buffer: vec![1, 2, 3],
        };

        scratch.reset();

        assert!(scratch.buffer.is_empty());
        assert_eq!(scratch.id(), 3);
    }
}
