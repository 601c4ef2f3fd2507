use std::error::Error as StdError;
use std::fmt::{self, Debug};

use thiserror::Error;

/// Type-erased error produced by a resource factory.
pub type FactoryError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur when acquiring a resource from a [`ResourcePool`][crate::ResourcePool].
///
/// Neither variant is retried by the pool. The caller decides the retry policy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AcquireError {
    /// The pool is at capacity and no resource is available.
    ///
    /// This is an expected condition under load. The caller may retry after some resource has
    /// been released or apply backpressure upstream.
    #[error("resource pool exhausted: all {max_size} resources are checked out")]
    PoolExhausted {
        /// The capacity of the pool that was exhausted.
        max_size: usize,
    },

    /// The factory failed to construct a new resource.
    ///
    /// The pool state is left exactly as it was before the acquire attempt.
    #[error("failed to construct a new pooled resource")]
    ResourceConstructionFailed {
        /// The error returned by the factory, unchanged.
        #[source]
        source: FactoryError,
    },
}

impl AcquireError {
    /// Whether this error means the pool was at capacity.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }
}

/// A resource was released into a pool that does not have it checked out.
///
/// Either the resource was already released (double release) or it was never acquired from this
/// pool. The pool state is not modified and the resource is handed back untouched, without its
/// reset hook having been called.
#[derive(Error)]
#[error("resource {id:?} is not checked out from this pool")]
pub struct UnknownResource<T, Id: Debug> {
    id: Id,
    resource: T,
}

impl<T, Id: Debug> UnknownResource<T, Id> {
    pub(crate) fn new(id: Id, resource: T) -> Self {
        Self { id, resource }
    }

    /// The identity of the rejected resource.
    #[must_use]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Takes back ownership of the rejected resource.
    #[must_use]
    pub fn into_resource(self) -> T {
        self.resource
    }
}

// Manual impl so that `T` does not need to be `Debug`.
impl<T, Id: Debug> Debug for UnknownResource<T, Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnknownResource")
            .field("id", &self.id)
            .field(
                "resource_type",
                &format_args!("{}", std::any::type_name::<T>()),
            )
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AcquireError: Send, Sync, Debug);
    assert_impl_all!(UnknownResource<String, u32>: Send, Sync, Debug, StdError);

    #[test]
    fn exhausted_reports_capacity() {
        let error = AcquireError::PoolExhausted { max_size: 3 };

        assert!(error.is_exhausted());
        assert_eq!(
            error.to_string(),
            "resource pool exhausted: all 3 resources are checked out"
        );
    }

    #[test]
    fn construction_failure_preserves_source() {
        let error = AcquireError::ResourceConstructionFailed {
            source: Box::new(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
        };

        assert!(!error.is_exhausted());

        let source = error.source().expect("source must be preserved");
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn unknown_resource_hands_back_resource() {
        let error = UnknownResource::new(9_u32, "conn".to_string());

        assert_eq!(*error.id(), 9);
        assert_eq!(
            error.to_string(),
            "resource 9 is not checked out from this pool"
        );
        assert_eq!(error.into_resource(), "conn");
    }

    #[test]
    fn unknown_resource_debug_does_not_require_debug_resource() {
        struct Opaque;

        let error = UnknownResource::new(1_u8, Opaque);
        let debug = format!("{error:?}");

        assert!(debug.contains("UnknownResource"));
        assert!(debug.contains("Opaque"));
    }
}
