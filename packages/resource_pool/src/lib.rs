#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A bounded pool of reusable, possibly expensive-to-construct resources.
//!
//! This crate provides [`ResourcePool`], which hands out resources such as database connections
//! or workers, constructs new ones lazily through a factory when none are idle, and takes them
//! back for reuse when callers are done with them.
//!
//! # Key features
//!
//! - **Bounded**: the number of resources, idle plus checked out, never exceeds the capacity.
//! - **Exclusive checkout**: a resource handed out by the pool is never handed out again until
//!   it has been released. Double release is detected and rejected.
//! - **Reset on release**: the [`Resource::reset()`] hook clears request-scoped state before a
//!   resource is reused.
//! - **Warm reuse**: by default the most recently released resource is reused first. See
//!   [`ReusePolicy`] for the alternative.
//! - **Non-blocking**: exhaustion is reported immediately as [`AcquireError::PoolExhausted`].
//! - **Thread-safe**: all operations take `&self` and the pool can be shared via `Arc`.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! use resource_pool::{Resource, ResourcePool};
//!
//! struct Worker {
//!     id: u32,
//!     task: Option<String>,
//! }
//!
//! impl Resource for Worker {
//!     type Id = u32;
//!
//!     fn id(&self) -> u32 {
//!         self.id
//!     }
//!
//!     fn reset(&mut self) {
//!         self.task = None;
//!     }
//! }
//!
//! let next_id = AtomicU32::new(1);
//! let pool = ResourcePool::new(3, move || {
//!     Ok::<_, Infallible>(Worker {
//!         id: next_id.fetch_add(1, Ordering::Relaxed),
//!         task: None,
//!     })
//! });
//!
//! let mut worker = pool.acquire().unwrap();
//! worker.task = Some("process batch A".to_string());
//! pool.release(worker).unwrap();
//!
//! // The released worker is reused instead of constructing a new one.
//! let worker = pool.acquire().unwrap();
//! assert_eq!(worker.id, 1);
//! assert_eq!(worker.task, None);
//! # pool.release(worker).unwrap();
//! ```
//!
//! # Observability
//!
//! The pool emits `tracing` events at debug and trace level, and records `nm` metrics for
//! acquisitions, constructions, exhaustion and releases.

mod builder;
mod drop_policy;
mod error;
mod metrics;
mod pool;
mod pooled;
mod resource;
mod reuse_policy;
mod status;

pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use pool::ResourcePool;
pub use pooled::PooledResource;
pub use resource::*;
pub use reuse_policy::*;
pub use status::*;
