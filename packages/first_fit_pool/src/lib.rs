#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A first-fit allocator over a single fixed-capacity byte pool.
//!
//! This crate provides [`PoolAllocator`], which reserves one contiguous region of memory up
//! front and then serves allocation, free and resize requests from it. The pool is partitioned
//! into blocks, each either free or allocated:
//!
//! ```text
//!   offset 0                                                            capacity
//!   ┌──────────┬────────┬──────────────────┬──────────────────────────────┐
//!   │ live 30  │ free 20│     live 40      │           free 110           │
//!   └──────────┴────────┴──────────────────┴──────────────────────────────┘
//! ```
//!
//! # Key features
//!
//! - **First-fit placement**: a request is served by the lowest-offset free block that is
//!   large enough, with the excess split off as a new free block.
//! - **Immediate coalescing**: a freed block merges with free neighbors, so two adjacent
//!   blocks are never both free.
//! - **Resize without copying where possible**: a block grows into a free successor in place,
//!   or slides down into a free predecessor, before falling back to relocation.
//! - **Atomic failures**: a failing call leaves the pool exactly as it was. In particular a
//!   resize that cannot be satisfied keeps the original block and its content intact.
//! - **Checked addresses**: every [`Address`] carries the identity of its pool, so freeing an
//!   address from another pool is reported as [`AllocError::InvalidAddress`].
//! - **Two concurrency modes**: [`PoolAllocator`] for exclusive use and
//!   [`SharedPoolAllocator`] for sharing between threads behind a read/write lock.
//!
//! # Example
//!
//! ```
//! use first_fit_pool::{AllocError, PoolAllocator};
//! use new_zealand::nz;
//!
//! let mut pool = PoolAllocator::builder().capacity(nz!(100)).build().unwrap();
//!
//! let a = pool.alloc(60).unwrap();
//! pool.write(a).unwrap()[..5].copy_from_slice(b"hello");
//!
//! // Only 40 bytes are left.
//! assert!(matches!(pool.alloc(50), Err(AllocError::NoSpace { .. })));
//!
//! // Growing into the free successor keeps the address.
//! let a = pool.resize(a, 100).unwrap();
//! assert_eq!(a.offset(), 0);
//! assert_eq!(&pool.read(a).unwrap()[..5], b"hello");
//!
//! pool.free(a).unwrap();
//! assert_eq!(pool.block_count(), 1);
//! ```
//!
//! # Logging
//!
//! Operations emit [`tracing`](https://docs.rs/tracing) events: `debug` for pool lifecycle,
//! `trace` for every placement and merge decision and `warn` when a request cannot be served
//! or names an unknown address. The crate never installs a subscriber itself.

mod address;
mod allocator;
mod arena;
mod block;
mod blocks;
mod builder;
mod error;
mod shared;
mod teardown_policy;

pub use address::*;
pub use allocator::*;
pub(crate) use arena::*;
pub use block::*;
pub(crate) use blocks::*;
pub use builder::*;
pub use error::*;
pub use shared::*;
pub use teardown_policy::*;
