use std::collections::TryReserveError;

use thiserror::Error;

use crate::Address;

/// Errors returned by the pool allocator.
///
/// A failing call never leaves the allocator half-modified: the block descriptors and the pool
/// contents are exactly as they were before the call.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum AllocError {
    /// The backing region of the pool could not be reserved. The allocator instance stays
    /// uninitialized.
    #[error("could not reserve a pool of {capacity} bytes")]
    OutOfMemory {
        /// The capacity that was requested for the pool.
        capacity: usize,

        /// The reservation failure reported by the standard library.
        #[source]
        source: TryReserveError,
    },

    /// No free block is large enough to satisfy the request. This is recoverable: freeing
    /// blocks may make a later request succeed.
    #[error("no free block can hold {requested} bytes")]
    NoSpace {
        /// The number of bytes that was requested.
        requested: usize,
    },

    /// The address is not the start of a block tracked by this allocator. This always
    /// indicates a bug in the caller.
    #[error("address {address} is not tracked by this pool")]
    InvalidAddress {
        /// The address that the caller provided.
        address: Address,
    },

    /// The allocator has not been initialized or has already been torn down.
    #[error("the pool allocator is not initialized")]
    NotInitialized,

    /// The allocator was asked to initialize while it already owns a pool.
    #[error("the pool allocator is already initialized")]
    AlreadyInitialized,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`AllocError`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, AllocError>;
