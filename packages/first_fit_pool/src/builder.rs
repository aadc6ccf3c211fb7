use std::cell::Cell;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::{PoolAllocator, Result, SharedPoolAllocator, TeardownPolicy};

/// Builder for creating an initialized [`PoolAllocator`] or [`SharedPoolAllocator`].
///
/// The pool capacity is mandatory, whereas other settings are optional. The terminal method
/// selects the concurrency mode: [`build()`](Self::build) creates a single-threaded allocator,
/// [`build_shared()`](Self::build_shared) one that can be shared between threads.
///
/// # Examples
///
/// ```
/// use first_fit_pool::PoolAllocator;
/// use new_zealand::nz;
///
/// let pool = PoolAllocator::builder().capacity(nz!(4096)).build().unwrap();
/// assert_eq!(pool.capacity(), 4096);
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) and can be safely transferred between threads,
/// allowing pool configuration to happen on different threads than where the pool is used.
/// However, it is not thread-safe ([`Sync`]) as it contains mutable configuration state.
#[derive(Debug)]
#[must_use]
pub struct PoolAllocatorBuilder {
    capacity: Option<NonZero<usize>>,
    teardown_policy: TeardownPolicy,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl PoolAllocatorBuilder {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            teardown_policy: TeardownPolicy::default(),
            _not_sync: PhantomData,
        }
    }

    /// Sets the size of the pool in bytes.
    #[inline]
    pub fn capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the [teardown policy][TeardownPolicy] for the allocator. This governs what happens
    /// when the allocator is dropped while blocks are still allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use first_fit_pool::{PoolAllocator, TeardownPolicy};
    /// use new_zealand::nz;
    ///
    /// let pool = PoolAllocator::builder()
    ///     .capacity(nz!(256))
    ///     .teardown_policy(TeardownPolicy::MustNotReleaseLiveBlocks)
    ///     .build()
    ///     .unwrap();
    /// ```
    #[inline]
    pub fn teardown_policy(mut self, policy: TeardownPolicy) -> Self {
        self.teardown_policy = policy;
        self
    }

    /// Builds and initializes a single-threaded allocator.
    ///
    /// # Errors
    ///
    /// [`AllocError::OutOfMemory`][crate::AllocError::OutOfMemory] if the pool cannot be
    /// reserved.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity`](Self::capacity).
    pub fn build(self) -> Result<PoolAllocator> {
        let capacity = self
            .capacity
            .expect("capacity must be set using .capacity() before calling .build()");

        let mut allocator = PoolAllocator::with_policy(self.teardown_policy);
        allocator.init(capacity)?;
        Ok(allocator)
    }

    /// Builds and initializes an allocator that can be shared between threads.
    ///
    /// # Errors
    ///
    /// [`AllocError::OutOfMemory`][crate::AllocError::OutOfMemory] if the pool cannot be
    /// reserved.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity`](Self::capacity).
    pub fn build_shared(self) -> Result<SharedPoolAllocator> {
        self.build().map(SharedPoolAllocator::from)
    }
}
