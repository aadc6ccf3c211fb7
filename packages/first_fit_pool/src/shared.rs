use std::num::NonZero;

use parking_lot::RwLock;

use crate::{Address, BlockDescriptor, PoolAllocator, PoolAllocatorBuilder, Result};

/// A [`PoolAllocator`] that can be shared between threads.
///
/// Every operation that modifies the pool (allocation, freeing, resizing, payload writes,
/// initialization and teardown) holds the exclusive side of a read/write lock for the duration
/// of the call. Read-only queries hold the shared side, so any number of them may run
/// concurrently while no mutation is in progress.
///
/// The lock is not reentrant and is never taken twice by one call. Resize in particular falls
/// back to allocating a new block and freeing the old one without leaving the critical section
/// it entered.
///
/// Because references into the pool cannot outlive the lock guard, payload access goes through
/// closures that run while the lock is held.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use first_fit_pool::PoolAllocator;
/// use new_zealand::nz;
///
/// let pool = Arc::new(PoolAllocator::builder().capacity(nz!(1024)).build_shared().unwrap());
///
/// let workers: Vec<_> = (0..4_u8)
///     .map(|worker| {
///         let pool = Arc::clone(&pool);
///         thread::spawn(move || {
///             let address = pool.alloc(16).unwrap();
///             pool.write_with(address, |bytes| bytes.fill(worker)).unwrap();
///             address
///         })
///     })
///     .collect();
///
/// for worker in workers {
///     let address = worker.join().unwrap();
///     pool.free(address).unwrap();
/// }
///
/// assert_eq!(pool.live_block_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct SharedPoolAllocator {
    inner: RwLock<PoolAllocator>,
}

impl SharedPoolAllocator {
    /// Creates an allocator that does not own a pool yet. Call [`init()`](Self::init) before
    /// using it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for configuring and initializing an allocator. Finish it with
    /// [`build_shared()`](PoolAllocatorBuilder::build_shared).
    #[cfg_attr(test, mutants::skip)] // Gets mutated to alternate version of itself.
    pub fn builder() -> PoolAllocatorBuilder {
        PoolAllocator::builder()
    }

    /// See [`PoolAllocator::init()`].
    ///
    /// # Errors
    ///
    /// See [`PoolAllocator::init()`].
    pub fn init(&self, capacity: NonZero<usize>) -> Result<()> {
        self.inner.write().init(capacity)
    }

    /// See [`PoolAllocator::alloc()`].
    ///
    /// # Errors
    ///
    /// See [`PoolAllocator::alloc()`].
    pub fn alloc(&self, size: usize) -> Result<Address> {
        self.inner.write().alloc(size)
    }

    /// See [`PoolAllocator::free()`].
    ///
    /// # Errors
    ///
    /// See [`PoolAllocator::free()`].
    pub fn free(&self, address: Address) -> Result<()> {
        self.inner.write().free(address)
    }

    /// See [`PoolAllocator::resize()`].
    ///
    /// # Errors
    ///
    /// See [`PoolAllocator::resize()`].
    pub fn resize(&self, address: Address, new_size: usize) -> Result<Address> {
        self.inner.write().resize(address, new_size)
    }

    /// See [`PoolAllocator::teardown()`].
    pub fn teardown(&self) {
        self.inner.write().teardown();
    }

    /// Runs `f` on the bytes of the live block at `address` while holding the shared lock.
    ///
    /// # Errors
    ///
    /// [`AllocError::InvalidAddress`][crate::AllocError::InvalidAddress] if `address` is not a
    /// live block of this pool; `f` is not called.
    pub fn read_with<R>(&self, address: Address, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let allocator = self.inner.read();
        allocator.read(address).map(f)
    }

    /// Runs `f` on the mutable bytes of the live block at `address` while holding the
    /// exclusive lock.
    ///
    /// # Errors
    ///
    /// [`AllocError::InvalidAddress`][crate::AllocError::InvalidAddress] if `address` is not a
    /// live block of this pool; `f` is not called.
    pub fn write_with<R>(&self, address: Address, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        let mut allocator = self.inner.write();
        allocator.write(address).map(f)
    }

    /// See [`PoolAllocator::is_initialized()`].
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.read().is_initialized()
    }

    /// See [`PoolAllocator::capacity()`].
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// See [`PoolAllocator::block_count()`].
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.inner.read().block_count()
    }

    /// See [`PoolAllocator::live_block_count()`].
    #[must_use]
    pub fn live_block_count(&self) -> usize {
        self.inner.read().live_block_count()
    }

    /// See [`PoolAllocator::is_free()`].
    #[must_use]
    pub fn is_free(&self, address: Address) -> bool {
        self.inner.read().is_free(address)
    }

    /// See [`PoolAllocator::free_bytes()`].
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.inner.read().free_bytes()
    }

    /// See [`PoolAllocator::largest_free_block()`].
    #[must_use]
    pub fn largest_free_block(&self) -> usize {
        self.inner.read().largest_free_block()
    }

    /// See [`PoolAllocator::blocks()`].
    #[must_use]
    pub fn blocks(&self) -> Vec<BlockDescriptor> {
        self.inner.read().blocks()
    }

    /// Unwraps the single-threaded allocator.
    #[must_use]
    pub fn into_inner(self) -> PoolAllocator {
        self.inner.into_inner()
    }
}

impl From<PoolAllocator> for SharedPoolAllocator {
    fn from(value: PoolAllocator) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }
}
