use std::num::NonZero;
use std::thread;

use tracing::debug;

use crate::{
    Address, AllocError, Arena, BlockDescriptor, PoolAllocatorBuilder, Result, TeardownPolicy,
};

/// A first-fit allocator over a single fixed-capacity byte pool.
///
/// The allocator hands out [`Address`]es of blocks carved from the pool. A request is served
/// by the lowest-offset free block that is large enough; any excess is split off as a new free
/// block. Freed blocks are merged with free neighbors immediately, so two adjacent blocks are
/// never both free.
///
/// # Lifecycle
///
/// An allocator owns at most one pool at a time. [`init()`](Self::init) reserves it and
/// [`teardown()`](Self::teardown) releases it. Every other operation on an allocator without
/// a pool fails with [`AllocError::NotInitialized`], and initializing twice fails with
/// [`AllocError::AlreadyInitialized`]. Addresses handed out before a teardown are not valid
/// in a later pool of the same allocator.
///
/// Most callers use the [builder](Self::builder), which creates and initializes in one step.
///
/// # Examples
///
/// ```
/// use first_fit_pool::PoolAllocator;
/// use new_zealand::nz;
///
/// let mut pool = PoolAllocator::builder().capacity(nz!(100)).build().unwrap();
///
/// let a = pool.alloc(30).unwrap();
/// let b = pool.alloc(20).unwrap();
/// assert_eq!(b.offset(), 30);
///
/// pool.free(a).unwrap();
///
/// // First fit: the 30-byte hole at the start is reused.
/// let c = pool.alloc(10).unwrap();
/// assert_eq!(c.offset(), 0);
/// ```
///
/// Payload bytes are accessed through the allocator:
///
/// ```
/// use first_fit_pool::PoolAllocator;
/// use new_zealand::nz;
///
/// let mut pool = PoolAllocator::builder().capacity(nz!(64)).build().unwrap();
///
/// let address = pool.alloc(4).unwrap();
/// pool.write(address).unwrap().copy_from_slice(b"abcd");
///
/// let address = pool.resize(address, 32).unwrap();
/// assert_eq!(&pool.read(address).unwrap()[..4], b"abcd");
/// ```
///
/// # Thread safety
///
/// Mutating operations take `&mut self`, so the borrow checker guarantees exclusive access.
/// To share one pool between threads, use [`SharedPoolAllocator`][crate::SharedPoolAllocator].
#[derive(Debug)]
pub struct PoolAllocator {
    /// `None` before `init()` and after `teardown()`.
    arena: Option<Arena>,

    teardown_policy: TeardownPolicy,
}

impl PoolAllocator {
    /// Creates an allocator that does not own a pool yet. Call [`init()`](Self::init) before
    /// using it.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(TeardownPolicy::default())
    }

    /// Creates a builder for configuring and initializing an allocator.
    #[cfg_attr(test, mutants::skip)] // Gets mutated to alternate version of itself.
    pub fn builder() -> PoolAllocatorBuilder {
        PoolAllocatorBuilder::new()
    }

    #[must_use]
    pub(crate) fn with_policy(teardown_policy: TeardownPolicy) -> Self {
        Self {
            arena: None,
            teardown_policy,
        }
    }

    /// Reserves a pool of `capacity` bytes, initially one free block.
    ///
    /// # Errors
    ///
    /// [`AllocError::AlreadyInitialized`] if the allocator already owns a pool, or
    /// [`AllocError::OutOfMemory`] if the pool cannot be reserved. The allocator is unchanged
    /// in both cases.
    pub fn init(&mut self, capacity: NonZero<usize>) -> Result<()> {
        if self.arena.is_some() {
            return Err(AllocError::AlreadyInitialized);
        }

        self.arena = Some(Arena::reserve(capacity)?);

        debug!(capacity = capacity.get(), "pool initialized");
        Ok(())
    }

    /// Whether the allocator currently owns a pool.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.arena.is_some()
    }

    /// Allocates a block of exactly `size` bytes from the first free block that can hold it.
    ///
    /// A zero-byte request returns [`Address::NULL`] and does not create a block.
    ///
    /// # Errors
    ///
    /// [`AllocError::NoSpace`] if no free block is large enough; the pool is unchanged.
    pub fn alloc(&mut self, size: usize) -> Result<Address> {
        self.arena_mut()?.alloc(size)
    }

    /// Returns the block at `address` to the pool, merging it with free neighbors.
    ///
    /// Freeing [`Address::NULL`] does nothing. Freeing a block that is already free also does
    /// nothing: a repeated free of an address this pool handed out is tolerated.
    ///
    /// # Errors
    ///
    /// [`AllocError::InvalidAddress`] if `address` is not the start of a block in this pool.
    /// The pool is unchanged.
    pub fn free(&mut self, address: Address) -> Result<()> {
        self.arena_mut()?.free(address)
    }

    /// Changes the size of the live block at `address`, returning its possibly new address.
    ///
    /// The strategies are tried in order:
    ///
    /// 1. If the block is already at least `new_size` bytes, it is returned unchanged.
    /// 2. If the following block is free and both together are large enough, the block grows
    ///    in place by absorbing the whole following block.
    /// 3. If the preceding block is free and both together are large enough, the block is
    ///    merged into it and the payload moves down to the preceding block's start.
    /// 4. Otherwise a new block is allocated, the payload copied and the old block freed.
    ///
    /// Resizing [`Address::NULL`] allocates; resizing to zero bytes frees the block and returns
    /// [`Address::NULL`].
    ///
    /// # Errors
    ///
    /// [`AllocError::InvalidAddress`] if `address` is not a live block of this pool, or
    /// [`AllocError::NoSpace`] if no strategy can provide `new_size` bytes. In both cases the
    /// original block, its address and its content are unchanged.
    pub fn resize(&mut self, address: Address, new_size: usize) -> Result<Address> {
        self.arena_mut()?.resize(address, new_size)
    }

    /// Releases the block descriptors and the pool. Does nothing if there is no pool.
    ///
    /// Blocks that are still allocated are released too, regardless of the
    /// [`TeardownPolicy`]. Afterwards the allocator can be initialized again.
    pub fn teardown(&mut self) {
        if let Some(arena) = self.arena.take() {
            debug!(
                capacity = arena.capacity(),
                live_blocks = arena.blocks().live_count(),
                "pool torn down"
            );
        }
    }

    /// Bytes of the live block at `address`.
    ///
    /// # Errors
    ///
    /// [`AllocError::InvalidAddress`] if `address` is not a live block of this pool.
    pub fn read(&self, address: Address) -> Result<&[u8]> {
        self.arena()?.payload(address)
    }

    /// Mutable bytes of the live block at `address`.
    ///
    /// # Errors
    ///
    /// [`AllocError::InvalidAddress`] if `address` is not a live block of this pool.
    pub fn write(&mut self, address: Address) -> Result<&mut [u8]> {
        self.arena_mut()?.payload_mut(address)
    }

    /// Capacity of the pool in bytes, or zero if there is no pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.as_ref().map_or(0, Arena::capacity)
    }

    /// Number of block descriptors, free and allocated.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.arena.as_ref().map_or(0, |arena| arena.blocks().len())
    }

    /// Number of allocated blocks.
    #[must_use]
    pub fn live_block_count(&self) -> usize {
        self.arena
            .as_ref()
            .map_or(0, |arena| arena.blocks().live_count())
    }

    /// Whether `address` is the start of a free block of this pool.
    ///
    /// Returns `false` for addresses this pool does not track.
    #[must_use]
    pub fn is_free(&self, address: Address) -> bool {
        self.arena
            .as_ref()
            .is_some_and(|arena| arena.is_free(address))
    }

    /// Total bytes in free blocks.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.arena
            .as_ref()
            .map_or(0, |arena| arena.blocks().free_bytes())
    }

    /// Size of the largest free block, which bounds the largest request that can succeed.
    #[must_use]
    pub fn largest_free_block(&self) -> usize {
        self.arena
            .as_ref()
            .map_or(0, |arena| arena.blocks().largest_free())
    }

    /// Snapshot of the block descriptors in offset order.
    #[must_use]
    pub fn blocks(&self) -> Vec<BlockDescriptor> {
        self.arena
            .as_ref()
            .map_or_else(Vec::new, |arena| arena.blocks().as_slice().to_vec())
    }

    fn arena(&self) -> Result<&Arena> {
        self.arena.as_ref().ok_or(AllocError::NotInitialized)
    }

    fn arena_mut(&mut self) -> Result<&mut Arena> {
        self.arena.as_mut().ok_or(AllocError::NotInitialized)
    }
}

impl Default for PoolAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PoolAllocator {
    fn drop(&mut self) {
        let live_blocks = self.live_block_count();

        // Release the pool before any assertion so a panic does not also leak it.
        self.arena = None;

        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.teardown_policy == TeardownPolicy::MustNotReleaseLiveBlocks && !thread::panicking()
        {
            assert!(
                live_blocks == 0,
                "dropped a pool allocator with {live_blocks} live blocks with a policy that says \
                 it must have none"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use new_zealand::nz;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PoolAllocator: Send, Sync, Debug, Default);

    fn layout(pool: &PoolAllocator) -> Vec<(usize, usize, bool)> {
        pool.blocks()
            .iter()
            .map(|block| (block.offset(), block.size(), block.is_free()))
            .collect()
    }

    #[test]
    fn operations_before_init_fail() {
        let mut pool = PoolAllocator::new();

        assert!(!pool.is_initialized());
        assert_eq!(pool.alloc(1), Err(AllocError::NotInitialized));
        assert_eq!(pool.free(Address::NULL), Err(AllocError::NotInitialized));
        assert_eq!(
            pool.resize(Address::NULL, 1),
            Err(AllocError::NotInitialized)
        );
        assert_eq!(pool.read(Address::NULL), Err(AllocError::NotInitialized));
        assert_eq!(pool.block_count(), 0);
        assert_eq!(pool.capacity(), 0);
        assert!(pool.blocks().is_empty());
    }

    #[test]
    fn init_twice_fails_without_change() {
        let mut pool = PoolAllocator::new();
        pool.init(nz!(10)).unwrap();
        let address = pool.alloc(4).unwrap();

        assert_eq!(pool.init(nz!(20)), Err(AllocError::AlreadyInitialized));
        assert_eq!(pool.capacity(), 10);
        assert!(pool.read(address).is_ok());
    }

    #[test]
    fn operations_after_teardown_fail() {
        let mut pool = PoolAllocator::builder().capacity(nz!(10)).build().unwrap();
        let address = pool.alloc(4).unwrap();

        pool.teardown();

        assert!(!pool.is_initialized());
        assert_eq!(pool.free(address), Err(AllocError::NotInitialized));
        assert_eq!(pool.alloc(1), Err(AllocError::NotInitialized));
        assert!(!pool.is_free(address));

        // Teardown is idempotent.
        pool.teardown();
    }

    #[test]
    fn reinit_invalidates_old_addresses() {
        let mut pool = PoolAllocator::builder().capacity(nz!(10)).build().unwrap();
        let old = pool.alloc(4).unwrap();

        pool.teardown();
        pool.init(nz!(10)).unwrap();
        let new = pool.alloc(4).unwrap();

        assert_eq!(old.offset(), new.offset());
        assert_ne!(old, new);
        assert_eq!(
            pool.free(old),
            Err(AllocError::InvalidAddress { address: old })
        );
    }

    #[test]
    fn first_fit_reuses_earliest_hole() {
        let mut pool = PoolAllocator::builder().capacity(nz!(100)).build().unwrap();

        let a = pool.alloc(30).unwrap();
        let b = pool.alloc(20).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 30);

        pool.free(a).unwrap();
        let c = pool.alloc(10).unwrap();

        assert_eq!(c.offset(), 0);
        assert_eq!(
            layout(&pool),
            vec![(0, 10, false), (10, 20, true), (30, 20, false), (50, 50, true)]
        );
    }

    #[test]
    fn full_alloc_then_free_collapses() {
        let mut pool = PoolAllocator::builder().capacity(nz!(50)).build().unwrap();

        let a = pool.alloc(50).unwrap();
        assert_eq!(pool.block_count(), 1);
        assert_eq!(pool.alloc(1), Err(AllocError::NoSpace { requested: 1 }));

        pool.free(a).unwrap();

        assert_eq!(layout(&pool), vec![(0, 50, true)]);
    }

    #[test]
    fn double_free_is_tolerated() {
        let mut pool = PoolAllocator::builder().capacity(nz!(50)).build().unwrap();
        let a = pool.alloc(10).unwrap();

        pool.free(a).unwrap();
        pool.free(a).unwrap();

        assert_eq!(layout(&pool), vec![(0, 50, true)]);
    }

    #[test]
    fn free_of_interior_offset_is_invalid() {
        let mut pool = PoolAllocator::builder().capacity(nz!(50)).build().unwrap();
        let a = pool.alloc(10).unwrap();
        let before = pool.blocks();

        let interior = Address::new(a.pool_id(), 5);
        assert_eq!(
            pool.free(interior),
            Err(AllocError::InvalidAddress { address: interior })
        );
        assert_eq!(pool.blocks(), before);
    }

    #[test]
    fn statistics_follow_allocations() {
        let mut pool = PoolAllocator::builder().capacity(nz!(100)).build().unwrap();
        let a = pool.alloc(10).unwrap();
        let _b = pool.alloc(10).unwrap();
        pool.free(a).unwrap();

        assert_eq!(pool.capacity(), 100);
        assert_eq!(pool.block_count(), 3);
        assert_eq!(pool.live_block_count(), 1);
        assert_eq!(pool.free_bytes(), 90);
        assert_eq!(pool.largest_free_block(), 80);
        assert!(pool.is_free(a));
    }

    #[test]
    fn write_then_read_round_trips_payload() {
        let mut pool = PoolAllocator::builder().capacity(nz!(16)).build().unwrap();
        let a = pool.alloc(3).unwrap();

        pool.write(a).unwrap().copy_from_slice(&[7, 8, 9]);

        assert_eq!(pool.read(a).unwrap(), &[7, 8, 9]);
    }

    #[test]
    #[should_panic]
    fn drop_with_live_blocks_under_strict_policy_panics() {
        let mut pool = PoolAllocator::builder()
            .capacity(nz!(16))
            .teardown_policy(TeardownPolicy::MustNotReleaseLiveBlocks)
            .build()
            .unwrap();

        _ = pool.alloc(3).unwrap();
    }

    #[test]
    fn explicit_teardown_under_strict_policy_is_fine() {
        let mut pool = PoolAllocator::builder()
            .capacity(nz!(16))
            .teardown_policy(TeardownPolicy::MustNotReleaseLiveBlocks)
            .build()
            .unwrap();

        _ = pool.alloc(3).unwrap();
        pool.teardown();
    }

    #[test]
    fn drop_with_live_blocks_under_default_policy_is_fine() {
        let mut pool = PoolAllocator::builder().capacity(nz!(16)).build().unwrap();
        _ = pool.alloc(3).unwrap();
        drop(pool);
    }
}
