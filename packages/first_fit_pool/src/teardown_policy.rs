/// Determines what happens when an allocator that still has live blocks is dropped without
/// an explicit [`teardown()`][crate::PoolAllocator::teardown].
///
/// By default, the pool is released together with any blocks that are still allocated.
///
/// # Examples
///
/// ```
/// use first_fit_pool::{PoolAllocator, TeardownPolicy};
/// use new_zealand::nz;
///
/// // The teardown policy is set at pool creation time.
/// let mut pool = PoolAllocator::builder()
///     .capacity(nz!(64))
///     .teardown_policy(TeardownPolicy::MustNotReleaseLiveBlocks)
///     .build()
///     .unwrap();
///
/// let address = pool.alloc(8).unwrap();
/// pool.free(address).unwrap();
///
/// // No live blocks remain, so dropping is fine.
/// drop(pool);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum TeardownPolicy {
    /// Dropping the allocator releases the pool even if blocks are still allocated. This is
    /// the default.
    #[default]
    MayReleaseLiveBlocks,

    /// Dropping the allocator panics if any block is still allocated.
    ///
    /// This may be valuable when addresses are stored in long-lived structures (such as a
    /// linked list built inside the pool) and every block is expected to be freed or the pool
    /// explicitly torn down before the allocator goes away. Leaked blocks then surface as a
    /// loud failure instead of going unnoticed.
    MustNotReleaseLiveBlocks,
}
