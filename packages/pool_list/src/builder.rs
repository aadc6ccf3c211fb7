use std::num::NonZero;

use first_fit_pool::{PoolAllocator, PoolAllocatorBuilder, TeardownPolicy};

use crate::{NodeList, Result, SharedNodeList};

/// Builder for creating a [`NodeList`] or [`SharedNodeList`] together with the pool that will
/// store its nodes.
///
/// The pool capacity is mandatory. Each node takes [`NODE_SIZE`][crate::NODE_SIZE] bytes.
///
/// # Examples
///
/// ```
/// use first_fit_pool::TeardownPolicy;
/// use new_zealand::nz;
/// use pool_list::NodeList;
///
/// let mut list = NodeList::builder()
///     .capacity(nz!(512))
///     .teardown_policy(TeardownPolicy::MustNotReleaseLiveBlocks)
///     .build()
///     .unwrap();
///
/// list.insert(10).unwrap();
///
/// // The policy requires the nodes to be released before the list goes away.
/// list.cleanup();
/// ```
#[derive(Debug)]
#[must_use]
pub struct NodeListBuilder {
    pool: PoolAllocatorBuilder,
}

impl NodeListBuilder {
    pub(crate) fn new() -> Self {
        Self {
            pool: PoolAllocator::builder(),
        }
    }

    /// Sets the size of the pool in bytes.
    #[inline]
    pub fn capacity(self, capacity: NonZero<usize>) -> Self {
        Self {
            pool: self.pool.capacity(capacity),
        }
    }

    /// Sets the [teardown policy][TeardownPolicy] of the pool, which governs what happens when
    /// the list is dropped while it still has nodes and has not been cleaned up.
    #[inline]
    pub fn teardown_policy(self, policy: TeardownPolicy) -> Self {
        Self {
            pool: self.pool.teardown_policy(policy),
        }
    }

    /// Builds a list for single-threaded use.
    ///
    /// # Errors
    ///
    /// [`ListError::Alloc`][crate::ListError::Alloc] if the pool cannot be reserved.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity`](Self::capacity).
    pub fn build(self) -> Result<NodeList> {
        Ok(NodeList::from_pool(self.pool.build()?))
    }

    /// Builds a list that can be shared between threads.
    ///
    /// # Errors
    ///
    /// [`ListError::Alloc`][crate::ListError::Alloc] if the pool cannot be reserved.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity`](Self::capacity).
    pub fn build_shared(self) -> Result<SharedNodeList> {
        self.build().map(SharedNodeList::from)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use first_fit_pool::AllocError;
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::ListError;

    assert_impl_all!(NodeListBuilder: Send, Debug);
    assert_not_impl_any!(NodeListBuilder: Sync);

    #[test]
    #[should_panic]
    fn build_without_capacity_panics() {
        _ = NodeListBuilder::new().build();
    }

    #[test]
    fn build_creates_empty_list_with_requested_pool() {
        let list = NodeListBuilder::new().capacity(nz!(90)).build().unwrap();

        assert!(list.is_empty());
        assert_eq!(list.pool().capacity(), 90);
    }

    #[test]
    fn build_shared_creates_empty_list() {
        let list = NodeListBuilder::new()
            .capacity(nz!(90))
            .build_shared()
            .unwrap();

        assert_eq!(list.count_nodes(), 0);
    }

    #[test]
    fn oversized_capacity_reports_out_of_memory() {
        let result = NodeListBuilder::new()
            .capacity(NonZero::new(usize::MAX).unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ListError::Alloc(AllocError::OutOfMemory { .. }))
        ));
    }
}
