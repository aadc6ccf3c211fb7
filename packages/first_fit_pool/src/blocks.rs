use std::num::NonZero;

use tracing::trace;

use crate::BlockDescriptor;

/// The ordered set of block descriptors that partitions a pool.
///
/// Descriptors live in a `Vec` sorted by offset, so the physical neighbors of the block at
/// index `i` are simply the entries at `i - 1` and `i + 1`. Nothing here refers to another
/// descriptor by pointer, which means releasing the table can never touch released memory.
///
/// The table only tracks metadata. Moving payload bytes is the caller's job.
#[derive(Debug)]
pub(crate) struct BlockTable {
    blocks: Vec<BlockDescriptor>,
}

impl BlockTable {
    /// Creates a table with one free block spanning the whole pool.
    #[must_use]
    pub(crate) fn new(capacity: NonZero<usize>) -> Self {
        Self {
            blocks: vec![BlockDescriptor::new(0, capacity.get(), true)],
        }
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub(crate) fn as_slice(&self) -> &[BlockDescriptor] {
        &self.blocks
    }

    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub(crate) fn get(&self, index: usize) -> &BlockDescriptor {
        self.blocks.get(index).unwrap_or_else(|| {
            panic!(
                "block index {index} out of bounds in table of {}",
                self.len()
            )
        })
    }

    fn get_mut(&mut self, index: usize) -> &mut BlockDescriptor {
        let len = self.len();

        self.blocks
            .get_mut(index)
            .unwrap_or_else(|| panic!("block index {index} out of bounds in table of {len}"))
    }

    /// The block physically preceding the one at `index`, if any.
    #[must_use]
    pub(crate) fn previous(&self, index: usize) -> Option<&BlockDescriptor> {
        index.checked_sub(1).and_then(|previous| self.blocks.get(previous))
    }

    /// The block physically following the one at `index`, if any.
    #[must_use]
    pub(crate) fn next(&self, index: usize) -> Option<&BlockDescriptor> {
        index.checked_add(1).and_then(|next| self.blocks.get(next))
    }

    /// Index of the block that starts exactly at `offset`.
    #[must_use]
    pub(crate) fn index_of(&self, offset: usize) -> Option<usize> {
        self.blocks
            .binary_search_by_key(&offset, BlockDescriptor::offset)
            .ok()
    }

    /// Index of the lowest-offset free block that can hold `size` bytes.
    #[must_use]
    pub(crate) fn first_fit(&self, size: usize) -> Option<usize> {
        self.blocks
            .iter()
            .position(|block| block.is_free() && block.size() >= size)
    }

    /// Marks the free block at `index` as allocated with exactly `size` bytes, splitting off
    /// the remainder as a new free block that directly follows it.
    ///
    /// # Panics
    ///
    /// Panics if the block is not free, is smaller than `size` or `size` is zero.
    pub(crate) fn claim(&mut self, index: usize, size: usize) {
        assert!(size > 0, "zero-sized blocks are never claimed");

        let block = self.get_mut(index);

        assert!(block.is_free(), "claimed block {index} is not free");
        let remainder = block
            .size()
            .checked_sub(size)
            .unwrap_or_else(|| panic!("block {index} is too small to claim {size} bytes"));

        block.set_free(false);

        if remainder == 0 {
            trace!(index, size, "exact fit");
            return;
        }

        block.set_size(size);
        let remainder_offset = block
            .offset()
            .checked_add(size)
            .expect("split point lies inside the block, which lies inside the pool");

        let remainder_index = index
            .checked_add(1)
            .expect("index came from a Vec so it cannot be usize::MAX");
        self.blocks.insert(
            remainder_index,
            BlockDescriptor::new(remainder_offset, remainder, true),
        );

        trace!(index, size, remainder, "split");
    }

    /// Marks the block at `index` as free and merges it with free neighbors.
    ///
    /// Returns the index of the resulting free block. Releasing an already free block does
    /// nothing and returns the same index.
    pub(crate) fn release(&mut self, index: usize) -> usize {
        let block = self.get_mut(index);

        if block.is_free() {
            return index;
        }

        block.set_free(true);

        let mut index = index;

        if self.previous(index).is_some_and(BlockDescriptor::is_free) {
            index = self.merge_into_previous(index);
        }

        if self.next(index).is_some_and(BlockDescriptor::is_free) {
            self.merge_next(index);
        }

        index
    }

    /// Grows the block at `index` by absorbing the whole free block that follows it.
    ///
    /// # Panics
    ///
    /// Panics if there is no following block or it is not free.
    pub(crate) fn absorb_next(&mut self, index: usize) {
        assert!(
            self.next(index).is_some_and(BlockDescriptor::is_free),
            "block {index} has no free successor to absorb"
        );

        self.merge_next(index);
    }

    /// Merges the block at `index` into the free block that precedes it. The merged block
    /// takes over the allocation state of the block at `index`.
    ///
    /// Returns the index of the merged block, which starts where the predecessor started.
    ///
    /// # Panics
    ///
    /// Panics if there is no preceding block or it is not free.
    pub(crate) fn absorb_into_previous(&mut self, index: usize) -> usize {
        assert!(
            self.previous(index).is_some_and(BlockDescriptor::is_free),
            "block {index} has no free predecessor to merge into"
        );

        let free = self.get(index).is_free();
        let merged = self.merge_into_previous(index);
        self.get_mut(merged).set_free(free);

        merged
    }

    /// Removes the block after `index`, adding its size to the block at `index`.
    fn merge_next(&mut self, index: usize) {
        let next_index = index
            .checked_add(1)
            .expect("index came from a Vec so it cannot be usize::MAX");
        let next = self.blocks.remove(next_index);

        let block = self.get_mut(index);
        let merged_size = block
            .size()
            .checked_add(next.size())
            .expect("merged blocks stay inside the pool, whose size fits in usize");
        block.set_size(merged_size);

        trace!(index, absorbed = next.size(), merged_size, "coalesced with next");
    }

    /// Removes the block at `index`, adding its size to the block before it. Returns the index
    /// of the surviving block.
    fn merge_into_previous(&mut self, index: usize) -> usize {
        let previous_index = index
            .checked_sub(1)
            .expect("callers check that a predecessor exists");
        let removed = self.blocks.remove(index);

        let previous = self.get_mut(previous_index);
        let merged_size = previous
            .size()
            .checked_add(removed.size())
            .expect("merged blocks stay inside the pool, whose size fits in usize");
        previous.set_size(merged_size);

        trace!(
            index = previous_index,
            absorbed = removed.size(),
            merged_size,
            "coalesced with previous"
        );

        previous_index
    }

    #[must_use]
    pub(crate) fn live_count(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_free()).count()
    }

    #[must_use]
    pub(crate) fn free_bytes(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.is_free())
            .map(BlockDescriptor::size)
            .sum()
    }

    #[must_use]
    pub(crate) fn largest_free(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.is_free())
            .map(BlockDescriptor::size)
            .max()
            .unwrap_or(0)
    }

    /// Verifies that the descriptors partition `[0, capacity)` in order, that every block is
    /// non-empty and that no two neighbors are both free.
    ///
    /// # Panics
    ///
    /// Panics if any of the invariants does not hold.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(any(debug_assertions, test))]
    pub(crate) fn integrity_check(&self, capacity: usize) {
        let mut expected_offset = 0_usize;
        let mut previous_was_free = false;

        for (index, block) in self.blocks.iter().enumerate() {
            assert!(block.size() > 0, "block {index} is empty: {block:?}");

            assert!(
                block.offset() == expected_offset,
                "block {index} starts at {} but the previous block ended at {expected_offset}",
                block.offset()
            );

            assert!(
                !(previous_was_free && block.is_free()),
                "blocks {} and {index} are both free and were not coalesced",
                index.saturating_sub(1)
            );

            expected_offset = block.end();
            previous_was_free = block.is_free();
        }

        assert!(
            expected_offset == capacity,
            "blocks cover {expected_offset} bytes but the pool holds {capacity}"
        );
    }
}
