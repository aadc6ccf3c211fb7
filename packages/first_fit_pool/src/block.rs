/// Describes one contiguous range of the pool.
///
/// The descriptors of a pool partition it: they are ordered by offset, never overlap and
/// together cover every byte. Obtain a snapshot through
/// [`PoolAllocator::blocks()`][crate::PoolAllocator::blocks].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BlockDescriptor {
    offset: usize,
    size: usize,
    free: bool,
}

impl BlockDescriptor {
    #[must_use]
    pub(crate) fn new(offset: usize, size: usize, free: bool) -> Self {
        debug_assert!(size > 0, "block descriptors never describe empty ranges");

        Self { offset, size, free }
    }

    /// Byte offset of the first byte of the block.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the block in bytes. Always non-zero.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset one past the last byte of the block.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset
            .checked_add(self.size)
            .expect("blocks never extend past the pool, whose size fits in usize")
    }

    /// Whether the block is available for allocation.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.free
    }

    pub(crate) fn set_free(&mut self, free: bool) {
        self.free = free;
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        debug_assert!(size > 0, "block descriptors never describe empty ranges");

        self.size = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_is_offset_plus_size() {
        let block = BlockDescriptor::new(30, 20, true);

        assert_eq!(block.offset(), 30);
        assert_eq!(block.size(), 20);
        assert_eq!(block.end(), 50);
        assert!(block.is_free());
    }

    #[test]
    fn setters_update_in_place() {
        let mut block = BlockDescriptor::new(0, 10, true);

        block.set_free(false);
        block.set_size(4);

        assert_eq!(block, BlockDescriptor::new(0, 4, false));
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn zero_size_is_rejected_in_debug_builds() {
        _ = BlockDescriptor::new(0, 0, true);
    }
}
