use std::fmt;

/// Identifies the start of a block handed out by a pool allocator.
///
/// An address is only meaningful to the allocator that produced it. Each allocator instance
/// gets a unique pool ID whenever it is initialized, so an address from another pool (or from
/// before a teardown of the same pool) is rejected with
/// [`InvalidAddress`][crate::AllocError::InvalidAddress] instead of being mistaken for a
/// block that happens to start at the same offset.
///
/// [`Address::NULL`] is never handed out for a real block. Freeing it is a no-op and zero-byte
/// allocations return it.
///
/// # Storing addresses inside the pool
///
/// Clients that build linked structures in pool memory can store an address with
/// [`to_le_bytes()`](Self::to_le_bytes) and load it back with
/// [`from_le_bytes()`](Self::from_le_bytes). The encoding is always
/// [`ENCODED_LEN`](Self::ENCODED_LEN) bytes.
///
/// # Example
///
/// ```
/// use first_fit_pool::{Address, PoolAllocator};
/// use new_zealand::nz;
///
/// let mut pool = PoolAllocator::builder().capacity(nz!(64)).build().unwrap();
/// let address = pool.alloc(16).unwrap();
///
/// let encoded = address.to_le_bytes();
/// assert_eq!(Address::from_le_bytes(encoded), address);
/// assert_eq!(address.offset(), 0);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address {
    /// Zero for the null address. Real pools count from 1.
    pool_id: u64,
    offset: usize,
}

impl Address {
    /// The null address.
    pub const NULL: Self = Self {
        pool_id: 0,
        offset: 0,
    };

    /// Number of bytes produced by [`to_le_bytes()`](Self::to_le_bytes).
    pub const ENCODED_LEN: usize = 16;

    #[must_use]
    pub(crate) const fn new(pool_id: u64, offset: usize) -> Self {
        Self { pool_id, offset }
    }

    /// Whether this is [`Address::NULL`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.pool_id == 0
    }

    /// Byte offset of the block from the start of the pool.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub(crate) const fn pool_id(&self) -> u64 {
        self.pool_id
    }

    /// Encodes the address as little-endian bytes: the pool ID followed by the offset, both
    /// as 64-bit integers.
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let offset =
            u64::try_from(self.offset).expect("usize always fits in u64 on supported targets");

        let mut encoded = [0_u8; Self::ENCODED_LEN];
        let (pool_id_bytes, offset_bytes) = encoded.split_at_mut(8);
        pool_id_bytes.copy_from_slice(&self.pool_id.to_le_bytes());
        offset_bytes.copy_from_slice(&offset.to_le_bytes());
        encoded
    }

    /// Decodes an address previously encoded by [`to_le_bytes()`](Self::to_le_bytes).
    ///
    /// Arbitrary bytes decode to some address; a pool rejects any address it did not hand out.
    #[must_use]
    pub fn from_le_bytes(encoded: [u8; Self::ENCODED_LEN]) -> Self {
        let (pool_id_bytes, offset_bytes) = encoded.split_at(8);

        let pool_id = u64::from_le_bytes(
            pool_id_bytes
                .try_into()
                .expect("split_at(8) of a 16-byte array yields 8 bytes"),
        );
        let offset = u64::from_le_bytes(
            offset_bytes
                .try_into()
                .expect("split_at(8) of a 16-byte array yields 8 bytes"),
        );

        if pool_id == 0 {
            return Self::NULL;
        }

        Self {
            pool_id,
            // An offset beyond usize cannot belong to any pool on this target.
            offset: usize::try_from(offset).unwrap_or(usize::MAX),
        }
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "pool#{}+{}", self.pool_id, self.offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::hash::Hash;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Address: Send, Sync, Copy, Debug, Hash, Ord);

    #[test]
    fn null_is_default_and_null() {
        assert!(Address::NULL.is_null());
        assert!(Address::default().is_null());
        assert!(!Address::new(1, 0).is_null());
    }

    #[test]
    fn encoding_survives_storage() {
        let address = Address::new(7, 1234);
        let encoded = address.to_le_bytes();

        assert_eq!(encoded.len(), Address::ENCODED_LEN);
        assert_eq!(encoded.first(), Some(&7));
        assert_eq!(Address::from_le_bytes(encoded), address);
        assert_eq!(Address::from_le_bytes(Address::NULL.to_le_bytes()), Address::NULL);
    }

    #[test]
    fn zero_pool_id_always_decodes_to_null() {
        let encoded = [0, 0, 0, 0, 0, 0, 0, 0, 42, 0, 0, 0, 0, 0, 0, 0];

        assert_eq!(Address::from_le_bytes(encoded), Address::NULL);
    }

    #[test]
    fn display_shows_pool_and_offset() {
        assert_eq!(Address::new(3, 40).to_string(), "pool#3+40");
        assert_eq!(Address::NULL.to_string(), "null");
    }
}
