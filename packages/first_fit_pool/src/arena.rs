use std::num::NonZero;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::{Address, AllocError, BlockDescriptor, BlockTable, Result};

/// Global counter for generating unique pool IDs. Zero is reserved for [`Address::NULL`].
static POOL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a unique pool ID.
fn generate_pool_id() -> u64 {
    POOL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// One initialized pool: the backing bytes plus the descriptors that partition them.
///
/// This is the lock-free core behind both [`PoolAllocator`][crate::PoolAllocator] and
/// [`SharedPoolAllocator`][crate::SharedPoolAllocator]. Every operation takes `&mut self`, so
/// resize can call `alloc()` and `free()` directly without any notion of locking.
#[derive(Debug)]
pub(crate) struct Arena {
    pool_id: u64,
    bytes: Box<[u8]>,
    blocks: BlockTable,
}

impl Arena {
    /// Reserves the backing region. Reservation failure is reported, not aborted on.
    pub(crate) fn reserve(capacity: NonZero<usize>) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity.get())
            .map_err(|source| AllocError::OutOfMemory {
                capacity: capacity.get(),
                source,
            })?;

        // Does not reallocate because the capacity is already reserved.
        bytes.resize(capacity.get(), 0_u8);

        Ok(Self {
            pool_id: generate_pool_id(),
            bytes: bytes.into_boxed_slice(),
            blocks: BlockTable::new(capacity),
        })
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub(crate) fn blocks(&self) -> &BlockTable {
        &self.blocks
    }

    fn address_at(&self, offset: usize) -> Address {
        Address::new(self.pool_id, offset)
    }

    /// Index of the block starting at `address`, whether free or not.
    fn locate(&self, address: Address) -> Result<usize> {
        if address.pool_id() != self.pool_id {
            return Err(AllocError::InvalidAddress { address });
        }

        self.blocks
            .index_of(address.offset())
            .ok_or(AllocError::InvalidAddress { address })
    }

    /// Index of the allocated block starting at `address`.
    fn locate_live(&self, address: Address) -> Result<usize> {
        let index = self.locate(address)?;

        if self.blocks.get(index).is_free() {
            return Err(AllocError::InvalidAddress { address });
        }

        Ok(index)
    }

    pub(crate) fn alloc(&mut self, size: usize) -> Result<Address> {
        if size == 0 {
            return Ok(Address::NULL);
        }

        let Some(index) = self.blocks.first_fit(size) else {
            warn!(
                pool_id = self.pool_id,
                size,
                largest_free = self.blocks.largest_free(),
                "no free block is large enough"
            );
            return Err(AllocError::NoSpace { requested: size });
        };

        self.blocks.claim(index, size);
        let address = self.address_at(self.blocks.get(index).offset());

        trace!(%address, size, "allocated");
        self.check_integrity();

        Ok(address)
    }

    pub(crate) fn free(&mut self, address: Address) -> Result<()> {
        if address.is_null() {
            return Ok(());
        }

        let index = self.locate(address).inspect_err(|_| {
            warn!(%address, "free of an address this pool does not track");
        })?;

        if self.blocks.get(index).is_free() {
            // Double free of a block we know about is tolerated. Unknown addresses are not.
            trace!(%address, "block already free");
            return Ok(());
        }

        _ = self.blocks.release(index);

        trace!(%address, "freed");
        self.check_integrity();

        Ok(())
    }

    pub(crate) fn resize(&mut self, address: Address, new_size: usize) -> Result<Address> {
        if address.is_null() {
            return self.alloc(new_size);
        }

        let index = self.locate_live(address).inspect_err(|_| {
            warn!(
                %address,
                new_size,
                "resize of an address that is not a live block of this pool"
            );
        })?;

        if new_size == 0 {
            _ = self.blocks.release(index);
            trace!(%address, "resized to zero, block freed");
            self.check_integrity();
            return Ok(Address::NULL);
        }

        let current = *self.blocks.get(index);

        if current.size() >= new_size {
            trace!(%address, new_size, size = current.size(), "block already large enough");
            return Ok(address);
        }

        if self
            .blocks
            .next(index)
            .is_some_and(|next| next.is_free() && combined_size(&current, next) >= new_size)
        {
            self.blocks.absorb_next(index);

            trace!(%address, new_size, "resized forward in place");
            self.check_integrity();
            return Ok(address);
        }

        if self.blocks.previous(index).is_some_and(|previous| {
            previous.is_free() && combined_size(previous, &current) >= new_size
        }) {
            let merged_index = self.blocks.absorb_into_previous(index);
            let new_offset = self.blocks.get(merged_index).offset();

            // The source and destination may overlap, copy_within handles that.
            self.bytes
                .copy_within(current.offset()..current.end(), new_offset);

            let new_address = self.address_at(new_offset);
            trace!(%address, %new_address, new_size, "resized backward");
            self.check_integrity();
            return Ok(new_address);
        }

        // If this fails nothing has been touched yet, so the original block stays valid.
        let new_address = self.alloc(new_size)?;

        let copy_len = current.size().min(new_size);
        let copy_end = current
            .offset()
            .checked_add(copy_len)
            .expect("copy length is bounded by the old block, which lies inside the pool");
        self.bytes
            .copy_within(current.offset()..copy_end, new_address.offset());

        // The old block may have shifted index when alloc() split another block, so it is
        // looked up again by address.
        self.free(address)
            .expect("the old block was live before relocation and alloc() never frees blocks");

        trace!(%address, %new_address, new_size, copy_len, "relocated");
        Ok(new_address)
    }

    pub(crate) fn payload(&self, address: Address) -> Result<&[u8]> {
        let index = self.locate_live(address)?;
        let block = self.blocks.get(index);

        Ok(self
            .bytes
            .get(block.offset()..block.end())
            .expect("blocks always lie inside the pool"))
    }

    pub(crate) fn payload_mut(&mut self, address: Address) -> Result<&mut [u8]> {
        let index = self.locate_live(address)?;
        let block = *self.blocks.get(index);

        Ok(self
            .bytes
            .get_mut(block.offset()..block.end())
            .expect("blocks always lie inside the pool"))
    }

    #[must_use]
    pub(crate) fn is_free(&self, address: Address) -> bool {
        self.locate(address)
            .is_ok_and(|index| self.blocks.get(index).is_free())
    }

    #[cfg_attr(test, mutants::skip)] // Only has an effect in debug builds, as a safety net.
    fn check_integrity(&self) {
        #[cfg(debug_assertions)]
        self.blocks.integrity_check(self.capacity());
    }
}

fn combined_size(first: &BlockDescriptor, second: &BlockDescriptor) -> usize {
    first
        .size()
        .checked_add(second.size())
        .expect("neighboring blocks lie inside the pool, whose size fits in usize")
}
