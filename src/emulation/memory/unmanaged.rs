//! Simulated native memory.
//!
//! This module provides [`UnmanagedMemory`], a byte-level stand-in for the native
//! address space of the interpreted program. Landing-pad records are allocated
//! and written here.
//!
//! # Address Space
//!
//! Each allocation gets a unique base address starting at
//! [`MemoryConfig::base_address`](crate::emulation::MemoryConfig::base_address).
//! Allocations are aligned to 16 bytes and never overlap. These addresses don't
//! correspond to real process memory.
//!
//! # Memory Limits
//!
//! The total size of live allocations is bounded by
//! [`MemoryConfig::max_unmanaged_bytes`](crate::emulation::MemoryConfig::max_unmanaged_bytes).
//! Exceeding this limit returns
//! [`EmulationError::HeapMemoryLimitExceeded`](crate::emulation::EmulationError::HeapMemoryLimitExceeded).

use std::collections::BTreeMap;

use crate::{
    emulation::{
        engine::EmulationError,
        memory::{NativeAddress, NativeMemory},
        MemoryConfig,
    },
    Result,
};

/// An allocated region of unmanaged memory (internal).
#[derive(Clone, Debug)]
struct InternalRegion {
    /// The raw bytes in this region.
    data: Vec<u8>,
}

impl InternalRegion {
    fn new(size: usize) -> Self {
        InternalRegion {
            data: vec![0; size],
        }
    }

    #[inline]
    fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the offset of `address` in this region if the whole range fits.
    fn range_offset(&self, base: u64, address: u64, len: usize) -> Option<usize> {
        let offset = usize::try_from(address.checked_sub(base)?).ok()?;
        let end = offset.checked_add(len)?;
        (end <= self.size()).then_some(offset)
    }
}

/// Simulated native memory for landing-pad records and other raw allocations.
///
/// # Example
///
/// ```rust
/// use landingpad::emulation::{DataLayout, NativeAddress, NativeMemory, UnmanagedMemory};
///
/// let mut mem = UnmanagedMemory::default();
/// let layout = DataLayout::host();
///
/// let ptr = mem.alloc(16)?;
/// mem.write_pointer(ptr, NativeAddress::new(0xCAFE), layout)?;
/// assert_eq!(mem.read_pointer(ptr, layout)?, NativeAddress::new(0xCAFE));
/// # Ok::<(), landingpad::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct UnmanagedMemory {
    /// Live regions indexed by their base address.
    regions: BTreeMap<u64, InternalRegion>,
    /// Next address to allocate.
    next_address: u64,
    /// Total bytes currently allocated.
    current_size: usize,
    /// Maximum allowed allocation.
    max_size: usize,
}

impl UnmanagedMemory {
    /// Creates an empty address space from a memory configuration.
    #[must_use]
    pub fn new(config: &MemoryConfig) -> Self {
        UnmanagedMemory {
            regions: BTreeMap::new(),
            next_address: config.base_address,
            current_size: 0,
            max_size: config.max_unmanaged_bytes,
        }
    }

    /// Frees a previously allocated region.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::InvalidPointer`] if `address` is not the base of a
    /// live allocation.
    pub fn free(&mut self, address: NativeAddress) -> Result<()> {
        match self.regions.remove(&address.value()) {
            Some(region) => {
                self.current_size = self.current_size.saturating_sub(region.size());
                Ok(())
            }
            None => Err(EmulationError::InvalidPointer {
                address: address.value(),
                reason: "not a valid allocation or already freed",
            }
            .into()),
        }
    }

    /// Finds the region containing `[address, address + len)`.
    fn locate(&self, address: u64, len: usize) -> Result<(u64, usize)> {
        let (&base, region) = self
            .regions
            .range(..=address)
            .next_back()
            .ok_or(EmulationError::InvalidPointer {
                address,
                reason: "address not in any allocated region",
            })?;

        let offset =
            region
                .range_offset(base, address, len)
                .ok_or(EmulationError::InvalidPointer {
                    address,
                    reason: "access would exceed region bounds",
                })?;
        Ok((base, offset))
    }

    /// Returns `true` if the address is inside a live region.
    #[must_use]
    pub fn is_valid(&self, address: NativeAddress) -> bool {
        self.locate(address.value(), 1).is_ok()
    }

    /// Returns the current total allocation size in bytes.
    #[must_use]
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Returns the maximum allowed allocation size in bytes.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the number of live regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl NativeMemory for UnmanagedMemory {
    fn alloc(&mut self, size: usize) -> Result<NativeAddress> {
        if self.current_size.saturating_add(size) > self.max_size {
            return Err(EmulationError::HeapMemoryLimitExceeded {
                current: self.current_size,
                limit: self.max_size,
            }
            .into());
        }

        let address = self.next_address;
        // Zero-sized allocations still get a distinct address
        let span = size.max(1) as u64;
        let next = address
            .checked_add(span)
            .and_then(|end| end.checked_add(15))
            .ok_or(EmulationError::InvalidPointer {
                address,
                reason: "allocation would exceed the address space",
            })?;
        self.next_address = next & !15;

        self.regions.insert(address, InternalRegion::new(size));
        self.current_size += size;

        Ok(NativeAddress::new(address))
    }

    fn read(&self, address: NativeAddress, size: usize) -> Result<Vec<u8>> {
        let (base, offset) = self.locate(address.value(), size)?;
        let region = &self.regions[&base];
        Ok(region.data[offset..offset + size].to_vec())
    }

    fn write(&mut self, address: NativeAddress, data: &[u8]) -> Result<()> {
        let (base, offset) = self.locate(address.value(), data.len())?;
        let region = self
            .regions
            .get_mut(&base)
            .ok_or(EmulationError::InvalidPointer {
                address: address.value(),
                reason: "address not in any allocated region",
            })?;
        region.data[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl Default for UnmanagedMemory {
    fn default() -> Self {
        Self::new(&MemoryConfig::default())
    }
}
