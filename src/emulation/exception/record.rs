//! The landing-pad result record.
//!
//! # Layout
//!
//! ```text
//! offset 0             pointer width      pointer width + 4
//! +--------------------+------------------+
//! | unwind header      | selector (i32)   |
//! +--------------------+------------------+
//! ```
//!
//! Both fields use the target byte order from [`DataLayout`]. The record is
//! written once per firing dispatch and re-read by whatever implements `resume`.

use crate::{
    emulation::{
        config::DataLayout,
        exception::Selector,
        memory::{NativeAddress, NativeMemory},
    },
    Result,
};

/// The `(unwind header, selector)` pair a landing pad produces.
///
/// # Example
///
/// ```rust
/// use landingpad::emulation::{DataLayout, NativeAddress, UnmanagedMemory};
/// use landingpad::{LandingPadRecord, Selector};
///
/// let layout = DataLayout::host();
/// let mut memory = UnmanagedMemory::default();
///
/// let slot = LandingPadRecord::allocate(&mut memory, layout)?;
/// let record = LandingPadRecord::new(NativeAddress::new(0x9000), Selector::FILTER);
/// record.write(&mut memory, slot, layout)?;
///
/// assert_eq!(LandingPadRecord::read(&memory, slot, layout)?, record);
/// # Ok::<(), landingpad::Error>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LandingPadRecord {
    unwind_header: NativeAddress,
    selector: Selector,
}

impl LandingPadRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(unwind_header: NativeAddress, selector: Selector) -> Self {
        LandingPadRecord {
            unwind_header,
            selector,
        }
    }

    /// Unwind header of the exception that landed.
    #[must_use]
    pub fn unwind_header(&self) -> NativeAddress {
        self.unwind_header
    }

    /// Selector of the matching clause.
    #[must_use]
    pub fn selector(&self) -> Selector {
        self.selector
    }

    /// Size of the record in bytes.
    #[must_use]
    pub fn size(layout: DataLayout) -> usize {
        layout.pointer_size() + 4
    }

    /// Byte offset of the selector field.
    #[must_use]
    pub fn selector_offset(layout: DataLayout) -> u64 {
        layout.pointer_size() as u64
    }

    /// Allocates an uninitialized record-sized destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory refuses the allocation.
    pub fn allocate<M>(memory: &mut M, layout: DataLayout) -> Result<NativeAddress>
    where
        M: NativeMemory + ?Sized,
    {
        memory.alloc(Self::size(layout))
    }

    /// Writes the record to `destination` and returns `destination`.
    ///
    /// Both fields are encoded up front and stored with a single write, so a
    /// destination too small for the record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the header does not fit the layout's pointer width or
    /// the destination is not writable.
    pub fn write<M>(
        &self,
        memory: &mut M,
        destination: NativeAddress,
        layout: DataLayout,
    ) -> Result<NativeAddress>
    where
        M: NativeMemory + ?Sized,
    {
        let mut bytes = layout.encode_pointer(self.unwind_header)?;
        bytes.extend_from_slice(&layout.encode_i32(self.selector.value()));
        memory.write(destination, &bytes)?;
        Ok(destination)
    }

    /// Reads a record previously written at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not readable.
    pub fn read<M>(memory: &M, address: NativeAddress, layout: DataLayout) -> Result<Self>
    where
        M: NativeMemory + ?Sized,
    {
        let unwind_header = memory.read_pointer(address, layout)?;
        let selector = memory.read_i32(address.offset(Self::selector_offset(layout)), layout)?;
        Ok(LandingPadRecord::new(unwind_header, Selector::new(selector)))
    }
}
