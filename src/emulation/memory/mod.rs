//! Native memory model for landing-pad evaluation.
//!
//! # Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NativeAddress`] | A raw address in the interpreted program's native address space |
//! | [`StackPointer`] | Opaque handle to the native call stack of the unwinding thread |
//! | [`NativeMemory`] | Byte-level access plus pointer/`i32` helpers honoring a [`DataLayout`] |
//! | [`UnmanagedMemory`] | A simulated native address space implementing [`NativeMemory`] |
//!
//! The landing pad only ever writes through [`NativeMemory`], so interpreters with
//! their own memory subsystem implement the trait instead of using
//! [`UnmanagedMemory`].

mod pointer;
mod unmanaged;

pub use pointer::{NativeAddress, StackPointer};
pub use unmanaged::UnmanagedMemory;

use crate::{emulation::DataLayout, Result};

/// Raw pointer-addressed access to native memory.
///
/// Implementors provide allocation and byte-granular reads and writes. The
/// typed helpers encode values against a [`DataLayout`] and are what the
/// landing-pad record writer uses.
pub trait NativeMemory {
    /// Allocates a zeroed region of `size` bytes, aligned to 16 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the allocation budget is exhausted.
    fn alloc(&mut self, size: usize) -> Result<NativeAddress>;

    /// Reads `size` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is not fully inside one live allocation.
    fn read(&self, address: NativeAddress, size: usize) -> Result<Vec<u8>>;

    /// Writes `data` starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is not fully inside one live allocation.
    fn write(&mut self, address: NativeAddress, data: &[u8]) -> Result<()>;

    /// Writes a pointer-sized value.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not fit the layout's pointer width or the
    /// write is out of bounds.
    fn write_pointer(
        &mut self,
        address: NativeAddress,
        value: NativeAddress,
        layout: DataLayout,
    ) -> Result<()> {
        let bytes = layout.encode_pointer(value)?;
        self.write(address, &bytes)
    }

    /// Writes a 32-bit signed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is out of bounds.
    fn write_i32(&mut self, address: NativeAddress, value: i32, layout: DataLayout) -> Result<()> {
        self.write(address, &layout.encode_i32(value))
    }

    /// Reads a pointer-sized value.
    ///
    /// # Errors
    ///
    /// Returns an error if the read is out of bounds.
    fn read_pointer(&self, address: NativeAddress, layout: DataLayout) -> Result<NativeAddress> {
        let bytes = self.read(address, layout.pointer_size())?;
        layout.decode_pointer(&bytes)
    }

    /// Reads a 32-bit signed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the read is out of bounds.
    fn read_i32(&self, address: NativeAddress, layout: DataLayout) -> Result<i32> {
        let bytes = self.read(address, 4)?;
        layout.decode_i32(&bytes)
    }
}
