//! Emulation configuration types.
//!
//! This module provides the configuration consumed by the
//! [`RuntimeContext`](crate::emulation::RuntimeContext):
//!
//! - [`EmulationConfig`] - Top-level configuration container
//! - [`DataLayout`] - Pointer width and byte order of the interpreted target
//! - [`MemoryConfig`] - Simulated native memory settings
//! - [`TracingConfig`] - Which landing-pad events are traced, and where to
//!
//! # Configuration Presets
//!
//! - [`EmulationConfig::minimal()`] - Host layout, small memory budget, no tracing
//! - [`EmulationConfig::traced()`] - Default settings with every trace category enabled
//!
//! # Example
//!
//! ```rust
//! use landingpad::emulation::{DataLayout, EmulationConfig, Endian, PointerWidth};
//!
//! let config = EmulationConfig::default()
//!     .with_layout(DataLayout::new(PointerWidth::Bits32, Endian::Big));
//! assert_eq!(config.layout.pointer_size(), 4);
//! ```

use std::path::PathBuf;

use bitflags::bitflags;

use crate::{
    emulation::{engine::EmulationError, memory::NativeAddress},
    Result,
};

/// Width of a native pointer on the interpreted target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    /// 4-byte pointers.
    Bits32,
    /// 8-byte pointers.
    Bits64,
}

impl PointerWidth {
    /// Returns the pointer width of the host.
    #[must_use]
    pub fn host() -> Self {
        if cfg!(target_pointer_width = "32") {
            PointerWidth::Bits32
        } else {
            PointerWidth::Bits64
        }
    }

    /// Size of a pointer in bytes.
    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }

    /// Size of a pointer in bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            PointerWidth::Bits32 => 32,
            PointerWidth::Bits64 => 64,
        }
    }
}

/// Byte order of the interpreted target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl Endian {
    /// Returns the byte order of the host.
    #[must_use]
    pub fn host() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// Pointer width and byte order used when reading and writing native memory.
///
/// The landing-pad record is laid out against this: the unwind header occupies
/// `pointer_size()` bytes at offset 0, the 32-bit selector follows immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataLayout {
    /// Width of native pointers.
    pub pointer_width: PointerWidth,
    /// Byte order of multi-byte values.
    pub endian: Endian,
}

impl DataLayout {
    /// Creates a layout from an explicit pointer width and byte order.
    #[must_use]
    pub fn new(pointer_width: PointerWidth, endian: Endian) -> Self {
        DataLayout {
            pointer_width,
            endian,
        }
    }

    /// The layout of the machine this crate is running on.
    #[must_use]
    pub fn host() -> Self {
        Self::new(PointerWidth::host(), Endian::host())
    }

    /// Size of a native pointer in bytes.
    #[must_use]
    pub fn pointer_size(&self) -> usize {
        self.pointer_width.bytes()
    }

    /// Encodes an address as a pointer-sized value in target byte order.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::AddressOutOfRange`] if the address does not fit the
    /// target pointer width.
    pub fn encode_pointer(&self, address: NativeAddress) -> Result<Vec<u8>> {
        let value = address.value();
        match self.pointer_width {
            PointerWidth::Bits64 => Ok(match self.endian {
                Endian::Little => value.to_le_bytes().to_vec(),
                Endian::Big => value.to_be_bytes().to_vec(),
            }),
            PointerWidth::Bits32 => {
                let narrow =
                    u32::try_from(value).map_err(|_| EmulationError::AddressOutOfRange {
                        address: value,
                        pointer_bits: self.pointer_width.bits(),
                    })?;
                Ok(match self.endian {
                    Endian::Little => narrow.to_le_bytes().to_vec(),
                    Endian::Big => narrow.to_be_bytes().to_vec(),
                })
            }
        }
    }

    /// Decodes a pointer-sized value in target byte order.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::InternalError`] if `bytes` is not exactly one pointer wide.
    pub fn decode_pointer(&self, bytes: &[u8]) -> Result<NativeAddress> {
        let value = match self.pointer_width {
            PointerWidth::Bits64 => {
                let raw: [u8; 8] = bytes.try_into().map_err(|_| width_mismatch(8, bytes))?;
                match self.endian {
                    Endian::Little => u64::from_le_bytes(raw),
                    Endian::Big => u64::from_be_bytes(raw),
                }
            }
            PointerWidth::Bits32 => {
                let raw: [u8; 4] = bytes.try_into().map_err(|_| width_mismatch(4, bytes))?;
                u64::from(match self.endian {
                    Endian::Little => u32::from_le_bytes(raw),
                    Endian::Big => u32::from_be_bytes(raw),
                })
            }
        };
        Ok(NativeAddress::new(value))
    }

    /// Encodes a 32-bit signed value in target byte order.
    #[must_use]
    pub fn encode_i32(&self, value: i32) -> [u8; 4] {
        match self.endian {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        }
    }

    /// Decodes a 32-bit signed value in target byte order.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::InternalError`] if `bytes` is not exactly four bytes long.
    pub fn decode_i32(&self, bytes: &[u8]) -> Result<i32> {
        let raw: [u8; 4] = bytes.try_into().map_err(|_| width_mismatch(4, bytes))?;
        Ok(match self.endian {
            Endian::Little => i32::from_le_bytes(raw),
            Endian::Big => i32::from_be_bytes(raw),
        })
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::host()
    }
}

fn width_mismatch(expected: usize, bytes: &[u8]) -> EmulationError {
    EmulationError::InternalError {
        description: format!("expected {expected} bytes, got {}", bytes.len()),
    }
}

/// Simulated native memory settings.
///
/// # Default Values
///
/// | Setting | Default Value |
/// |---------|---------------|
/// | `max_unmanaged_bytes` | 16 MB |
/// | `base_address` | `0x7FFF_0000_1000` (64-bit), `0x7FFF_1000` (32-bit) |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Maximum total size of live allocations in bytes.
    pub max_unmanaged_bytes: usize,

    /// Address of the first allocation.
    ///
    /// Kept high so that simulated pointers are easy to tell apart from small
    /// integers and type-info addresses in traces. The low 32 bits of the
    /// defaults are non-zero, so a type info placed in the first allocation still
    /// yields a usable catch selector.
    pub base_address: u64,
}

impl MemoryConfig {
    /// Memory settings suitable for the given pointer width.
    #[must_use]
    pub fn for_width(width: PointerWidth) -> Self {
        MemoryConfig {
            max_unmanaged_bytes: 16 * 1024 * 1024,
            base_address: match width {
                PointerWidth::Bits32 => 0x7FFF_1000,
                PointerWidth::Bits64 => 0x7FFF_0000_1000,
            },
        }
    }

    /// Sets the allocation budget.
    #[must_use]
    pub fn with_max_unmanaged_bytes(mut self, bytes: usize) -> Self {
        self.max_unmanaged_bytes = bytes;
        self
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::for_width(PointerWidth::host())
    }
}

bitflags! {
    /// Categories of landing-pad trace events.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TraceCategories: u32 {
        /// Pad entry, firing and exception propagation.
        const DISPATCH = 0x0001;
        /// One event per evaluated clause with its selector.
        const CLAUSES  = 0x0002;
    }
}

/// Logging and tracing configuration.
///
/// Tracing is off when `categories` is empty. With an `output_path`, events are
/// appended to that file as NDJSON; otherwise they are buffered in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracingConfig {
    /// Which event categories are recorded.
    pub categories: TraceCategories,

    /// Maximum trace entries to keep in memory.
    ///
    /// Set to 0 for unlimited. Ignored when `output_path` is set.
    pub max_trace_entries: usize,

    /// Output file path for trace events.
    ///
    /// Format: One JSON object per line (JSONL/NDJSON format).
    pub output_path: Option<PathBuf>,

    /// Context prefix included as a "context" field in each trace event.
    pub context_prefix: Option<String>,
}

impl TracingConfig {
    /// Tracing disabled.
    #[must_use]
    pub fn disabled() -> Self {
        TracingConfig {
            categories: TraceCategories::empty(),
            max_trace_entries: 0,
            output_path: None,
            context_prefix: None,
        }
    }

    /// Every category, buffered in memory.
    #[must_use]
    pub fn full_memory(max_trace_entries: usize) -> Self {
        TracingConfig {
            categories: TraceCategories::all(),
            max_trace_entries,
            output_path: None,
            context_prefix: None,
        }
    }

    /// Every category, appended to a file.
    #[must_use]
    pub fn full_trace(path: impl Into<PathBuf>) -> Self {
        TracingConfig {
            categories: TraceCategories::all(),
            max_trace_entries: 0,
            output_path: Some(path.into()),
            context_prefix: None,
        }
    }

    /// Sets the context prefix.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_prefix = Some(context.into());
        self
    }

    /// Returns `true` if any category is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.categories.is_empty()
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Top-level configuration for landing-pad evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmulationConfig {
    /// Pointer width and byte order of the interpreted target.
    pub layout: DataLayout,

    /// Simulated native memory settings.
    pub memory: MemoryConfig,

    /// Logging and tracing configuration.
    pub tracing: TracingConfig,
}

impl EmulationConfig {
    /// Host layout, a 1 MB memory budget and no tracing.
    #[must_use]
    pub fn minimal() -> Self {
        EmulationConfig {
            layout: DataLayout::host(),
            memory: MemoryConfig::default().with_max_unmanaged_bytes(1024 * 1024),
            tracing: TracingConfig::disabled(),
        }
    }

    /// Default settings with every trace category buffered in memory.
    #[must_use]
    pub fn traced() -> Self {
        EmulationConfig {
            tracing: TracingConfig::full_memory(10_000),
            ..Self::default()
        }
    }

    /// Sets the data layout and matches the memory base address to its pointer width.
    #[must_use]
    pub fn with_layout(mut self, layout: DataLayout) -> Self {
        self.layout = layout;
        self.memory.base_address = MemoryConfig::for_width(layout.pointer_width).base_address;
        self
    }

    /// Sets the memory configuration.
    #[must_use]
    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Sets the tracing configuration.
    #[must_use]
    pub fn with_tracing(mut self, tracing: TracingConfig) -> Self {
        self.tracing = tracing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_roundtrip_all_layouts() {
        let address = NativeAddress::new(0x1234_5678);
        for width in [PointerWidth::Bits32, PointerWidth::Bits64] {
            for endian in [Endian::Little, Endian::Big] {
                let layout = DataLayout::new(width, endian);
                let bytes = layout.encode_pointer(address).unwrap();
                assert_eq!(bytes.len(), width.bytes());
                assert_eq!(layout.decode_pointer(&bytes).unwrap(), address);
            }
        }
    }

    #[test]
    fn test_big_endian_byte_order() {
        let layout = DataLayout::new(PointerWidth::Bits32, Endian::Big);
        assert_eq!(
            layout.encode_pointer(NativeAddress::new(0x0102_0304)).unwrap(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(layout.encode_i32(-1), [0xFF; 4]);
        assert_eq!(layout.encode_i32(0x0A0B_0C0D), [0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn test_wide_address_rejected_on_32_bit() {
        let layout = DataLayout::new(PointerWidth::Bits32, Endian::Little);
        let err = layout
            .encode_pointer(NativeAddress::new(0x1_0000_0000))
            .unwrap_err();
        assert!(matches!(
            err.as_emulation(),
            Some(EmulationError::AddressOutOfRange {
                pointer_bits: 32,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_wrong_width() {
        let layout = DataLayout::new(PointerWidth::Bits64, Endian::Little);
        assert!(layout.decode_pointer(&[0; 4]).is_err());
        assert!(layout.decode_i32(&[0; 8]).is_err());
    }

    #[test]
    fn test_presets() {
        assert!(!EmulationConfig::minimal().tracing.is_enabled());
        assert!(EmulationConfig::traced().tracing.is_enabled());

        let config = EmulationConfig::default()
            .with_layout(DataLayout::new(PointerWidth::Bits32, Endian::Little));
        assert_eq!(config.memory.base_address, 0x7FFF_1000);
    }

    #[test]
    fn test_default_bases_have_low_word() {
        for width in [PointerWidth::Bits32, PointerWidth::Bits64] {
            let base = MemoryConfig::for_width(width).base_address;
            assert_ne!(base & 0xFFFF_FFFF, 0);
            assert_eq!(base % 16, 0);
        }
    }
}
