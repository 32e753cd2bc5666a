//! Fatal interpreter faults.
//!
//! Everything in here means the interpreter state around a landing pad is
//! structurally inconsistent. These faults are never offered to the pad's own
//! clauses; they abort the evaluation and propagate as [`crate::Error::Emulation`].

use std::fmt;

/// Errors that can occur while evaluating a landing pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulationError {
    /// The exception slot holds no exception.
    MissingException {
        /// The frame slot that was read.
        slot: usize,
    },
    /// A frame slot holds a value of the wrong kind.
    SlotTypeMismatch {
        /// The frame slot that was read.
        slot: usize,
        /// Expected slot kind.
        expected: &'static str,
        /// Actual slot kind found.
        found: &'static str,
    },
    /// Frame slot index out of bounds.
    SlotOutOfBounds {
        /// The requested slot.
        slot: usize,
        /// Number of slots in the frame.
        count: usize,
    },
    /// A symbol used as a type descriptor or destination has no address.
    UnresolvedSymbol {
        /// The symbol name.
        name: String,
    },
    /// The type matcher does not know the thrown exception.
    UnknownUnwindHeader {
        /// Address of the unwind header.
        header: u64,
    },
    /// Invalid pointer access (native memory).
    InvalidPointer {
        /// The invalid address.
        address: u64,
        /// Reason for invalidity.
        reason: &'static str,
    },
    /// An address does not fit the target pointer width.
    AddressOutOfRange {
        /// The address.
        address: u64,
        /// Target pointer width in bits.
        pointer_bits: u32,
    },
    /// Native memory limit exceeded.
    HeapMemoryLimitExceeded {
        /// Current allocation size.
        current: usize,
        /// Maximum allowed size.
        limit: usize,
    },
    /// Internal emulation error (bug in the interpreter).
    InternalError {
        /// Description of the error.
        description: String,
    },
}

impl fmt::Display for EmulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulationError::MissingException { slot } => {
                write!(f, "no in-flight exception in slot {slot}")
            }
            EmulationError::SlotTypeMismatch {
                slot,
                expected,
                found,
            } => {
                write!(f, "slot {slot} type mismatch: expected {expected}, found {found}")
            }
            EmulationError::SlotOutOfBounds { slot, count } => {
                write!(f, "slot {slot} out of bounds (count: {count})")
            }
            EmulationError::UnresolvedSymbol { name } => {
                write!(f, "unresolved symbol: {name}")
            }
            EmulationError::UnknownUnwindHeader { header } => {
                write!(f, "unknown unwind header 0x{header:016X}")
            }
            EmulationError::InvalidPointer { address, reason } => {
                write!(f, "invalid pointer 0x{address:016X}: {reason}")
            }
            EmulationError::AddressOutOfRange {
                address,
                pointer_bits,
            } => {
                write!(
                    f,
                    "address 0x{address:016X} does not fit a {pointer_bits}-bit pointer"
                )
            }
            EmulationError::HeapMemoryLimitExceeded { current, limit } => {
                write!(
                    f,
                    "native memory limit exceeded: {current} bytes (limit: {limit})"
                )
            }
            EmulationError::InternalError { description } => {
                write!(f, "internal emulation error: {description}")
            }
        }
    }
}

impl std::error::Error for EmulationError {}

impl EmulationError {
    /// Returns `true` if the fault stems from reading the interpreter frame.
    #[must_use]
    pub fn is_frame_fault(&self) -> bool {
        matches!(
            self,
            EmulationError::MissingException { .. }
                | EmulationError::SlotTypeMismatch { .. }
                | EmulationError::SlotOutOfBounds { .. }
        )
    }

    /// Returns a description suitable for tracing/logging.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{self}")
    }
}
