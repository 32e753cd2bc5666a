//! # landingpad Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the landingpad library. Import this module to get quick access to everything needed
//! to build a landing pad and dispatch an exception through it.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all landingpad operations
pub use crate::Error;

/// The result type used throughout landingpad
pub use crate::Result;

/// Fatal interpreter faults
pub use crate::emulation::EmulationError;

// ================================================================================================
// Landing Pads
// ================================================================================================

/// Clause model, dispatcher and result record
pub use crate::emulation::exception::{
    Clause, ClauseKind, LandingPad, LandingPadBuilder, LandingPadOutcome, LandingPadRecord,
    Operand, Selector, UserException,
};

// ================================================================================================
// Interpreter State and Collaborators
// ================================================================================================

/// Frames and the runtime context
pub use crate::emulation::{Frame, RuntimeContext, SlotValue};

/// Type matching and address resolution
pub use crate::emulation::{AddressResolver, SymbolResolver, TypeInfoRegistry, TypeMatcher};

/// Native memory
pub use crate::emulation::{NativeAddress, NativeMemory, StackPointer, UnmanagedMemory};

// ================================================================================================
// Configuration and Tracing
// ================================================================================================

/// Configuration types
pub use crate::emulation::{
    DataLayout, EmulationConfig, Endian, MemoryConfig, PointerWidth, TraceCategories,
    TracingConfig,
};

/// Trace output
pub use crate::emulation::{TraceEvent, TraceWriter};
