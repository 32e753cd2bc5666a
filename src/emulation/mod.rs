//! Landing-pad evaluation inside a native-code interpreter.
//!
//! This module groups everything a landing pad needs at the moment an exception
//! unwinds into it: the interpreter frame it reads the exception and stack handle
//! from, the runtime context holding the injected collaborators, the simulated
//! native memory the result record is written into, and the clause model itself.
//!
//! # Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`LandingPad`](exception::LandingPad) | Ordered clauses plus cleanup flag; the dispatcher |
//! | [`Clause`](exception::Clause) | Catch or filter clause; evaluates to a [`Selector`](exception::Selector) |
//! | [`LandingPadRecord`](exception::LandingPadRecord) | The `(unwind header, selector)` record |
//! | [`Frame`] | Interpreter frame slots holding the exception and stack handle |
//! | [`RuntimeContext`] | Type matcher, address resolver, layout and tracing |
//! | [`UnmanagedMemory`] | Simulated native address space |
//! | [`TypeInfoRegistry`] | Concrete type-match oracle over registered type infos |
//!
//! # Flow
//!
//! 1. The dispatcher pulls the in-flight [`UserException`](exception::UserException) and
//!    the [`StackPointer`] out of the frame
//! 2. Clauses are evaluated strictly left to right; the first non-zero selector wins
//! 3. A match (or a cleanup pad) resolves the destination and writes the record
//! 4. Otherwise the very same exception is handed back for further unwinding
//!
//! Any structural inconsistency along the way is an [`EmulationError`] and aborts
//! the evaluation instead of being treated as "no clause matched".

mod config;
pub mod engine;
pub mod exception;
pub mod memory;
pub mod runtime;

pub use config::{
    DataLayout, EmulationConfig, Endian, MemoryConfig, PointerWidth, TraceCategories,
    TracingConfig,
};
pub use engine::{EmulationError, Frame, RuntimeContext, SlotValue, TraceEvent, TraceWriter};
pub use memory::{NativeAddress, NativeMemory, StackPointer, UnmanagedMemory};
pub use runtime::{AddressResolver, SymbolResolver, TypeInfoRegistry, TypeMatcher};
