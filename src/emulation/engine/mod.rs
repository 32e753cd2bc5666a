//! Interpreter-side plumbing consumed by the landing pad.
//!
//! - [`Frame`] / [`SlotValue`] - the frame slots the pad reads the in-flight
//!   exception and the native stack handle from
//! - [`RuntimeContext`] - the injected collaborators (type matcher, address
//!   resolver), the target data layout and the trace writer
//! - [`EmulationError`] - fatal interpreter faults
//! - [`TraceEvent`] / [`TraceWriter`] - structured execution tracing

mod context;
mod error;
mod frame;
mod trace;

pub use context::RuntimeContext;
pub use error::EmulationError;
pub use frame::{Frame, SlotValue};
pub use trace::{TraceEvent, TraceWriter};
