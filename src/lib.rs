// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! # landingpad
//!
//! Landing-pad evaluation for interpreters of compiled native bitcode.
//!
//! When an `invoke` unwinds with an in-flight exception, control transfers to the
//! function's landing pad. The pad walks its clauses in declaration order, asks a
//! native "can this type catch that exception" oracle about each candidate type,
//! computes a selector and either materializes the two-field landing-pad record in
//! interpreter memory or hands the exception back to the caller to keep unwinding.
//!
//! # Architecture
//!
//! - [`emulation::exception`] - clauses, selectors, the [`LandingPad`] dispatcher and
//!   the [`LandingPadRecord`] writer
//! - [`emulation::engine`] - interpreter frames, the runtime context holding the
//!   injected collaborators, fatal interpreter faults and execution tracing
//! - [`emulation::memory`] - native addresses and a simulated native address space
//! - [`emulation::runtime`] - the type-match oracle and value-to-address resolution
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use landingpad::prelude::*;
//!
//! let registry = Arc::new(TypeInfoRegistry::new());
//! let int_type = NativeAddress::new(0x1000);
//! let header = NativeAddress::new(0x9000);
//! registry.register_type(int_type, &[]);
//! registry.register_exception(header, int_type);
//!
//! let resolver = Arc::new(SymbolResolver::new());
//! resolver.define("_ZTIi", int_type);
//!
//! let ctx = RuntimeContext::new(EmulationConfig::default(), registry, resolver)?;
//! let mut memory = UnmanagedMemory::default();
//!
//! let mut frame = Frame::new(3);
//! frame.set(0, SlotValue::Exception(Arc::new(UserException::new(header))))?;
//! frame.set(1, SlotValue::Stack(StackPointer::new(NativeAddress::new(0x7000))))?;
//! let slot = LandingPadRecord::allocate(&mut memory, ctx.layout())?;
//! frame.set(2, SlotValue::Pointer(slot))?;
//!
//! let pad = LandingPad::builder()
//!     .exception_slot(0)
//!     .stack_slot(1)
//!     .destination(Operand::Local(2))
//!     .clause(Clause::catch(Operand::symbol("_ZTIi")))
//!     .build()?;
//!
//! match pad.dispatch(&frame, &ctx, &mut memory)? {
//!     LandingPadOutcome::Landed { record, selector } => {
//!         let written = LandingPadRecord::read(&memory, record, ctx.layout())?;
//!         assert_eq!(written.selector(), selector);
//!     }
//!     LandingPadOutcome::Resume(_) => unreachable!(),
//! }
//! # Ok::<(), landingpad::Error>(())
//! ```

#![doc(html_no_source)]
#![deny(missing_docs)]

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust
/// use landingpad::prelude::*;
///
/// let selector = Selector::CATCH_ALL;
/// assert!(selector.is_match());
/// ```
pub mod prelude;

/// Interpreter-facing landing-pad machinery.
///
/// Contains the exception clause model and dispatcher, the frame and runtime context
/// abstractions the dispatcher reads from, the simulated native memory it writes
/// into, and the collaborators it consults for type matching and address resolution.
pub mod emulation;

pub use emulation::exception::{
    Clause, ClauseKind, LandingPad, LandingPadBuilder, LandingPadOutcome, LandingPadRecord,
    Operand, Selector, UserException,
};
pub use error::Error;

/// The generic result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
