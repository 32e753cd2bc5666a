//! Landing-pad clause matching and result construction.
//!
//! # Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LandingPad`] | Ordered clauses plus cleanup flag; evaluated by [`LandingPad::dispatch`] |
//! | [`Clause`] | A catch or filter clause producing a [`Selector`] |
//! | [`LandingPadRecord`] | The `(unwind header, selector)` record written on a match |
//! | [`LandingPadOutcome`] | Either the record address or the exception to keep unwinding |
//! | [`UserException`] | The in-flight exception as read from the frame |
//!
//! # Selectors
//!
//! A clause yields `0` when it does not match. Evaluation stops at the first
//! non-zero selector, so a pad's result identifies exactly one clause. The
//! catch-all uses `1`, filters use `-1` and typed catches use the catch type's
//! address.

mod builder;
mod clause;
mod handler;
mod record;
mod types;

pub use builder::LandingPadBuilder;
pub use clause::Clause;
pub use handler::{LandingPad, LandingPadOutcome};
pub use record::LandingPadRecord;
pub use types::{ClauseKind, Operand, Selector, UserException};
