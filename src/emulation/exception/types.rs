//! Value types shared by clauses, the dispatcher and the record writer.

use std::{fmt, sync::Arc};

use strum::IntoStaticStr;

use crate::emulation::memory::NativeAddress;

/// An in-flight exception as seen by a landing pad.
///
/// Owned by the unwinder. The landing pad only reads the unwind header and, when
/// no clause handles the exception, hands back the very same `Arc` so identity is
/// preserved across frames.
#[derive(Debug, PartialEq, Eq)]
pub struct UserException {
    unwind_header: NativeAddress,
}

impl UserException {
    /// Creates an exception from its native unwind header.
    #[must_use]
    pub fn new(unwind_header: NativeAddress) -> Self {
        UserException { unwind_header }
    }

    /// The ABI unwind header identifying the thrown object.
    #[must_use]
    pub fn unwind_header(&self) -> NativeAddress {
        self.unwind_header
    }
}

/// The integer a landing pad computes to identify the matching clause.
///
/// | Value | Meaning |
/// |-------|---------|
/// | `0` | No match |
/// | `1` | Catch-all (`catch (...)`) |
/// | `-1` | A filter clause fired |
/// | other | A typed catch; the catch type's address truncated to 32 bits |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selector(i32);

impl Selector {
    /// The clause did not match.
    pub const NONE: Selector = Selector(0);
    /// A catch clause with a null type info matched.
    pub const CATCH_ALL: Selector = Selector(1);
    /// A filter clause fired.
    pub const FILTER: Selector = Selector(-1);

    /// Creates a selector from a raw value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Selector(value)
    }

    /// Encodes a matched catch type as a selector.
    ///
    /// The address is truncated to the 32-bit record slot. The result is an
    /// opaque identifier and may coincide with the reserved values: a type whose
    /// low 32 bits are zero yields [`Selector::NONE`], so the clause counts as not
    /// matching and evaluation moves on to the next clause. Low words of `1` and
    /// `0xFFFF_FFFF` read back as [`Selector::CATCH_ALL`] and [`Selector::FILTER`].
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub const fn from_catch_address(address: NativeAddress) -> Self {
        Selector(address.value() as i32)
    }

    /// The raw value as stored in the landing-pad record.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns `true` for any selector other than [`Selector::NONE`].
    #[must_use]
    pub const fn is_match(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Selector> for i32 {
    fn from(selector: Selector) -> Self {
        selector.0
    }
}

/// The two clause shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ClauseKind {
    /// Fires when the exception is caught by the clause's type.
    Catch,
    /// Fires when the exception matches none of the clause's types.
    Filter,
}

/// An interpreter-level value that resolves to a native address.
///
/// Resolved through the [`AddressResolver`](crate::emulation::AddressResolver) on
/// every evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// The null address.
    Null,
    /// A constant address.
    Address(u64),
    /// A global symbol, typically a type info such as `_ZTIi`.
    Symbol(Arc<str>),
    /// A frame slot holding a pointer.
    Local(usize),
}

impl Operand {
    /// Shorthand for [`Operand::Symbol`].
    #[must_use]
    pub fn symbol(name: &str) -> Self {
        Operand::Symbol(Arc::from(name))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Null => write!(f, "null"),
            Operand::Address(address) => write!(f, "0x{address:X}"),
            Operand::Symbol(name) => write!(f, "@{name}"),
            Operand::Local(slot) => write!(f, "%{slot}"),
        }
    }
}
