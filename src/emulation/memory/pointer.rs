//! Native addresses and stack handles.

use std::fmt;

/// An address in the interpreted program's native address space.
///
/// Address `0` is the null sentinel. For type descriptors it means "any type",
/// which is how a `catch (...)` clause is encoded.
///
/// # Example
///
/// ```rust
/// use landingpad::emulation::NativeAddress;
///
/// let base = NativeAddress::new(0x7FFF_0000_0000);
/// assert_eq!(base.offset(8).value(), 0x7FFF_0000_0008);
/// assert!(NativeAddress::NULL.is_null());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeAddress(u64);

impl NativeAddress {
    /// The null address.
    pub const NULL: NativeAddress = NativeAddress(0);

    /// Creates an address from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        NativeAddress(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns `true` for the null sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the address `bytes` past this one, wrapping on overflow.
    #[must_use]
    pub const fn offset(self, bytes: u64) -> Self {
        NativeAddress(self.0.wrapping_add(bytes))
    }
}

impl fmt::Debug for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeAddress(0x{:X})", self.0)
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for NativeAddress {
    fn from(value: u64) -> Self {
        NativeAddress(value)
    }
}

/// Opaque handle to the native call stack of the unwinding thread.
///
/// The landing pad never interprets it; it is passed through unchanged to the
/// [`TypeMatcher`](crate::emulation::TypeMatcher).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StackPointer(NativeAddress);

impl StackPointer {
    /// Wraps the current stack address.
    #[must_use]
    pub const fn new(address: NativeAddress) -> Self {
        StackPointer(address)
    }

    /// Returns the underlying stack address.
    #[must_use]
    pub const fn address(self) -> NativeAddress {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_wraps() {
        let top = NativeAddress::new(u64::MAX);
        assert_eq!(top.offset(1), NativeAddress::NULL);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", NativeAddress::new(0xABCD)),
            "0x000000000000ABCD"
        );
        assert_eq!(format!("{:?}", NativeAddress::new(0xABCD)), "NativeAddress(0xABCD)");
    }
}
