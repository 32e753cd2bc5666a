//! Interpreter frame slots.
//!
//! A [`Frame`] is the per-invocation slot array of an interpreted function. The
//! unwinder stores the in-flight exception into a dedicated slot before jumping
//! to the landing pad, and the native stack handle lives in another. Reading a
//! slot that is empty or holds the wrong kind of value is a fatal fault.

use std::sync::Arc;

use strum::IntoStaticStr;

use crate::{
    emulation::{
        engine::EmulationError,
        exception::UserException,
        memory::{NativeAddress, StackPointer},
    },
    Result,
};

/// A value stored in a frame slot.
#[derive(Clone, Debug, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SlotValue {
    /// An in-flight exception.
    Exception(Arc<UserException>),
    /// The native stack handle.
    Stack(StackPointer),
    /// A native pointer.
    Pointer(NativeAddress),
    /// A 32-bit integer.
    I32(i32),
    /// A 64-bit integer.
    I64(i64),
}

impl SlotValue {
    /// Returns the slot kind name used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// The slot array of one interpreted function invocation.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use landingpad::emulation::{Frame, NativeAddress, SlotValue};
/// use landingpad::UserException;
///
/// let mut frame = Frame::new(2);
/// let exception = Arc::new(UserException::new(NativeAddress::new(0x9000)));
/// frame.set(0, SlotValue::Exception(Arc::clone(&exception)))?;
///
/// assert!(Arc::ptr_eq(&frame.exception(0)?, &exception));
/// assert!(frame.exception(1).is_err());
/// # Ok::<(), landingpad::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Frame {
    slots: Vec<Option<SlotValue>>,
}

impl Frame {
    /// Creates a frame with `slot_count` empty slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Frame {
            slots: vec![None; slot_count],
        }
    }

    /// Number of slots in this frame.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Stores a value into a slot.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::SlotOutOfBounds`] for an invalid slot index.
    pub fn set(&mut self, slot: usize, value: SlotValue) -> Result<()> {
        let count = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(EmulationError::SlotOutOfBounds { slot, count })?;
        *entry = Some(value);
        Ok(())
    }

    /// Empties a slot, returning its previous value.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::SlotOutOfBounds`] for an invalid slot index.
    pub fn clear(&mut self, slot: usize) -> Result<Option<SlotValue>> {
        let count = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(EmulationError::SlotOutOfBounds { slot, count })?;
        Ok(entry.take())
    }

    /// Returns the value in a slot, or `None` if it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::SlotOutOfBounds`] for an invalid slot index.
    pub fn get(&self, slot: usize) -> Result<Option<&SlotValue>> {
        self.slots
            .get(slot)
            .map(Option::as_ref)
            .ok_or_else(|| {
                EmulationError::SlotOutOfBounds {
                    slot,
                    count: self.slots.len(),
                }
                .into()
            })
    }

    /// Reads the in-flight exception stored in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::MissingException`] if the slot is empty and
    /// [`EmulationError::SlotTypeMismatch`] if it holds anything else.
    pub fn exception(&self, slot: usize) -> Result<Arc<UserException>> {
        match self.get(slot)? {
            Some(SlotValue::Exception(exception)) => Ok(Arc::clone(exception)),
            Some(other) => Err(mismatch(slot, "exception", other)),
            None => Err(EmulationError::MissingException { slot }.into()),
        }
    }

    /// Reads the native stack handle stored in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::SlotTypeMismatch`] if the slot is empty or holds
    /// anything other than a stack handle.
    pub fn stack(&self, slot: usize) -> Result<StackPointer> {
        match self.get(slot)? {
            Some(SlotValue::Stack(stack)) => Ok(*stack),
            Some(other) => Err(mismatch(slot, "stack", other)),
            None => Err(empty(slot, "stack")),
        }
    }

    /// Reads a native pointer stored in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::SlotTypeMismatch`] if the slot is empty or holds
    /// anything other than a pointer.
    pub fn pointer(&self, slot: usize) -> Result<NativeAddress> {
        match self.get(slot)? {
            Some(SlotValue::Pointer(address)) => Ok(*address),
            Some(other) => Err(mismatch(slot, "pointer", other)),
            None => Err(empty(slot, "pointer")),
        }
    }
}

fn mismatch(slot: usize, expected: &'static str, found: &SlotValue) -> crate::Error {
    EmulationError::SlotTypeMismatch {
        slot,
        expected,
        found: found.kind(),
    }
    .into()
}

fn empty(slot: usize, expected: &'static str) -> crate::Error {
    EmulationError::SlotTypeMismatch {
        slot,
        expected,
        found: "empty",
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_kinds() {
        assert_eq!(SlotValue::I32(1).kind(), "i32");
        assert_eq!(
            SlotValue::Stack(StackPointer::new(NativeAddress::NULL)).kind(),
            "stack"
        );
        assert_eq!(SlotValue::Pointer(NativeAddress::NULL).kind(), "pointer");
    }

    #[test]
    fn test_missing_exception() {
        let frame = Frame::new(1);
        let err = frame.exception(0).unwrap_err();
        assert_eq!(
            err.as_emulation(),
            Some(&EmulationError::MissingException { slot: 0 })
        );
    }

    #[test]
    fn test_wrong_kind() {
        let mut frame = Frame::new(2);
        frame.set(0, SlotValue::I64(5)).unwrap();

        let err = frame.exception(0).unwrap_err();
        assert_eq!(
            err.as_emulation(),
            Some(&EmulationError::SlotTypeMismatch {
                slot: 0,
                expected: "exception",
                found: "i64",
            })
        );

        let err = frame.stack(1).unwrap_err();
        assert!(matches!(
            err.as_emulation(),
            Some(EmulationError::SlotTypeMismatch { found: "empty", .. })
        ));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut frame = Frame::new(1);
        assert!(frame.set(3, SlotValue::I32(0)).is_err());
        assert!(frame.get(3).is_err());
        assert!(frame.clear(3).is_err());
    }

    #[test]
    fn test_clear() {
        let mut frame = Frame::new(1);
        frame.set(0, SlotValue::I32(7)).unwrap();
        assert_eq!(frame.clear(0).unwrap(), Some(SlotValue::I32(7)));
        assert_eq!(frame.get(0).unwrap(), None);
    }
}
