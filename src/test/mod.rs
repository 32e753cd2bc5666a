//! Fakes and factories shared by the unit tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use crate::{
    emulation::{
        EmulationConfig, Frame, NativeAddress, NativeMemory, RuntimeContext, SlotValue,
        StackPointer, SymbolResolver, TypeMatcher, UnmanagedMemory,
    },
    Result, UserException,
};

pub const EXCEPTION_SLOT: usize = 0;
pub const STACK_SLOT: usize = 1;
pub const DESTINATION_SLOT: usize = 2;

pub const HEADER: NativeAddress = NativeAddress::new(0x9000);
pub const STACK: StackPointer = StackPointer::new(NativeAddress::new(0x7000));

/// Type matcher that catches a fixed set of types and records every query.
#[derive(Clone, Default)]
pub struct RecordingMatcher {
    catches: Arc<HashSet<u64>>,
    calls: Arc<Mutex<Vec<u64>>>,
}

impl RecordingMatcher {
    pub fn matching(types: &[u64]) -> Self {
        RecordingMatcher {
            catches: Arc::new(types.iter().copied().collect()),
            calls: Arc::default(),
        }
    }

    /// Catch types queried so far, in call order.
    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

impl TypeMatcher for RecordingMatcher {
    fn can_catch(
        &self,
        _stack: StackPointer,
        _unwind_header: NativeAddress,
        catch_type: NativeAddress,
    ) -> Result<bool> {
        self.calls.lock().unwrap().push(catch_type.value());
        Ok(self.catches.contains(&catch_type.value()))
    }
}

/// Memory wrapper counting `write` calls.
#[derive(Default)]
pub struct CountingMemory {
    inner: UnmanagedMemory,
    writes: usize,
}

impl CountingMemory {
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl NativeMemory for CountingMemory {
    fn alloc(&mut self, size: usize) -> Result<NativeAddress> {
        self.inner.alloc(size)
    }

    fn read(&self, address: NativeAddress, size: usize) -> Result<Vec<u8>> {
        self.inner.read(address, size)
    }

    fn write(&mut self, address: NativeAddress, data: &[u8]) -> Result<()> {
        self.writes += 1;
        self.inner.write(address, data)
    }
}

pub fn context_with(matcher: RecordingMatcher) -> RuntimeContext {
    context_with_config(matcher, EmulationConfig::default())
}

pub fn context_with_config(matcher: RecordingMatcher, config: EmulationConfig) -> RuntimeContext {
    RuntimeContext::new(config, Arc::new(matcher), Arc::new(SymbolResolver::new())).unwrap()
}

/// Frame with the exception and stack slots filled and an empty destination slot.
pub fn exception_frame() -> Frame {
    let mut frame = Frame::new(3);
    frame
        .set(
            EXCEPTION_SLOT,
            SlotValue::Exception(Arc::new(UserException::new(HEADER))),
        )
        .unwrap();
    frame.set(STACK_SLOT, SlotValue::Stack(STACK)).unwrap();
    frame
}
