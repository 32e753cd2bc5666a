//! The landing-pad dispatcher.
//!
//! [`LandingPad::dispatch`] is what an interpreter calls when an exception
//! unwinds into a function's landing pad:
//!
//! 1. Read the exception and the native stack handle from the frame
//! 2. Evaluate clauses left to right until one yields a non-zero selector
//! 3. On a match, or on a cleanup pad, resolve the destination and write the
//!    [`LandingPadRecord`] there
//! 4. Otherwise return [`LandingPadOutcome::Resume`] with the same exception and
//!    without touching memory

use std::sync::Arc;

use crate::{
    emulation::{
        config::TraceCategories,
        engine::{Frame, RuntimeContext, TraceEvent},
        exception::{Clause, LandingPadBuilder, LandingPadRecord, Operand, Selector, UserException},
        memory::{NativeAddress, NativeMemory, StackPointer},
    },
    Result,
};

/// What happened to an exception that reached a landing pad.
#[derive(Clone, Debug, PartialEq)]
pub enum LandingPadOutcome {
    /// The pad fired and the record was written.
    Landed {
        /// Address of the written [`LandingPadRecord`].
        record: NativeAddress,
        /// Selector stored in the record.
        selector: Selector,
    },
    /// No clause matched on a non-cleanup pad. The caller keeps unwinding with
    /// this exception, which is the one read from the frame.
    Resume(Arc<UserException>),
}

impl LandingPadOutcome {
    /// Returns the record address if the pad fired.
    #[must_use]
    pub fn record(&self) -> Option<NativeAddress> {
        match self {
            LandingPadOutcome::Landed { record, .. } => Some(*record),
            LandingPadOutcome::Resume(_) => None,
        }
    }

    /// Returns the selector if the pad fired.
    #[must_use]
    pub fn selector(&self) -> Option<Selector> {
        match self {
            LandingPadOutcome::Landed { selector, .. } => Some(*selector),
            LandingPadOutcome::Resume(_) => None,
        }
    }

    /// Returns `true` if the exception keeps unwinding.
    #[must_use]
    pub fn is_resume(&self) -> bool {
        matches!(self, LandingPadOutcome::Resume(_))
    }
}

/// A landing pad: ordered clauses plus a cleanup flag.
///
/// Built once per function via [`LandingPad::builder`] and reused for every
/// unwind through it, from any thread. Dispatch never mutates the clause list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandingPad {
    pub(crate) name: Arc<str>,
    pub(crate) exception_slot: usize,
    pub(crate) stack_slot: usize,
    pub(crate) destination: Operand,
    pub(crate) clauses: Vec<Clause>,
    pub(crate) cleanup: bool,
}

impl LandingPad {
    /// Starts building a landing pad.
    #[must_use]
    pub fn builder() -> LandingPadBuilder {
        LandingPadBuilder::new()
    }

    /// Name used in traces.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The clauses in evaluation order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether the pad fires even when no clause matches.
    #[must_use]
    pub fn is_cleanup(&self) -> bool {
        self.cleanup
    }

    /// Frame slot holding the in-flight exception.
    #[must_use]
    pub fn exception_slot(&self) -> usize {
        self.exception_slot
    }

    /// Frame slot holding the native stack handle.
    #[must_use]
    pub fn stack_slot(&self) -> usize {
        self.stack_slot
    }

    /// Operand resolving to the pre-allocated record destination.
    #[must_use]
    pub fn destination(&self) -> &Operand {
        &self.destination
    }

    /// Evaluates the pad for the exception currently stored in `frame`.
    ///
    /// # Arguments
    ///
    /// * `frame` - Frame holding the exception, the stack handle and any `Local` operands
    /// * `ctx` - Runtime collaborators and data layout
    /// * `memory` - Native memory the record is written to
    ///
    /// # Returns
    ///
    /// [`LandingPadOutcome::Landed`] with the record address if the pad fired,
    /// [`LandingPadOutcome::Resume`] if the exception must keep unwinding.
    ///
    /// # Errors
    ///
    /// Returns an [`EmulationError`](crate::emulation::EmulationError) if the frame
    /// does not hold an exception and a stack handle where expected, an operand
    /// cannot be resolved, the type matcher fails or the record cannot be written.
    pub fn dispatch<M>(
        &self,
        frame: &Frame,
        ctx: &RuntimeContext,
        memory: &mut M,
    ) -> Result<LandingPadOutcome>
    where
        M: NativeMemory + ?Sized,
    {
        let exception = frame.exception(self.exception_slot)?;
        let unwind_header = exception.unwind_header();
        let stack = frame.stack(self.stack_slot)?;

        ctx.trace(TraceCategories::DISPATCH, || TraceEvent::LandingPadEnter {
            pad: Arc::clone(&self.name),
            unwind_header,
            clause_count: self.clauses.len(),
            cleanup: self.cleanup,
        });

        let selector = self.select(frame, ctx, stack, unwind_header)?;

        if !selector.is_match() && !self.cleanup {
            ctx.trace(TraceCategories::DISPATCH, || TraceEvent::ExceptionPropagated {
                pad: Arc::clone(&self.name),
                unwind_header,
            });
            return Ok(LandingPadOutcome::Resume(exception));
        }

        let destination = ctx.resolver().to_native_address(frame, &self.destination)?;
        let record = LandingPadRecord::new(unwind_header, selector).write(
            memory,
            destination,
            ctx.layout(),
        )?;

        ctx.trace(TraceCategories::DISPATCH, || TraceEvent::LandingPadFired {
            pad: Arc::clone(&self.name),
            selector: selector.value(),
            record,
        });

        Ok(LandingPadOutcome::Landed { record, selector })
    }

    /// First non-zero clause selector, or [`Selector::NONE`].
    fn select(
        &self,
        frame: &Frame,
        ctx: &RuntimeContext,
        stack: StackPointer,
        unwind_header: NativeAddress,
    ) -> Result<Selector> {
        for (index, clause) in self.clauses.iter().enumerate() {
            let selector = clause.evaluate(frame, ctx, stack, unwind_header)?;

            ctx.trace(TraceCategories::CLAUSES, || TraceEvent::ClauseEvaluated {
                pad: Arc::clone(&self.name),
                index,
                kind: clause.kind(),
                selector: selector.value(),
            });

            if selector.is_match() {
                return Ok(selector);
            }
        }
        Ok(Selector::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        emulation::{EmulationConfig, EmulationError, SlotValue, UnmanagedMemory},
        test::{
            context_with, context_with_config, exception_frame, CountingMemory,
            RecordingMatcher, DESTINATION_SLOT, EXCEPTION_SLOT, HEADER, STACK_SLOT,
        },
    };

    fn pad(clauses: Vec<Clause>, cleanup: bool) -> LandingPad {
        LandingPad::builder()
            .name("lpad")
            .exception_slot(EXCEPTION_SLOT)
            .stack_slot(STACK_SLOT)
            .destination(Operand::Local(DESTINATION_SLOT))
            .clauses(clauses)
            .cleanup(cleanup)
            .build()
            .unwrap()
    }

    fn frame_with_destination(memory: &mut CountingMemory, ctx: &RuntimeContext) -> Frame {
        let mut frame = exception_frame();
        let slot = LandingPadRecord::allocate(memory, ctx.layout()).unwrap();
        frame.set(DESTINATION_SLOT, SlotValue::Pointer(slot)).unwrap();
        frame
    }

    #[test]
    fn test_first_match_wins() {
        let matcher = RecordingMatcher::matching(&[0x20, 0x30]);
        let ctx = context_with(matcher.clone());
        let mut memory = CountingMemory::default();
        let frame = frame_with_destination(&mut memory, &ctx);

        let pad = pad(
            vec![
                Clause::catch(Operand::Address(0x10)),
                Clause::catch(Operand::Address(0x20)),
                Clause::catch(Operand::Address(0x30)),
            ],
            false,
        );
        let outcome = pad.dispatch(&frame, &ctx, &mut memory).unwrap();

        assert_eq!(outcome.selector(), Some(Selector::new(0x20)));
        assert_eq!(matcher.calls(), vec![0x10, 0x20]);
        assert_eq!(memory.writes(), 1);

        let record = LandingPadRecord::read(&memory, outcome.record().unwrap(), ctx.layout())
            .unwrap();
        assert_eq!(record, LandingPadRecord::new(HEADER, Selector::new(0x20)));
    }

    #[test]
    fn test_resume_without_writes() {
        let ctx = context_with(RecordingMatcher::matching(&[]));
        let mut memory = CountingMemory::default();
        let frame = frame_with_destination(&mut memory, &ctx);

        let pad = pad(vec![Clause::catch(Operand::Address(0x10))], false);
        let outcome = pad.dispatch(&frame, &ctx, &mut memory).unwrap();

        match outcome {
            LandingPadOutcome::Resume(exception) => {
                assert!(Arc::ptr_eq(
                    &exception,
                    &frame.exception(EXCEPTION_SLOT).unwrap()
                ));
            }
            other => panic!("expected resume, got {other:?}"),
        }
        assert_eq!(memory.writes(), 0);
    }

    #[test]
    fn test_resume_does_not_resolve_destination() {
        let ctx = context_with(RecordingMatcher::matching(&[]));
        let mut memory = CountingMemory::default();
        // destination slot left empty
        let frame = exception_frame();

        let pad = pad(vec![Clause::catch(Operand::Address(0x10))], false);
        assert!(pad.dispatch(&frame, &ctx, &mut memory).unwrap().is_resume());
    }

    #[test]
    fn test_cleanup_fires_with_zero() {
        let ctx = context_with(RecordingMatcher::matching(&[]));
        let mut memory = CountingMemory::default();
        let frame = frame_with_destination(&mut memory, &ctx);

        let pad = pad(vec![Clause::catch(Operand::Address(0x10))], true);
        let outcome = pad.dispatch(&frame, &ctx, &mut memory).unwrap();

        assert_eq!(outcome.selector(), Some(Selector::NONE));
        assert_eq!(memory.writes(), 1);
    }

    #[test]
    fn test_low_word_zero_catch_falls_through() {
        let matcher = RecordingMatcher::matching(&[0x7FFF_0000_0000]);
        let ctx = context_with(matcher.clone());
        let mut memory = CountingMemory::default();
        let frame = frame_with_destination(&mut memory, &ctx);

        let pad = pad(
            vec![
                Clause::catch(Operand::Address(0x7FFF_0000_0000)),
                Clause::catch_all(),
            ],
            false,
        );
        let outcome = pad.dispatch(&frame, &ctx, &mut memory).unwrap();

        assert_eq!(outcome.selector(), Some(Selector::CATCH_ALL));
        assert_eq!(matcher.calls(), vec![0x7FFF_0000_0000]);
        assert_eq!(memory.writes(), 1);
    }

    #[test]
    fn test_unresolvable_destination_is_fatal() {
        let ctx = context_with(RecordingMatcher::matching(&[]));
        let mut memory = CountingMemory::default();
        // destination slot left empty
        let frame = exception_frame();

        let err = pad(vec![Clause::catch_all()], false)
            .dispatch(&frame, &ctx, &mut memory)
            .unwrap_err();
        assert_eq!(
            err.as_emulation(),
            Some(&EmulationError::SlotTypeMismatch {
                slot: DESTINATION_SLOT,
                expected: "pointer",
                found: "empty",
            })
        );
        assert_eq!(memory.writes(), 0);
    }

    #[test]
    fn test_missing_exception_is_fatal() {
        let ctx = context_with(RecordingMatcher::matching(&[]));
        let mut memory = CountingMemory::default();
        let mut frame = exception_frame();
        frame.clear(EXCEPTION_SLOT).unwrap();

        let err = pad(vec![Clause::catch_all()], false)
            .dispatch(&frame, &ctx, &mut memory)
            .unwrap_err();
        assert_eq!(
            err.as_emulation(),
            Some(&EmulationError::MissingException {
                slot: EXCEPTION_SLOT
            })
        );
        assert_eq!(memory.writes(), 0);
    }

    #[test]
    fn test_wrong_stack_kind_is_fatal() {
        let ctx = context_with(RecordingMatcher::matching(&[]));
        let mut memory = CountingMemory::default();
        let mut frame = exception_frame();
        frame.set(STACK_SLOT, SlotValue::I64(0)).unwrap();

        let err = pad(vec![Clause::catch_all()], false)
            .dispatch(&frame, &ctx, &mut memory)
            .unwrap_err();
        assert!(err
            .as_emulation()
            .is_some_and(EmulationError::is_frame_fault));
    }

    #[test]
    fn test_trace_events() {
        let ctx = context_with_config(
            RecordingMatcher::matching(&[]),
            EmulationConfig::traced(),
        );
        let mut memory = CountingMemory::default();
        let frame = frame_with_destination(&mut memory, &ctx);

        let pad = pad(
            vec![
                Clause::catch(Operand::Address(0x10)),
                Clause::filter(vec![Operand::Address(0x20)]),
            ],
            false,
        );
        let outcome = pad.dispatch(&frame, &ctx, &mut memory).unwrap();
        let record = outcome.record().unwrap();

        let events = ctx.tracer().unwrap().take_buffer().unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            TraceEvent::LandingPadEnter {
                clause_count: 2,
                cleanup: false,
                ..
            }
        ));
        assert!(matches!(
            events[2],
            TraceEvent::ClauseEvaluated {
                index: 1,
                selector: -1,
                ..
            }
        ));
        assert_eq!(
            events[3],
            TraceEvent::LandingPadFired {
                pad: Arc::from("lpad"),
                selector: -1,
                record,
            }
        );
    }

    #[test]
    fn test_dispatch_on_dyn_memory() {
        let ctx = context_with(RecordingMatcher::matching(&[]));
        let mut backing = UnmanagedMemory::default();
        let mut frame = exception_frame();
        let slot = LandingPadRecord::allocate(&mut backing, ctx.layout()).unwrap();
        frame.set(DESTINATION_SLOT, SlotValue::Pointer(slot)).unwrap();

        let memory: &mut dyn NativeMemory = &mut backing;
        let outcome = pad(vec![Clause::catch_all()], false)
            .dispatch(&frame, &ctx, memory)
            .unwrap();
        assert_eq!(outcome.selector(), Some(Selector::CATCH_ALL));
    }
}
