//! Builder for [`LandingPad`].

use std::sync::Arc;

use crate::{
    emulation::exception::{Clause, LandingPad, Operand},
    Result,
};

/// Collects the parts of a [`LandingPad`].
///
/// The exception slot, the stack slot and the destination are mandatory. A pad
/// without clauses is only accepted as a cleanup pad.
///
/// # Example
///
/// ```rust
/// use landingpad::{Clause, LandingPad, Operand};
///
/// let pad = LandingPad::builder()
///     .name("main.lpad")
///     .exception_slot(0)
///     .stack_slot(1)
///     .destination(Operand::Local(2))
///     .clause(Clause::catch(Operand::symbol("_ZTIi")))
///     .clause(Clause::catch_all())
///     .build()?;
///
/// assert_eq!(pad.clauses().len(), 2);
/// assert!(!pad.is_cleanup());
/// # Ok::<(), landingpad::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct LandingPadBuilder {
    name: Option<Arc<str>>,
    exception_slot: Option<usize>,
    stack_slot: Option<usize>,
    destination: Option<Operand>,
    clauses: Vec<Clause>,
    cleanup: bool,
}

impl LandingPadBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name used in traces. Defaults to `"landingpad"`.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    /// Sets the frame slot holding the in-flight exception.
    #[must_use]
    pub fn exception_slot(mut self, slot: usize) -> Self {
        self.exception_slot = Some(slot);
        self
    }

    /// Sets the frame slot holding the native stack handle.
    #[must_use]
    pub fn stack_slot(mut self, slot: usize) -> Self {
        self.stack_slot = Some(slot);
        self
    }

    /// Sets the operand resolving to the record destination.
    #[must_use]
    pub fn destination(mut self, destination: Operand) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Appends a clause.
    #[must_use]
    pub fn clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Appends several clauses, keeping their order.
    #[must_use]
    pub fn clauses(mut self, clauses: impl IntoIterator<Item = Clause>) -> Self {
        self.clauses.extend(clauses);
        self
    }

    /// Marks the pad as a cleanup pad.
    #[must_use]
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Builds the landing pad.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if a slot or the destination is
    /// missing, or if a non-cleanup pad has no clauses.
    pub fn build(self) -> Result<LandingPad> {
        let exception_slot = self
            .exception_slot
            .ok_or_else(|| config_error!("landing pad needs an exception slot"))?;
        let stack_slot = self
            .stack_slot
            .ok_or_else(|| config_error!("landing pad needs a stack slot"))?;
        let destination = self
            .destination
            .ok_or_else(|| config_error!("landing pad needs a destination"))?;

        if self.clauses.is_empty() && !self.cleanup {
            return Err(config_error!(
                "landing pad without clauses must be a cleanup pad"
            ));
        }

        Ok(LandingPad {
            name: self.name.unwrap_or_else(|| Arc::from("landingpad")),
            exception_slot,
            stack_slot,
            destination,
            clauses: self.clauses,
            cleanup: self.cleanup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn complete() -> LandingPadBuilder {
        LandingPad::builder()
            .exception_slot(0)
            .stack_slot(1)
            .destination(Operand::Local(2))
    }

    fn message(result: Result<LandingPad>) -> String {
        match result {
            Err(Error::Configuration { message, .. }) => message,
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_parts() {
        assert!(message(LandingPad::builder().build()).contains("exception slot"));
        assert!(message(LandingPad::builder().exception_slot(0).build()).contains("stack slot"));
        assert!(message(
            LandingPad::builder()
                .exception_slot(0)
                .stack_slot(1)
                .build()
        )
        .contains("destination"));
    }

    #[test]
    fn test_empty_pad_requires_cleanup() {
        assert!(message(complete().build()).contains("cleanup"));

        let pad = complete().cleanup(true).build().unwrap();
        assert!(pad.is_cleanup());
        assert!(pad.clauses().is_empty());
        assert_eq!(pad.name(), "landingpad");
    }

    #[test]
    fn test_clause_order_kept() {
        let pad = complete()
            .clause(Clause::catch(Operand::Address(1)))
            .clauses([Clause::filter(vec![]), Clause::catch_all()])
            .name("f.lpad")
            .build()
            .unwrap();

        assert_eq!(pad.name(), "f.lpad");
        assert_eq!(pad.exception_slot(), 0);
        assert_eq!(pad.stack_slot(), 1);
        assert_eq!(pad.destination(), &Operand::Local(2));
        assert_eq!(
            pad.clauses(),
            &[
                Clause::catch(Operand::Address(1)),
                Clause::filter(vec![]),
                Clause::catch_all()
            ]
        );
    }
}
