//! Catch and filter clauses.
//!
//! # Evaluation
//!
//! A clause turns the in-flight exception into a [`Selector`]:
//!
//! - **Catch** - a null type info catches everything and yields
//!   [`Selector::CATCH_ALL`] without consulting the type matcher. Otherwise the
//!   matcher decides and a match yields the type info's address, truncated to 32
//!   bits, as selector. An address whose low word is zero truncates to
//!   [`Selector::NONE`], so such a match reads as a miss.
//! - **Filter** - the type infos are scanned in order. A null entry, or one the
//!   exception matches, satisfies the filter and the clause yields
//!   [`Selector::NONE`]. Exhausting the list (including an empty list) fires the
//!   clause with [`Selector::FILTER`].
//!
//! Type infos are resolved on every evaluation. The type matcher is acquired from
//! the [`RuntimeContext`] on the first predicate call and kept for the lifetime of
//! the clause.

use std::sync::{Arc, OnceLock};

use crate::{
    emulation::{
        engine::{Frame, RuntimeContext},
        exception::{ClauseKind, Operand, Selector},
        memory::{NativeAddress, StackPointer},
        runtime::TypeMatcher,
    },
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum ClauseBody {
    Catch { type_info: Operand },
    Filter { type_infos: Vec<Operand> },
}

/// One clause of a landing pad.
///
/// # Example
///
/// ```rust
/// use landingpad::{Clause, ClauseKind, Operand};
///
/// let typed = Clause::catch(Operand::symbol("_ZTIi"));
/// let any = Clause::catch_all();
/// let only = Clause::filter(vec![Operand::symbol("_ZTISt9exception")]);
///
/// assert_eq!(typed.kind(), ClauseKind::Catch);
/// assert!(any.is_catch_all());
/// assert_eq!(only.kind(), ClauseKind::Filter);
/// ```
#[derive(Clone)]
pub struct Clause {
    body: ClauseBody,
    can_catch: OnceLock<Arc<dyn TypeMatcher>>,
}

impl Clause {
    /// A catch clause for the type info `type_info`.
    ///
    /// An operand resolving to null makes this a catch-all.
    #[must_use]
    pub fn catch(type_info: Operand) -> Self {
        Self::from_body(ClauseBody::Catch { type_info })
    }

    /// A `catch (...)` clause.
    #[must_use]
    pub fn catch_all() -> Self {
        Self::catch(Operand::Null)
    }

    /// A filter clause over `type_infos`.
    #[must_use]
    pub fn filter(type_infos: Vec<Operand>) -> Self {
        Self::from_body(ClauseBody::Filter { type_infos })
    }

    fn from_body(body: ClauseBody) -> Self {
        Clause {
            body,
            can_catch: OnceLock::new(),
        }
    }

    /// Catch or filter.
    #[must_use]
    pub fn kind(&self) -> ClauseKind {
        match self.body {
            ClauseBody::Catch { .. } => ClauseKind::Catch,
            ClauseBody::Filter { .. } => ClauseKind::Filter,
        }
    }

    /// Returns `true` for a catch clause with a literal null type info.
    ///
    /// Operands that only resolve to null at runtime are not detected here.
    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        matches!(
            self.body,
            ClauseBody::Catch {
                type_info: Operand::Null
            }
        )
    }

    /// The operands this clause resolves on each evaluation.
    #[must_use]
    pub fn type_infos(&self) -> &[Operand] {
        match &self.body {
            ClauseBody::Catch { type_info } => std::slice::from_ref(type_info),
            ClauseBody::Filter { type_infos } => type_infos,
        }
    }

    /// Whether the type matcher has been acquired yet.
    #[must_use]
    pub fn has_matcher(&self) -> bool {
        self.can_catch.get().is_some()
    }

    /// Evaluates the clause against the exception behind `unwind_header`.
    ///
    /// # Arguments
    ///
    /// * `frame` - Frame used to resolve `Local` operands
    /// * `ctx` - Supplies the address resolver and the type matcher
    /// * `stack` - Native stack handle, passed to the type matcher unchanged
    /// * `unwind_header` - Unwind header of the in-flight exception
    ///
    /// # Errors
    ///
    /// Resolution failures and type matcher failures are fatal and returned as
    /// errors.
    pub fn evaluate(
        &self,
        frame: &Frame,
        ctx: &RuntimeContext,
        stack: StackPointer,
        unwind_header: NativeAddress,
    ) -> Result<Selector> {
        match &self.body {
            ClauseBody::Catch { type_info } => {
                let catch_type = ctx.resolver().to_native_address(frame, type_info)?;
                if catch_type.is_null() {
                    return Ok(Selector::CATCH_ALL);
                }
                if self.matcher(ctx).can_catch(stack, unwind_header, catch_type)? {
                    Ok(Selector::from_catch_address(catch_type))
                } else {
                    Ok(Selector::NONE)
                }
            }
            ClauseBody::Filter { type_infos } => {
                for type_info in type_infos {
                    let filter_type = ctx.resolver().to_native_address(frame, type_info)?;
                    if filter_type.is_null()
                        || self.matcher(ctx).can_catch(stack, unwind_header, filter_type)?
                    {
                        return Ok(Selector::NONE);
                    }
                }
                Ok(Selector::FILTER)
            }
        }
    }

    fn matcher(&self, ctx: &RuntimeContext) -> &Arc<dyn TypeMatcher> {
        self.can_catch.get_or_init(|| ctx.type_matcher())
    }
}

impl std::fmt::Debug for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clause")
            .field("kind", &self.kind())
            .field("type_infos", &self.type_infos())
            .field("has_matcher", &self.has_matcher())
            .finish()
    }
}

impl PartialEq for Clause {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

impl Eq for Clause {}
