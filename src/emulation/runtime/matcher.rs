//! Type matching between thrown exceptions and catch types.
//!
//! # Type Matching
//!
//! A catch type catches an exception if the exception's dynamic type is the same
//! type or derives from it. The [`TypeMatcher`] trait is the boundary to whatever
//! implements that rule natively; [`TypeInfoRegistry`] implements it over an
//! explicit table of type infos and their base types.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::{
    emulation::{
        engine::EmulationError,
        memory::{NativeAddress, StackPointer},
    },
    Result,
};

/// The native "type A catches type B" oracle.
///
/// Implementations must be side-effect free from the caller's perspective and
/// safe to call concurrently from independent landing-pad evaluations.
///
/// Closures with the matching signature implement this trait, which keeps unit
/// tests short:
///
/// ```rust
/// use std::sync::Arc;
/// use landingpad::emulation::{NativeAddress, StackPointer, TypeMatcher};
///
/// let only_0x10 = |_stack: StackPointer,
///                   _header: NativeAddress,
///                   catch_type: NativeAddress|
///  -> landingpad::Result<bool> { Ok(catch_type.value() == 0x10) };
/// let matcher: Arc<dyn TypeMatcher> = Arc::new(only_0x10);
/// let stack = StackPointer::new(NativeAddress::NULL);
/// assert!(matcher.can_catch(stack, NativeAddress::new(1), NativeAddress::new(0x10))?);
/// # Ok::<(), landingpad::Error>(())
/// ```
pub trait TypeMatcher: Send + Sync {
    /// Returns `true` if `catch_type` catches the exception behind `unwind_header`.
    ///
    /// # Arguments
    ///
    /// * `stack` - The native stack of the unwinding thread, passed through unchanged
    /// * `unwind_header` - The in-flight exception's unwind header
    /// * `catch_type` - Address of the candidate type descriptor (never null)
    ///
    /// # Errors
    ///
    /// Implementations fail if the exception or the type cannot be inspected. Such
    /// failures are fatal to the landing-pad evaluation.
    fn can_catch(
        &self,
        stack: StackPointer,
        unwind_header: NativeAddress,
        catch_type: NativeAddress,
    ) -> Result<bool>;
}

impl<F> TypeMatcher for F
where
    F: Fn(StackPointer, NativeAddress, NativeAddress) -> Result<bool> + Send + Sync,
{
    fn can_catch(
        &self,
        stack: StackPointer,
        unwind_header: NativeAddress,
        catch_type: NativeAddress,
    ) -> Result<bool> {
        self(stack, unwind_header, catch_type)
    }
}

/// A type-match oracle over explicitly registered type infos.
///
/// Type infos are identified by their native address and list their direct base
/// types. Thrown exceptions are registered by unwind header together with the
/// type info of the thrown object.
///
/// # Example
///
/// ```rust
/// use landingpad::emulation::{NativeAddress, StackPointer, TypeInfoRegistry, TypeMatcher};
///
/// let base = NativeAddress::new(0x100);
/// let derived = NativeAddress::new(0x200);
/// let header = NativeAddress::new(0x9000);
///
/// let registry = TypeInfoRegistry::new();
/// registry.register_type(base, &[]);
/// registry.register_type(derived, &[base]);
/// registry.register_exception(header, derived);
///
/// let stack = StackPointer::new(NativeAddress::NULL);
/// assert!(registry.can_catch(stack, header, base)?);
/// assert!(registry.can_catch(stack, header, derived)?);
/// # Ok::<(), landingpad::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TypeInfoRegistry {
    /// Direct bases of every registered type info.
    bases: DashMap<NativeAddress, Vec<NativeAddress>>,
    /// Dynamic type of every registered in-flight exception.
    thrown: DashMap<NativeAddress, NativeAddress>,
}

impl TypeInfoRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type info and its direct base types.
    ///
    /// Registering the same type again replaces its bases.
    pub fn register_type(&self, type_info: NativeAddress, bases: &[NativeAddress]) {
        self.bases.insert(type_info, bases.to_vec());
    }

    /// Registers an in-flight exception with the type info of the thrown object.
    pub fn register_exception(&self, unwind_header: NativeAddress, type_info: NativeAddress) {
        self.thrown.insert(unwind_header, type_info);
    }

    /// Forgets an exception once it has been caught and destroyed.
    ///
    /// Returns the type info it was registered with.
    pub fn forget_exception(&self, unwind_header: NativeAddress) -> Option<NativeAddress> {
        self.thrown.remove(&unwind_header).map(|(_, ty)| ty)
    }

    /// Returns the dynamic type of a registered exception.
    #[must_use]
    pub fn thrown_type(&self, unwind_header: NativeAddress) -> Option<NativeAddress> {
        self.thrown.get(&unwind_header).map(|entry| *entry)
    }

    /// Returns `true` if `derived` is `base` or transitively inherits from it.
    ///
    /// Unregistered types have no bases. Cyclic base lists terminate.
    #[must_use]
    pub fn is_derived_from(&self, derived: NativeAddress, base: NativeAddress) -> bool {
        let mut pending = vec![derived];
        let mut visited = HashSet::new();

        while let Some(current) = pending.pop() {
            if current == base {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(parents) = self.bases.get(&current) {
                pending.extend(parents.iter().copied());
            }
        }

        false
    }
}

impl TypeMatcher for TypeInfoRegistry {
    fn can_catch(
        &self,
        _stack: StackPointer,
        unwind_header: NativeAddress,
        catch_type: NativeAddress,
    ) -> Result<bool> {
        let thrown = self
            .thrown_type(unwind_header)
            .ok_or(EmulationError::UnknownUnwindHeader {
                header: unwind_header.value(),
            })?;
        Ok(self.is_derived_from(thrown, catch_type))
    }
}
