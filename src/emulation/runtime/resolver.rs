//! Operand to native address resolution.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    emulation::{engine::EmulationError, engine::Frame, exception::Operand, memory::NativeAddress},
    Result,
};

/// Converts operands to native addresses.
///
/// Used for clause type infos and for the landing-pad destination. Resolution
/// happens on every evaluation, never cached, because `Local` operands depend on
/// the frame.
pub trait AddressResolver: Send + Sync {
    /// Resolves an operand in the context of `frame`.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the operand cannot be resolved, for instance an
    /// unknown symbol or a slot that does not hold a pointer.
    fn to_native_address(&self, frame: &Frame, operand: &Operand) -> Result<NativeAddress>;
}

/// An [`AddressResolver`] backed by a symbol table.
///
/// - [`Operand::Null`] resolves to address 0
/// - [`Operand::Address`] resolves to itself
/// - [`Operand::Symbol`] is looked up in the table
/// - [`Operand::Local`] reads a pointer from the frame slot
#[derive(Debug, Default)]
pub struct SymbolResolver {
    symbols: DashMap<Arc<str>, NativeAddress>,
}

impl SymbolResolver {
    /// Creates an empty symbol table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `address`, replacing any previous binding.
    pub fn define(&self, name: &str, address: NativeAddress) {
        self.symbols.insert(Arc::from(name), address);
    }

    /// Looks up a symbol.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NativeAddress> {
        self.symbols.get(name).map(|entry| *entry)
    }

    /// Number of defined symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if no symbol is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl AddressResolver for SymbolResolver {
    fn to_native_address(&self, frame: &Frame, operand: &Operand) -> Result<NativeAddress> {
        match operand {
            Operand::Null => Ok(NativeAddress::NULL),
            Operand::Address(address) => Ok(NativeAddress::new(*address)),
            Operand::Symbol(name) => self.lookup(name).ok_or_else(|| {
                EmulationError::UnresolvedSymbol {
                    name: name.to_string(),
                }
                .into()
            }),
            Operand::Local(slot) => frame.pointer(*slot),
        }
    }
}
