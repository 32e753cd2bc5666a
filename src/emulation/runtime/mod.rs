//! Native runtime collaborators of the landing pad.
//!
//! - [`TypeMatcher`] - the ABI "can this catch type catch that exception" oracle,
//!   with [`TypeInfoRegistry`] as a concrete implementation over registered type
//!   infos and their bases
//! - [`AddressResolver`] - turns clause operands and the destination expression
//!   into native addresses, with [`SymbolResolver`] as a symbol-table backed
//!   implementation
//!
//! Both traits are injected through the
//! [`RuntimeContext`](crate::emulation::RuntimeContext) so clause evaluation can
//! be exercised in isolation with fake oracles and resolvers.

mod matcher;
mod resolver;

pub use matcher::{TypeInfoRegistry, TypeMatcher};
pub use resolver::{AddressResolver, SymbolResolver};
