//! Symbol binding: declaration trees in, a persistent symbol graph out.
//!
//! The binder walks a collected declaration tree and, for every
//! declaration, creates or reuses a persistent [`Symbol`], links it into
//! its container's member table, and records a symbol-per-syntax-node
//! map. Re-binding after an incremental edit prunes declarations stamped
//! before the rebind cutoff and keeps surviving symbol identities stable.

pub mod state;
pub mod state_binding;
pub mod state_module_binding;
pub mod symbols;

pub use state::{BindSession, ValidationError};
pub use symbols::{Symbol, SymbolArena, SymbolId, SymbolKind, SymbolTable, symbol_flags};
