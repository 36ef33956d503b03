//! The declaration tree: one node per physical declaration site.
//!
//! Declarations are transient structural nodes collected from a parsed
//! script. They are invalidated wholesale when their file is recompiled;
//! the persistent identity lives in the binder's symbols, not here.

pub mod collect;
pub mod decl;

pub use collect::collect_script;
pub use decl::{DeclArena, DeclIndex, DeclKind, Declaration, GenerationMarker, decl_flags};
