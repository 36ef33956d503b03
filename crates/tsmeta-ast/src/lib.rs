//! Syntax trees for the tsmeta pipeline.
//!
//! The real parser is an external collaborator; this crate defines the
//! arena-backed node representation it hands us, a programmatic builder
//! used by tests in its place, and the generic walker shared by the
//! declaration collector and the reflection builder.

pub mod builder;
pub mod node;
pub mod walker;

pub use builder::NodeBuilder;
pub use node::{AstArena, Node, NodeIndex, Span, SyntaxKind, TypeExpr, ast_flags};
pub use walker::{WalkContext, walk_ast};
