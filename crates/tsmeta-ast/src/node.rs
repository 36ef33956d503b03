//! Arena-backed syntax nodes.
//!
//! Nodes carry only what the downstream stages consume: a kind, a source
//! span for diagnostic placement, declaration flags, an optional name,
//! type annotations, and ordered child lists. Callable refinements
//! (constructor, accessor, signature kinds) ride on `ast_flags` rather
//! than separate node kinds, so a single function node shape covers
//! every callable form.

/// Index of a node inside an [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// Source position span, used only for diagnostic placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub length: u32,
}

impl Span {
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }
}

/// Node kinds the walker dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Script,
    Module,
    Import,
    Class,
    Interface,
    Enum,
    EnumMember,
    Function,
    Variable,
    Parameter,
    TypeParameter,
    Catch,
    With,
}

/// Declaration attribute flags carried on syntax nodes.
pub mod ast_flags {
    pub const NONE: u32 = 0;
    pub const EXPORTED: u32 = 1 << 0;
    pub const PRIVATE: u32 = 1 << 1;
    pub const STATIC: u32 = 1 << 2;
    pub const OPTIONAL: u32 = 1 << 3;
    pub const AMBIENT: u32 = 1 << 4;
    /// Overload signature: a callable declaration without a body.
    pub const SIGNATURE: u32 = 1 << 5;
    pub const CONSTRUCTOR: u32 = 1 << 6;
    pub const GET_ACCESSOR: u32 = 1 << 7;
    pub const SET_ACCESSOR: u32 = 1 << 8;
    pub const CALL_SIGNATURE: u32 = 1 << 9;
    pub const CONSTRUCT_SIGNATURE: u32 = 1 << 10;
    pub const INDEX_SIGNATURE: u32 = 1 << 11;
    /// Module declared with a quoted specifier (`module "name"`).
    pub const DYNAMIC_MODULE: u32 = 1 << 12;
}

/// A textual type reference as it appears in source: a dotted name,
/// ordered generic arguments, and an array dimension count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub name: String,
    pub args: Vec<TypeExpr>,
    pub array_count: u32,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_count: 0,
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            args,
            array_count: 0,
        }
    }

    pub fn array_of(mut self, dimensions: u32) -> Self {
        self.array_count = dimensions;
        self
    }
}

/// One syntax node. Child lists are ordered; document order within a file
/// is the order the lists present.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: SyntaxKind,
    pub span: Span,
    pub flags: u32,
    pub name: Option<String>,
    /// Variable/parameter type, or a callable's return type.
    pub type_annotation: Option<TypeExpr>,
    pub extends: Vec<TypeExpr>,
    pub implements: Vec<TypeExpr>,
    /// Target of an `import X = A.B` alias.
    pub alias_target: Option<String>,
    pub type_parameters: Vec<NodeIndex>,
    pub parameters: Vec<NodeIndex>,
    pub children: Vec<NodeIndex>,
}

impl Node {
    pub fn new(kind: SyntaxKind) -> Self {
        Self {
            kind,
            span: Span::default(),
            flags: ast_flags::NONE,
            name: None,
            type_annotation: None,
            extends: Vec::new(),
            implements: Vec::new(),
            alias_target: None,
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Vec-backed node allocator. Indices are stable for the arena's lifetime.
#[derive(Debug, Default)]
pub struct AstArena {
    nodes: Vec<Node>,
}

impl AstArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, node: Node) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(node);
        idx
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get_mut(idx.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_index_is_never_a_node() {
        let mut arena = AstArena::new();
        let idx = arena.alloc(Node::new(SyntaxKind::Script));
        assert!(idx.is_some());
        assert!(arena.get(NodeIndex::NONE).is_none());
        assert!(arena.get(idx).is_some());
    }

    #[test]
    fn type_expr_array_dimensions() {
        let ty = TypeExpr::named("Foo").array_of(2);
        assert_eq!(ty.array_count, 2);
        assert_eq!(ty.name, "Foo");
    }
}
