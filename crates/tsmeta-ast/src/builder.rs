//! Programmatic node construction.
//!
//! The tokenizer/parser that normally produces these trees is an external
//! collaborator, so tests (and any embedder without a parser) assemble
//! syntax trees through this builder. Children are allocated first and
//! attached by index.

use crate::node::{AstArena, Node, NodeIndex, Span, SyntaxKind, TypeExpr, ast_flags};

pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    pub fn new(kind: SyntaxKind) -> Self {
        Self {
            node: Node::new(kind),
        }
    }

    pub fn script() -> Self {
        Self::new(SyntaxKind::Script)
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Module).name(name)
    }

    /// Module declared with a quoted specifier (`module "name" { ... }`).
    pub fn dynamic_module(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Module)
            .name(name)
            .flag(ast_flags::DYNAMIC_MODULE)
    }

    pub fn import(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut b = Self::new(SyntaxKind::Import).name(name);
        b.node.alias_target = Some(target.into());
        b
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Class).name(name)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Interface).name(name)
    }

    pub fn enum_decl(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Enum).name(name)
    }

    pub fn enum_member(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::EnumMember).name(name)
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Function).name(name)
    }

    pub fn constructor() -> Self {
        Self::new(SyntaxKind::Function)
            .name("constructor")
            .flag(ast_flags::CONSTRUCTOR)
    }

    pub fn getter(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Function)
            .name(name)
            .flag(ast_flags::GET_ACCESSOR)
    }

    pub fn setter(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Function)
            .name(name)
            .flag(ast_flags::SET_ACCESSOR)
    }

    pub fn call_signature() -> Self {
        Self::new(SyntaxKind::Function).flag(ast_flags::CALL_SIGNATURE | ast_flags::SIGNATURE)
    }

    pub fn construct_signature() -> Self {
        Self::new(SyntaxKind::Function).flag(ast_flags::CONSTRUCT_SIGNATURE | ast_flags::SIGNATURE)
    }

    pub fn index_signature() -> Self {
        Self::new(SyntaxKind::Function).flag(ast_flags::INDEX_SIGNATURE | ast_flags::SIGNATURE)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Variable).name(name)
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::Parameter).name(name)
    }

    pub fn type_parameter(name: impl Into<String>) -> Self {
        Self::new(SyntaxKind::TypeParameter).name(name)
    }

    pub fn catch_block() -> Self {
        Self::new(SyntaxKind::Catch)
    }

    pub fn with_block() -> Self {
        Self::new(SyntaxKind::With)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.node.name = Some(name.into());
        self
    }

    pub fn span(mut self, start: u32, length: u32) -> Self {
        self.node.span = Span::new(start, length);
        self
    }

    pub fn flag(mut self, flags: u32) -> Self {
        self.node.flags |= flags;
        self
    }

    pub fn exported(self) -> Self {
        self.flag(ast_flags::EXPORTED)
    }

    pub fn private(self) -> Self {
        self.flag(ast_flags::PRIVATE)
    }

    pub fn static_member(self) -> Self {
        self.flag(ast_flags::STATIC)
    }

    pub fn optional(self) -> Self {
        self.flag(ast_flags::OPTIONAL)
    }

    pub fn ambient(self) -> Self {
        self.flag(ast_flags::AMBIENT)
    }

    /// Mark a callable as an overload signature (declaration without a body).
    pub fn signature(self) -> Self {
        self.flag(ast_flags::SIGNATURE)
    }

    /// Variable/parameter type annotation, or a callable's return type.
    pub fn typed(mut self, ty: TypeExpr) -> Self {
        self.node.type_annotation = Some(ty);
        self
    }

    pub fn returns(self, ty: TypeExpr) -> Self {
        self.typed(ty)
    }

    pub fn extends(mut self, ty: TypeExpr) -> Self {
        self.node.extends.push(ty);
        self
    }

    pub fn implements(mut self, ty: TypeExpr) -> Self {
        self.node.implements.push(ty);
        self
    }

    pub fn type_param(mut self, idx: NodeIndex) -> Self {
        self.node.type_parameters.push(idx);
        self
    }

    pub fn param(mut self, idx: NodeIndex) -> Self {
        self.node.parameters.push(idx);
        self
    }

    pub fn child(mut self, idx: NodeIndex) -> Self {
        self.node.children.push(idx);
        self
    }

    pub fn children(mut self, indices: impl IntoIterator<Item = NodeIndex>) -> Self {
        self.node.children.extend(indices);
        self
    }

    pub fn build(self, arena: &mut AstArena) -> NodeIndex {
        arena.alloc(self.node)
    }
}
