//! Declaration nodes and their arena.

use tsmeta_ast::{NodeIndex, Span};

/// Index of a declaration inside a [`DeclArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclIndex(pub u32);

impl DeclIndex {
    pub const NONE: DeclIndex = DeclIndex(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// One variant per declaration kind, so binder dispatch is exhaustive at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Script,
    Module,
    DynamicModule,
    Class,
    Interface,
    Enum,
    EnumMember,
    Function,
    Method,
    ConstructorMethod,
    GetAccessor,
    SetAccessor,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    Variable,
    Property,
    TypeAlias,
    Parameter,
    TypeParameter,
    CatchBlock,
    WithBlock,
}

impl DeclKind {
    /// Containers push onto the binder's scope stack when entered.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            DeclKind::Script
                | DeclKind::Module
                | DeclKind::DynamicModule
                | DeclKind::Class
                | DeclKind::Interface
                | DeclKind::Enum
                | DeclKind::CatchBlock
                | DeclKind::WithBlock
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(
            self,
            DeclKind::Function
                | DeclKind::Method
                | DeclKind::ConstructorMethod
                | DeclKind::GetAccessor
                | DeclKind::SetAccessor
                | DeclKind::CallSignature
                | DeclKind::ConstructSignature
                | DeclKind::IndexSignature
        )
    }
}

/// Declaration attribute flags.
pub mod decl_flags {
    pub const NONE: u32 = 0;
    pub const EXPORTED: u32 = 1 << 0;
    pub const PRIVATE: u32 = 1 << 1;
    pub const STATIC: u32 = 1 << 2;
    pub const OPTIONAL: u32 = 1 << 3;
    pub const AMBIENT: u32 = 1 << 4;
    /// Overload signature: a callable declaration without a body.
    pub const SIGNATURE: u32 = 1 << 5;
    /// Class declares a base class (`extends` clause present).
    pub const HAS_BASE: u32 = 1 << 6;
}

/// One syntactic occurrence of a named construct, pre-binding.
///
/// The parent owns its ordered child list; children hold a non-owning
/// parent index. The binder records the decl→symbol association in its
/// session maps rather than on this node.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: DeclKind,
    pub flags: u32,
    pub name: String,
    /// Stable key of the compiled unit this declaration came from.
    pub script: String,
    /// Originating syntax node.
    pub ast: NodeIndex,
    pub span: Span,
    pub parent: DeclIndex,
    pub children: Vec<DeclIndex>,
    pub type_parameters: Vec<DeclIndex>,
    /// Monotonic creation stamp, compared against a rebind cutoff to
    /// detect stale declarations.
    pub generation: u32,
}

impl Declaration {
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn is_exported(&self) -> bool {
        self.has_flag(decl_flags::EXPORTED)
    }

    pub fn is_private(&self) -> bool {
        self.has_flag(decl_flags::PRIVATE)
    }

    pub fn is_static(&self) -> bool {
        self.has_flag(decl_flags::STATIC)
    }

    pub fn is_signature(&self) -> bool {
        self.has_flag(decl_flags::SIGNATURE)
    }
}

/// Explicit rebind epoch cutoff. Obtain one from
/// [`DeclArena::generation_marker`] *before* re-collecting a changed file;
/// declarations stamped earlier belong to the previous parse of that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationMarker {
    pub cutoff: u32,
}

/// Arena holding every declaration of a compilation, across all scripts.
/// Generations increase monotonically for the arena's lifetime.
#[derive(Debug, Default)]
pub struct DeclArena {
    decls: Vec<Declaration>,
    next_generation: u32,
}

impl DeclArena {
    pub fn new() -> Self {
        Self {
            decls: Vec::new(),
            next_generation: 0,
        }
    }

    pub fn alloc(
        &mut self,
        kind: DeclKind,
        flags: u32,
        name: impl Into<String>,
        script: impl Into<String>,
        ast: NodeIndex,
        span: Span,
    ) -> DeclIndex {
        let idx = DeclIndex(self.decls.len() as u32);
        let generation = self.next_generation;
        self.next_generation += 1;
        self.decls.push(Declaration {
            kind,
            flags,
            name: name.into(),
            script: script.into(),
            ast,
            span,
            parent: DeclIndex::NONE,
            children: Vec::new(),
            type_parameters: Vec::new(),
            generation,
        });
        idx
    }

    pub fn get(&self, idx: DeclIndex) -> Option<&Declaration> {
        if idx.is_none() {
            return None;
        }
        self.decls.get(idx.0 as usize)
    }

    pub fn get_mut(&mut self, idx: DeclIndex) -> Option<&mut Declaration> {
        if idx.is_none() {
            return None;
        }
        self.decls.get_mut(idx.0 as usize)
    }

    /// Attach `child` to `parent`, routing type parameters into the
    /// parent's type-parameter list and everything else into `children`.
    pub fn add_child(&mut self, parent: DeclIndex, child: DeclIndex) {
        let child_kind = match self.get(child) {
            Some(decl) => decl.kind,
            None => return,
        };
        if let Some(decl) = self.get_mut(child) {
            decl.parent = parent;
        }
        if let Some(parent_decl) = self.get_mut(parent) {
            if child_kind == DeclKind::TypeParameter {
                parent_decl.type_parameters.push(child);
            } else {
                parent_decl.children.push(child);
            }
        }
    }

    /// Cutoff for the next rebind: every declaration allocated from now on
    /// is "current" relative to this marker.
    pub fn generation_marker(&self) -> GenerationMarker {
        GenerationMarker {
            cutoff: self.next_generation,
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
