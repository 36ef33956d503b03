//! End-to-end facade over the binding and reflection pipeline.
//!
//! A [`Compilation`] owns the syntax arena, the declaration arena, and
//! one bind session. Embedders build syntax trees into the arena (via
//! [`NodeBuilder`] or a parser front end), register them as scripts, and
//! read back diagnostics, the symbol graph, and the resolved reflection
//! model.
//!
//! ```
//! use tsmeta::{Compilation, NodeBuilder, ResolveOptions};
//!
//! let mut comp = Compilation::new();
//! let class = NodeBuilder::class("Greeter").exported().build(comp.ast_mut());
//! let module = NodeBuilder::module("App").child(class).build(comp.ast_mut());
//! let script = NodeBuilder::script().child(module).build(comp.ast_mut());
//! comp.add_script("app.ts", script);
//!
//! assert!(comp.diagnostics().is_empty());
//! let (scripts, _) = comp.resolve(ResolveOptions::default());
//! assert_eq!(scripts[0].modules[0].classes[0].name, "Greeter");
//! ```

use tracing::debug;

pub use tsmeta_ast::{
    AstArena, NodeBuilder, NodeIndex, Span, SyntaxKind, TypeExpr, WalkContext, ast_flags, walk_ast,
};
pub use tsmeta_binder::{
    BindSession, Symbol, SymbolArena, SymbolId, SymbolKind, SymbolTable, ValidationError,
    symbol_flags,
};
pub use tsmeta_common::{Diagnostic, DiagnosticCategory, diagnostic_messages};
pub use tsmeta_decl::{
    DeclArena, DeclIndex, DeclKind, Declaration, GenerationMarker, collect_script, decl_flags,
};
pub use tsmeta_reflect::{
    Class, Import, Interface, Method, Module, Parameter, ResolveOptions, Script, Type, Variable,
    reflect_script, resolve_scripts,
};

struct ScriptEntry {
    path: String,
    ast_root: NodeIndex,
    decl_root: DeclIndex,
}

/// One compilation: a set of scripts bound into a shared symbol graph.
pub struct Compilation {
    ast: AstArena,
    decls: DeclArena,
    session: BindSession,
    scripts: Vec<ScriptEntry>,
}

impl Compilation {
    pub fn new() -> Self {
        Self {
            ast: AstArena::new(),
            decls: DeclArena::new(),
            session: BindSession::new(),
            scripts: Vec::new(),
        }
    }

    /// The syntax arena, for building script trees into.
    pub fn ast_mut(&mut self) -> &mut AstArena {
        &mut self.ast
    }

    pub fn ast(&self) -> &AstArena {
        &self.ast
    }

    /// Collect and bind a new script. `path` is the stable identity used
    /// for rebinds; for edits to an existing script use
    /// [`Compilation::update_script`].
    pub fn add_script(&mut self, path: &str, root: NodeIndex) {
        debug!(path, "adding script");
        let decl_root = collect_script(&self.ast, root, path, &mut self.decls);
        self.session.bind_script(&self.decls, decl_root);
        self.scripts.push(ScriptEntry {
            path: path.to_string(),
            ast_root: root,
            decl_root,
        });
    }

    /// Re-collect and re-bind one changed script, keeping every
    /// unchanged script's symbols intact. Returns false if the path was
    /// never added.
    pub fn update_script(&mut self, path: &str, root: NodeIndex) -> bool {
        let Some(position) = self.scripts.iter().position(|s| s.path == path) else {
            return false;
        };
        debug!(path, "updating script");
        let marker = self.decls.generation_marker();
        let decl_root = collect_script(&self.ast, root, path, &mut self.decls);
        self.scripts[position].ast_root = root;
        self.scripts[position].decl_root = decl_root;
        self.session.rebind_script(&self.decls, decl_root, marker);
        true
    }

    pub fn session(&self) -> &BindSession {
        &self.session
    }

    pub fn decls(&self) -> &DeclArena {
        &self.decls
    }

    /// Binder diagnostics accumulated so far, in bind order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.session.diagnostics
    }

    /// The bound symbol for a syntax node, if any.
    pub fn symbol_for_node(&self, node: NodeIndex) -> Option<SymbolId> {
        self.session.symbol_for_node(node)
    }

    /// The root declaration of a registered script.
    pub fn script_root(&self, path: &str) -> Option<DeclIndex> {
        self.scripts
            .iter()
            .find(|s| s.path == path)
            .map(|s| s.decl_root)
    }

    /// Build the unresolved reflection of every script, in registration
    /// order.
    pub fn reflect(&self) -> Vec<Script> {
        self.scripts
            .iter()
            .map(|entry| reflect_script(&self.ast, entry.ast_root, &self.session, &entry.path))
            .collect()
    }

    /// Reflect every script and run both resolution passes. Returns the
    /// resolved scripts plus any resolver diagnostics.
    pub fn resolve(&self, options: ResolveOptions) -> (Vec<Script>, Vec<Diagnostic>) {
        let mut scripts = self.reflect();
        let diagnostics = resolve_scripts(&mut scripts, options);
        (scripts, diagnostics)
    }

    /// Internal-consistency check of the symbol graph.
    pub fn validate(&self) -> Vec<ValidationError> {
        self.session.validate()
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new()
    }
}
