//! Binding of scripts, modules, enums, aliases, and block scopes.
//!
//! Scripts share one compilation-wide top-level table (the session
//! globals), which is what makes a module reopened in a second file
//! merge into the symbol created by the first.

use tracing::trace;
use tsmeta_decl::{DeclArena, DeclIndex};

use crate::state::BindSession;
use crate::symbols::{SymbolKind, symbol_flags};

impl BindSession {
    /// Scripts do not enter any member table; their members bind straight
    /// into the globals. The script symbol itself is keyed by script name
    /// so a rebind of the same file reuses it.
    pub(crate) fn bind_script_decl(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let Some(decl) = decls.get(idx).cloned() else {
            return;
        };
        trace!(script = %decl.script, "binding script");
        let id = match self.script_symbols.get(&decl.script).copied() {
            Some(existing) => {
                self.prune_stale_declarations(decls, existing);
                if let Some(sym) = self.symbols.get_mut(existing) {
                    sym.declarations.push(idx);
                }
                existing
            }
            None => {
                let id = self
                    .symbols
                    .alloc(SymbolKind::Container, decl.script.clone(), symbol_flags::NONE);
                if let Some(sym) = self.symbols.get_mut(id) {
                    sym.declarations.push(idx);
                }
                self.script_symbols.insert(decl.script.clone(), id);
                id
            }
        };
        self.decl_symbols.insert(idx.0, id);
        if decl.ast.is_some() {
            self.node_symbols.insert(decl.ast.0, id);
        }
        // Top-level declarations bind with an empty scope stack, which
        // routes their names into the session globals.
        self.bind_children(decls, idx);
        self.check_overload_chains(decls, idx);
    }

    pub(crate) fn bind_module(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let id = self.declare_symbol(decls, idx);
        self.with_container(id, |s| {
            s.bind_children(decls, idx);
        });
        self.check_overload_chains(decls, idx);
    }

    pub(crate) fn bind_enum(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let id = self.declare_symbol(decls, idx);
        self.with_container(id, |s| {
            s.bind_children(decls, idx);
        });
    }

    pub(crate) fn bind_enum_member(&mut self, decls: &DeclArena, idx: DeclIndex) {
        self.declare_symbol(decls, idx);
    }

    /// Import aliases bind as type aliases; the alias target stays on the
    /// syntax node and is chased at reflection time.
    pub(crate) fn bind_type_alias(&mut self, decls: &DeclArena, idx: DeclIndex) {
        self.declare_symbol(decls, idx);
    }

    /// Catch and with blocks introduce an anonymous scope: locals inside
    /// them must not leak into the enclosing container's tables.
    pub(crate) fn bind_block_scope(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let Some(decl) = decls.get(idx).cloned() else {
            return;
        };
        let id = self
            .symbols
            .alloc(SymbolKind::Container, decl.name.clone(), symbol_flags::NONE);
        let container = self.current_container();
        if let Some(sym) = self.symbols.get_mut(id) {
            sym.container = container.unwrap_or(crate::symbols::SymbolId::NONE);
            sym.declarations.push(idx);
        }
        self.decl_symbols.insert(idx.0, id);
        if decl.ast.is_some() {
            self.node_symbols.insert(decl.ast.0, id);
        }
        self.with_container(id, |s| {
            s.bind_children(decls, idx);
        });
    }
}
