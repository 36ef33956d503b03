//! Binder session state.
//!
//! All formerly-global bookkeeping (rebind epochs, scope stack, symbol
//! counters) lives on [`BindSession`], so independent compilations never
//! share mutable state. A session is single-threaded and not re-entrant:
//! one bind or rebind pass runs to completion before the next starts,
//! which `&mut self` enforces.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;
use tsmeta_common::{Diagnostic, DiagnosticMessage};
use tsmeta_decl::{DeclArena, DeclIndex, DeclKind, Declaration, GenerationMarker};

use crate::symbols::{SymbolArena, SymbolId, SymbolKind, SymbolTable, symbol_flags};

/// Issues found by [`BindSession::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A node->symbol mapping points to a non-existent symbol.
    BrokenSymbolLink { node_index: u32, symbol_id: u32 },
    /// A live symbol has no declarations and was not synthesized.
    OrphanedSymbol { symbol_id: u32, name: String },
}

/// Rebind bookkeeping for one incremental pass.
pub(crate) struct RebindState {
    /// Stable key of the changed file; only its declarations are stale.
    pub(crate) changed_script: String,
    /// Declarations stamped before this cutoff and owned by the changed
    /// script are pruned.
    pub(crate) cutoff: u32,
    /// Symbols whose derived caches were already recomputed this pass.
    /// Recomputation happens exactly once per symbol per rebind.
    pub(crate) invalidated: FxHashSet<SymbolId>,
}

/// One symbol-binding session over a compilation's declaration arena.
pub struct BindSession {
    /// Arena for symbol storage.
    pub symbols: SymbolArena,
    /// Top-level member table shared by every script in the compilation;
    /// this is what makes a module reopened in another file merge.
    pub globals: SymbolTable,
    /// Declaration-to-symbol mapping, filled as declarations bind.
    pub decl_symbols: FxHashMap<u32, SymbolId>,
    /// Syntax-node-to-symbol mapping consumed by the reflection builder.
    pub node_symbols: FxHashMap<u32, SymbolId>,
    /// Structured error records, appended in bind order.
    pub diagnostics: Vec<Diagnostic>,
    /// Stack of enclosing container symbols.
    pub(crate) scope: SmallVec<[SymbolId; 16]>,
    pub(crate) rebind: Option<RebindState>,
    /// Static-member side tables, keyed by the class being bound; merged
    /// into the class's constructor type after all members are visited.
    pub(crate) static_sides: FxHashMap<SymbolId, SymbolTable>,
    /// Per-script container symbols, keyed by script key, so a rebind of
    /// the same file reuses the script's symbol.
    pub(crate) script_symbols: FxHashMap<String, SymbolId>,
}

impl BindSession {
    pub fn new() -> Self {
        Self {
            symbols: SymbolArena::new(),
            globals: SymbolTable::new(),
            decl_symbols: FxHashMap::default(),
            node_symbols: FxHashMap::default(),
            diagnostics: Vec::new(),
            scope: SmallVec::new(),
            rebind: None,
            static_sides: FxHashMap::default(),
            script_symbols: FxHashMap::default(),
        }
    }

    /// Bind one script's declaration tree for the first time.
    pub fn bind_script(&mut self, decls: &DeclArena, script: DeclIndex) {
        debug_assert!(self.scope.is_empty());
        self.bind_declaration(decls, script);
        debug_assert!(self.scope.is_empty(), "scope stack leaked across binding");
    }

    /// Re-bind a script after an incremental edit.
    ///
    /// `marker` must have been taken from the declaration arena *before*
    /// the changed script was re-collected; declarations of that script
    /// stamped before the marker are pruned from surviving symbols.
    pub fn rebind_script(&mut self, decls: &DeclArena, script: DeclIndex, marker: GenerationMarker) {
        let Some(script_decl) = decls.get(script) else {
            return;
        };
        debug!(script = %script_decl.script, cutoff = marker.cutoff, "rebind start");
        self.rebind = Some(RebindState {
            changed_script: script_decl.script.clone(),
            cutoff: marker.cutoff,
            invalidated: FxHashSet::default(),
        });
        self.bind_declaration(decls, script);
        self.finish_rebind(decls);
        self.rebind = None;
    }

    /// The bound symbol for a syntax node, if any.
    pub fn symbol_for_node(&self, node: tsmeta_ast::NodeIndex) -> Option<SymbolId> {
        self.node_symbols.get(&node.0).copied()
    }

    pub fn symbol_for_decl(&self, decl: DeclIndex) -> Option<SymbolId> {
        self.decl_symbols.get(&decl.0).copied()
    }

    // =========================================================================
    // Scope stack
    // =========================================================================

    /// Run `f` with `container` pushed as the innermost scope. The pop is
    /// unconditional, so an early return inside a per-kind binder can
    /// never leak the frame into a sibling declaration.
    pub(crate) fn with_container<R>(
        &mut self,
        container: SymbolId,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.scope.push(container);
        let result = f(self);
        self.scope.pop();
        result
    }

    pub(crate) fn current_container(&self) -> Option<SymbolId> {
        self.scope.last().copied()
    }

    // =========================================================================
    // Candidate lookup and container insertion
    // =========================================================================

    /// Whether a declaration lands in its container's public member table
    /// (classes/interfaces/enums split on `private`, everything else on
    /// `export`).
    pub(crate) fn is_public_member(&self, decl: &Declaration, container: SymbolId) -> bool {
        match self.symbols.get(container).map(|s| s.kind) {
            Some(SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum) => {
                !decl.is_private()
            }
            _ => decl.is_exported(),
        }
    }

    /// Search for an existing symbol the declaration could merge into:
    /// the parent's public member table for exported members, the
    /// contained table for private/un-exported ones, or the compilation
    /// globals at top level.
    pub(crate) fn find_candidate(&self, decl: &Declaration) -> Option<SymbolId> {
        let Some(container) = self.current_container() else {
            return self.globals.get(&decl.name);
        };

        // Statics live in the class's side table until the class body is
        // done; a redeclared static must find its prior symbol there, or
        // in the constructor type where a previous pass merged it.
        if decl.is_static() {
            if let Some(side) = self.static_sides.get(&container) {
                if let Some(found) = side.get(&decl.name) {
                    return Some(found);
                }
            }
            let class = self.symbols.get(container)?;
            let ctor_type = self.symbols.get(class.associated_type)?;
            return ctor_type
                .members
                .get(&decl.name)
                .or_else(|| ctor_type.contained.get(&decl.name));
        }

        let container_sym = self.symbols.get(container)?;
        if self.is_public_member(decl, container) {
            container_sym.members.get(&decl.name)
        } else {
            container_sym.contained.get(&decl.name)
        }
    }

    /// Insert a newly created symbol into its container's member table
    /// (or the globals at top level). Statics are diverted into the
    /// class's side table.
    pub(crate) fn insert_into_container(&mut self, decl: &Declaration, id: SymbolId) {
        let Some(container) = self.current_container() else {
            self.globals.set(decl.name.clone(), id);
            return;
        };

        if decl.is_static() {
            if let Some(side) = self.static_sides.get_mut(&container) {
                side.set(decl.name.clone(), id);
                return;
            }
        }

        let public = self.is_public_member(decl, container);
        if let Some(container_sym) = self.symbols.get_mut(container) {
            if public {
                container_sym.members.set(decl.name.clone(), id);
            } else {
                container_sym.contained.set(decl.name.clone(), id);
            }
        }
    }

    /// Remove a symbol from whichever table of the current container (or
    /// the globals) maps its name to it.
    pub(crate) fn remove_from_container(&mut self, decl: &Declaration, id: SymbolId) {
        let Some(container) = self.current_container() else {
            if self.globals.get(&decl.name) == Some(id) {
                self.globals.remove(&decl.name);
            }
            return;
        };
        if decl.is_static() {
            if let Some(side) = self.static_sides.get_mut(&container) {
                if side.get(&decl.name) == Some(id) {
                    side.remove(&decl.name);
                    return;
                }
            }
        }
        if let Some(container_sym) = self.symbols.get_mut(container) {
            if container_sym.members.get(&decl.name) == Some(id) {
                container_sym.members.remove(&decl.name);
            }
            if container_sym.contained.get(&decl.name) == Some(id) {
                container_sym.contained.remove(&decl.name);
            }
        }
    }

    // =========================================================================
    // Rebind pruning
    // =========================================================================

    pub(crate) fn decl_is_stale(&self, decl: &Declaration) -> bool {
        match &self.rebind {
            Some(rb) => decl.script == rb.changed_script && decl.generation < rb.cutoff,
            None => false,
        }
    }

    /// Prune stale declarations from a candidate symbol, recomputing its
    /// derived caches (type parameters, signature lists) at most once per
    /// rebind pass. Returns true if the symbol still has declarations (or
    /// is synthesized) afterwards.
    pub(crate) fn prune_stale_declarations(&mut self, decls: &DeclArena, id: SymbolId) -> bool {
        let (changed, cutoff) = match &self.rebind {
            Some(rb) => (rb.changed_script.clone(), rb.cutoff),
            None => return true,
        };
        let already_invalidated = self
            .rebind
            .as_ref()
            .is_some_and(|rb| rb.invalidated.contains(&id));

        let Some(sym) = self.symbols.get_mut(id) else {
            return false;
        };
        let before = sym.declarations.len();
        sym.declarations.retain(|&d| {
            decls
                .get(d)
                .is_none_or(|decl| !(decl.script == changed && decl.generation < cutoff))
        });
        let pruned = sym.declarations.len() < before;
        let alive = !sym.declarations.is_empty() || sym.is_synthesized();

        if pruned && !already_invalidated {
            if let Some(rb) = self.rebind.as_mut() {
                rb.invalidated.insert(id);
            }
            // Derived caches are recomputed here, once, from the
            // surviving declarations; never inside the retain loop.
            self.recompute_symbol_caches(decls, id);
        }
        alive
    }

    /// Drop cache entries (type parameters, call/construct/index
    /// signatures) whose backing symbols lost all their declarations.
    pub(crate) fn recompute_symbol_caches(&mut self, decls: &DeclArena, id: SymbolId) {
        let Some(sym) = self.symbols.get(id) else {
            return;
        };
        let mut lists = [
            sym.type_parameters.clone(),
            sym.call_signatures.clone(),
            sym.construct_signatures.clone(),
            sym.index_signatures.clone(),
        ];
        for list in &mut lists {
            list.retain(|&child| {
                let Some(child_sym) = self.symbols.get(child) else {
                    return false;
                };
                child_sym.is_synthesized()
                    || child_sym
                        .declarations
                        .iter()
                        .any(|&d| decls.get(d).is_some_and(|decl| !self.decl_is_stale(decl)))
            });
        }
        let [tps, calls, constructs, indexes] = lists;

        // Flags are derived state too: recompute them from the surviving
        // declarations so e.g. a dropped `export` modifier takes effect.
        let mut flags = self
            .symbols
            .get(id)
            .map(|s| s.flags & (symbol_flags::SYNTHESIZED | symbol_flags::TOMBSTONE))
            .unwrap_or(0);
        if let Some(sym) = self.symbols.get(id) {
            for &d in &sym.declarations {
                if let Some(decl) = decls.get(d) {
                    flags |= Self::symbol_flags_for(decl);
                }
            }
        }

        let assoc = self
            .symbols
            .get(id)
            .map(|s| s.associated_type)
            .unwrap_or(SymbolId::NONE);
        if let Some(sym) = self.symbols.get_mut(id) {
            sym.type_parameters = tps;
            sym.call_signatures = calls;
            sym.construct_signatures = constructs;
            sym.index_signatures = indexes;
            sym.flags = flags;
        }
        // Signature lists of a callable live on its associated type.
        if assoc.is_some() {
            self.recompute_symbol_caches(decls, assoc);
        }
    }

    /// End-of-rebind sweep: prune stale declarations from every symbol
    /// the pass did not revisit (members deleted by the edit), and remove
    /// emptied symbols from their containers.
    pub(crate) fn finish_rebind(&mut self, decls: &DeclArena) {
        let ids: Vec<SymbolId> = self.symbols.ids().collect();
        let mut dead: FxHashSet<SymbolId> = FxHashSet::default();
        for id in ids.iter().copied() {
            // Associated types carry no declarations of their own; they
            // live and die with their owning symbol, handled below.
            if self.symbols.get(id).is_some_and(|s| {
                matches!(s.kind, SymbolKind::FunctionType | SymbolKind::ConstructorType)
            }) {
                continue;
            }
            let alive = self.prune_stale_declarations(decls, id);
            if !alive {
                dead.insert(id);
            }
        }
        for id in ids {
            if let Some(sym) = self.symbols.get(id) {
                if matches!(
                    sym.kind,
                    SymbolKind::FunctionType | SymbolKind::ConstructorType
                ) && dead.contains(&sym.container)
                {
                    dead.insert(id);
                }
            }
        }
        if dead.is_empty() {
            return;
        }
        debug!(count = dead.len(), "removing emptied symbols after rebind");
        for &id in &dead {
            if let Some(sym) = self.symbols.get_mut(id) {
                sym.flags |= symbol_flags::TOMBSTONE;
            }
        }
        self.globals.retain(|_, id| !dead.contains(&id));
        for id in self.symbols.ids().collect::<Vec<_>>() {
            if let Some(sym) = self.symbols.get_mut(id) {
                sym.members.retain(|_, m| !dead.contains(&m));
                sym.contained.retain(|_, m| !dead.contains(&m));
                sym.type_parameters.retain(|tp| !dead.contains(tp));
                sym.call_signatures.retain(|s| !dead.contains(s));
                sym.construct_signatures.retain(|s| !dead.contains(s));
                sym.index_signatures.retain(|s| !dead.contains(s));
            }
        }
        self.decl_symbols.retain(|_, id| !dead.contains(id));
        self.node_symbols.retain(|_, id| !dead.contains(id));
        self.script_symbols.retain(|_, id| !dead.contains(id));
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn error_at(&mut self, decl: &Declaration, message: DiagnosticMessage, args: &[&str]) {
        self.diagnostics.push(Diagnostic::from_message(
            &decl.script,
            decl.span.start,
            decl.span.length,
            message,
            args,
        ));
    }

    // =========================================================================
    // Kind mapping and validation
    // =========================================================================

    pub(crate) fn symbol_kind_for(decl_kind: DeclKind) -> SymbolKind {
        match decl_kind {
            DeclKind::Script | DeclKind::CatchBlock | DeclKind::WithBlock => SymbolKind::Container,
            DeclKind::Module => SymbolKind::Container,
            DeclKind::DynamicModule => SymbolKind::DynamicModule,
            DeclKind::Class => SymbolKind::Class,
            DeclKind::Interface => SymbolKind::Interface,
            DeclKind::Enum => SymbolKind::Enum,
            DeclKind::EnumMember => SymbolKind::EnumMember,
            DeclKind::Function => SymbolKind::Function,
            DeclKind::Method => SymbolKind::Method,
            DeclKind::ConstructorMethod => SymbolKind::ConstructorMethod,
            DeclKind::GetAccessor | DeclKind::SetAccessor => SymbolKind::Accessor,
            DeclKind::CallSignature => SymbolKind::CallSignature,
            DeclKind::ConstructSignature => SymbolKind::ConstructSignature,
            DeclKind::IndexSignature => SymbolKind::IndexSignature,
            DeclKind::Variable => SymbolKind::Variable,
            DeclKind::Property => SymbolKind::Property,
            DeclKind::TypeAlias => SymbolKind::TypeAlias,
            DeclKind::Parameter => SymbolKind::Parameter,
            DeclKind::TypeParameter => SymbolKind::TypeParameter,
        }
    }

    /// Symbols of equal kind merge; everything else is a duplicate.
    pub(crate) fn kinds_compatible(existing: SymbolKind, incoming: SymbolKind) -> bool {
        existing == incoming
    }

    pub(crate) fn symbol_flags_for(decl: &Declaration) -> u32 {
        use tsmeta_decl::decl_flags;
        let mut flags = symbol_flags::NONE;
        if decl.has_flag(decl_flags::EXPORTED) {
            flags |= symbol_flags::EXPORTED;
        }
        if decl.has_flag(decl_flags::PRIVATE) {
            flags |= symbol_flags::PRIVATE;
        }
        if decl.has_flag(decl_flags::STATIC) {
            flags |= symbol_flags::STATIC;
        }
        if decl.has_flag(decl_flags::OPTIONAL) {
            flags |= symbol_flags::OPTIONAL;
        }
        if decl.has_flag(decl_flags::AMBIENT) {
            flags |= symbol_flags::AMBIENT;
        }
        flags
    }

    /// Check the session for broken node links and orphaned symbols.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (&node, &id) in &self.node_symbols {
            if self.symbols.get(id).is_none() {
                errors.push(ValidationError::BrokenSymbolLink {
                    node_index: node,
                    symbol_id: id.0,
                });
            }
        }
        for id in self.symbols.ids() {
            if let Some(sym) = self.symbols.get(id) {
                // Tombstones were deliberately emptied by a rebind sweep
                // and are no longer linked from anywhere.
                if sym.declarations.is_empty()
                    && !sym.is_synthesized()
                    && !sym.is_tombstone()
                    && !matches!(
                        sym.kind,
                        SymbolKind::FunctionType | SymbolKind::ConstructorType
                    )
                {
                    errors.push(ValidationError::OrphanedSymbol {
                        symbol_id: id.0,
                        name: sym.name.clone(),
                    });
                }
            }
        }
        errors
    }

    /// Allocate an associated type symbol (function type / constructor
    /// type) for `owner` if it does not have one yet.
    pub(crate) fn ensure_associated_type(&mut self, owner: SymbolId, kind: SymbolKind) -> SymbolId {
        if let Some(sym) = self.symbols.get(owner) {
            if sym.associated_type.is_some() {
                return sym.associated_type;
            }
        }
        let name = self
            .symbols
            .get(owner)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let assoc = self.symbols.alloc(kind, name, symbol_flags::NONE);
        if let Some(assoc_sym) = self.symbols.get_mut(assoc) {
            assoc_sym.container = owner;
        }
        if let Some(sym) = self.symbols.get_mut(owner) {
            sym.associated_type = assoc;
        }
        assoc
    }
}

impl Default for BindSession {
    fn default() -> Self {
        Self::new()
    }
}
