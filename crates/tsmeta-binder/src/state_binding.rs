//! Per-declaration binding: classes, interfaces, callables, members.
//!
//! Every binder funnels through [`BindSession::declare_symbol`], which
//! implements the shared merge-or-create protocol: look for a candidate
//! symbol in the right table, merge into it when the kinds agree, report
//! a duplicate and recover with an unlinked fresh symbol when they do
//! not. Container kinds then bind their children inside
//! `with_container`, so the scope stack always mirrors the declaration
//! tree.

use tsmeta_common::diagnostic_messages;
use tsmeta_decl::{DeclArena, DeclIndex, DeclKind, Declaration, decl_flags};

use crate::state::BindSession;
use crate::symbols::{SymbolId, SymbolKind, symbol_flags};

impl BindSession {
    /// Bind one declaration and (for containers) its subtree.
    pub(crate) fn bind_declaration(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let Some(decl) = decls.get(idx) else {
            return;
        };
        match decl.kind {
            DeclKind::Script => self.bind_script_decl(decls, idx),
            DeclKind::Module | DeclKind::DynamicModule => self.bind_module(decls, idx),
            DeclKind::Enum => self.bind_enum(decls, idx),
            DeclKind::EnumMember => self.bind_enum_member(decls, idx),
            DeclKind::TypeAlias => self.bind_type_alias(decls, idx),
            DeclKind::CatchBlock | DeclKind::WithBlock => self.bind_block_scope(decls, idx),
            DeclKind::Class => self.bind_class(decls, idx),
            DeclKind::Interface => self.bind_interface(decls, idx),
            DeclKind::Function | DeclKind::Method => self.bind_function(decls, idx),
            DeclKind::ConstructorMethod => self.bind_constructor(decls, idx),
            DeclKind::GetAccessor | DeclKind::SetAccessor => self.bind_accessor(decls, idx),
            DeclKind::CallSignature | DeclKind::ConstructSignature | DeclKind::IndexSignature => {
                self.bind_signature(decls, idx);
            }
            DeclKind::Variable | DeclKind::Property | DeclKind::Parameter => {
                self.bind_variable_like(decls, idx);
            }
            // Type parameters are routed into their owner's list by the
            // collector and bound by the owner, never as children.
            DeclKind::TypeParameter => {}
        }
    }

    pub(crate) fn bind_children(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let children = match decls.get(idx) {
            Some(decl) => decl.children.clone(),
            None => return,
        };
        for child in children {
            self.bind_declaration(decls, child);
        }
    }

    // =========================================================================
    // The shared declare protocol
    // =========================================================================

    /// Merge the declaration into an existing compatible symbol or create
    /// a new one. On a kind clash, reports `DuplicateIdentifier` and
    /// returns a fresh symbol that is *not* linked into any table, so
    /// binding of the duplicate's own children can proceed.
    pub(crate) fn declare_symbol(&mut self, decls: &DeclArena, idx: DeclIndex) -> SymbolId {
        let Some(decl) = decls.get(idx).cloned() else {
            return SymbolId::NONE;
        };
        let kind = Self::symbol_kind_for(decl.kind);
        let flags = Self::symbol_flags_for(&decl);

        let id = match self.find_candidate(&decl) {
            Some(existing) => {
                let alive = self.prune_stale_declarations(decls, existing);
                let existing_kind = self.symbols.get(existing).map(|s| s.kind);
                if existing_kind.is_some_and(|k| Self::kinds_compatible(k, kind)) {
                    if let Some(sym) = self.symbols.get_mut(existing) {
                        sym.flags |= flags;
                        sym.declarations.push(idx);
                    }
                    existing
                } else if !alive {
                    // Every declaration behind the candidate predates the
                    // rebind cutoff: the edit replaced the entity with one
                    // of another kind, which is not a duplicate.
                    self.remove_from_container(&decl, existing);
                    let id = self.alloc_unlinked(&decl, kind, flags, idx);
                    self.insert_into_container(&decl, id);
                    id
                } else {
                    self.error_at(&decl, diagnostic_messages::DUPLICATE_IDENTIFIER, &[&decl.name]);
                    self.alloc_unlinked(&decl, kind, flags, idx)
                }
            }
            None => {
                let id = self.alloc_unlinked(&decl, kind, flags, idx);
                self.insert_into_container(&decl, id);
                id
            }
        };
        self.record_symbol(&decl, idx, id);
        id
    }

    /// Allocate a symbol for `decl` without linking it into any member
    /// table.
    fn alloc_unlinked(
        &mut self,
        decl: &Declaration,
        kind: SymbolKind,
        flags: u32,
        idx: DeclIndex,
    ) -> SymbolId {
        let id = self.symbols.alloc(kind, decl.name.clone(), flags);
        let container = self.current_container().unwrap_or(SymbolId::NONE);
        if let Some(sym) = self.symbols.get_mut(id) {
            sym.container = container;
            sym.declarations.push(idx);
        }
        id
    }

    fn record_symbol(&mut self, decl: &Declaration, idx: DeclIndex, id: SymbolId) {
        self.decl_symbols.insert(idx.0, id);
        if decl.ast.is_some() {
            self.node_symbols.insert(decl.ast.0, id);
        }
    }

    /// Bind the owner's type parameters, merging re-declarations of the
    /// same name into the cached symbol.
    pub(crate) fn bind_type_parameters(
        &mut self,
        decls: &DeclArena,
        idx: DeclIndex,
        owner: SymbolId,
    ) {
        let tps = match decls.get(idx) {
            Some(decl) => decl.type_parameters.clone(),
            None => return,
        };
        for tp in tps {
            let Some(tp_decl) = decls.get(tp).cloned() else {
                continue;
            };
            let existing = self
                .symbols
                .get(owner)
                .and_then(|s| s.find_type_parameter(&self.symbols, &tp_decl.name));
            let id = match existing {
                Some(existing) => {
                    if let Some(sym) = self.symbols.get_mut(existing) {
                        sym.declarations.push(tp);
                    }
                    existing
                }
                None => {
                    let id = self.symbols.alloc(
                        SymbolKind::TypeParameter,
                        tp_decl.name.clone(),
                        symbol_flags::NONE,
                    );
                    if let Some(sym) = self.symbols.get_mut(id) {
                        sym.container = owner;
                        sym.declarations.push(tp);
                    }
                    if let Some(owner_sym) = self.symbols.get_mut(owner) {
                        owner_sym.type_parameters.push(id);
                    }
                    id
                }
            };
            self.record_symbol(&tp_decl, tp, id);
        }
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn bind_class(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let id = self.declare_symbol(decls, idx);
        let ctor_type = self.ensure_associated_type(id, SymbolKind::ConstructorType);
        // Statics accumulate in a side table while instance members bind
        // into the class itself; merged below once the body is done.
        self.static_sides.insert(id, Default::default());

        self.with_container(id, |s| {
            s.bind_type_parameters(decls, idx, id);
            s.bind_children(decls, idx);
        });

        if let Some(side) = self.static_sides.remove(&id) {
            let entries: Vec<(String, SymbolId)> =
                side.iter().map(|(n, &m)| (n.clone(), m)).collect();
            if let Some(ctor_sym) = self.symbols.get_mut(ctor_type) {
                for (name, member) in entries {
                    ctor_sym.members.set(name, member);
                }
            }
        }

        self.check_constructor_implementations(decls, idx);
        self.maintain_default_constructor(decls, idx, id, ctor_type);
        self.check_overload_chains(decls, idx);
    }

    /// More than one constructor body in the same class is an error;
    /// every implementation after the first is reported.
    fn check_constructor_implementations(&mut self, decls: &DeclArena, class: DeclIndex) {
        let children = match decls.get(class) {
            Some(decl) => decl.children.clone(),
            None => return,
        };
        let mut seen_impl = false;
        for child in children {
            let Some(decl) = decls.get(child) else {
                continue;
            };
            if decl.kind == DeclKind::ConstructorMethod && !decl.is_signature() {
                if seen_impl {
                    let decl = decl.clone();
                    self.error_at(
                        &decl,
                        diagnostic_messages::MULTIPLE_CONSTRUCTOR_IMPLEMENTATIONS,
                        &[],
                    );
                } else {
                    seen_impl = true;
                }
            }
        }
    }

    /// Classes without a declared constructor and without a base class
    /// get a synthesized default construct signature; a declared
    /// constructor (including one added by a rebind) evicts it.
    fn maintain_default_constructor(
        &mut self,
        decls: &DeclArena,
        class: DeclIndex,
        class_sym: SymbolId,
        ctor_type: SymbolId,
    ) {
        let (has_ctor, has_base) = match decls.get(class) {
            Some(decl) => (
                decl.children
                    .iter()
                    .any(|&c| decls.get(c).is_some_and(|d| d.kind == DeclKind::ConstructorMethod)),
                decl.has_flag(decl_flags::HAS_BASE),
            ),
            None => return,
        };
        let synthesized: Vec<SymbolId> = self
            .symbols
            .get(ctor_type)
            .map(|s| {
                s.construct_signatures
                    .iter()
                    .copied()
                    .filter(|&sig| self.symbols.get(sig).is_some_and(|s| s.is_synthesized()))
                    .collect()
            })
            .unwrap_or_default();

        if has_ctor || has_base {
            if !synthesized.is_empty() {
                if let Some(ctor_sym) = self.symbols.get_mut(ctor_type) {
                    ctor_sym
                        .construct_signatures
                        .retain(|sig| !synthesized.contains(sig));
                }
            }
            return;
        }
        if synthesized.is_empty() {
            let class_name = self
                .symbols
                .get(class_sym)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            let sig = self.symbols.alloc(
                SymbolKind::ConstructSignature,
                class_name,
                symbol_flags::SYNTHESIZED,
            );
            if let Some(sig_sym) = self.symbols.get_mut(sig) {
                sig_sym.container = class_sym;
            }
            if let Some(ctor_sym) = self.symbols.get_mut(ctor_type) {
                ctor_sym.construct_signatures.push(sig);
            }
        }
    }

    // =========================================================================
    // Interfaces, callables, members
    // =========================================================================

    fn bind_interface(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let id = self.declare_symbol(decls, idx);
        self.with_container(id, |s| {
            s.bind_type_parameters(decls, idx, id);
            s.bind_children(decls, idx);
        });
        self.check_overload_chains(decls, idx);
    }

    fn bind_function(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let id = self.declare_symbol(decls, idx);
        let assoc = self.ensure_associated_type(id, SymbolKind::FunctionType);
        self.append_signature(decls, idx, id, assoc, SymbolKind::CallSignature);
        self.with_container(id, |s| {
            s.bind_type_parameters(decls, idx, id);
            s.bind_children(decls, idx);
        });
    }

    fn bind_constructor(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let class = self.current_container();
        let id = self.declare_symbol(decls, idx);
        if let Some(class) = class {
            let ctor_type = self.ensure_associated_type(class, SymbolKind::ConstructorType);
            self.append_signature(decls, idx, id, ctor_type, SymbolKind::ConstructSignature);
        }
        self.with_container(id, |s| {
            s.bind_children(decls, idx);
        });
    }

    /// Record one construct/call signature on `target` for this
    /// declaration. Each physical declaration contributes its own
    /// signature symbol, so rebind pruning drops exactly the stale ones.
    fn append_signature(
        &mut self,
        decls: &DeclArena,
        idx: DeclIndex,
        owner: SymbolId,
        target: SymbolId,
        kind: SymbolKind,
    ) {
        let Some(decl) = decls.get(idx) else {
            return;
        };
        let sig = self
            .symbols
            .alloc(kind, decl.name.clone(), Self::symbol_flags_for(decl));
        if let Some(sig_sym) = self.symbols.get_mut(sig) {
            sig_sym.container = owner;
            sig_sym.declarations.push(idx);
        }
        if let Some(target_sym) = self.symbols.get_mut(target) {
            match kind {
                SymbolKind::ConstructSignature => target_sym.construct_signatures.push(sig),
                SymbolKind::IndexSignature => target_sym.index_signatures.push(sig),
                _ => target_sym.call_signatures.push(sig),
            }
        }
    }

    /// Getters and setters for one property name share a single accessor
    /// symbol; a second declaration of the same flavor is an error.
    fn bind_accessor(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let Some(decl) = decls.get(idx).cloned() else {
            return;
        };
        if !decl.type_parameters.is_empty() {
            self.error_at(
                &decl,
                diagnostic_messages::ACCESSOR_CANNOT_HAVE_TYPE_PARAMETERS,
                &[],
            );
        }
        let flags = Self::symbol_flags_for(&decl);

        let id = match self.find_candidate(&decl) {
            Some(existing) => {
                self.prune_stale_declarations(decls, existing);
                let existing_kind = self.symbols.get(existing).map(|s| s.kind);
                if existing_kind == Some(SymbolKind::Accessor) {
                    let flavor_clash = self
                        .symbols
                        .get(existing)
                        .is_some_and(|sym| {
                            sym.declarations.iter().any(|&d| {
                                decls.get(d).is_some_and(|prior| prior.kind == decl.kind)
                            })
                        });
                    if flavor_clash {
                        let message = if decl.kind == DeclKind::GetAccessor {
                            diagnostic_messages::GETTER_ALREADY_DECLARED
                        } else {
                            diagnostic_messages::SETTER_ALREADY_DECLARED
                        };
                        self.error_at(&decl, message, &[&decl.name]);
                        self.alloc_unlinked(&decl, SymbolKind::Accessor, flags, idx)
                    } else {
                        if let Some(sym) = self.symbols.get_mut(existing) {
                            sym.flags |= flags;
                            sym.declarations.push(idx);
                        }
                        existing
                    }
                } else {
                    self.error_at(&decl, diagnostic_messages::DUPLICATE_IDENTIFIER, &[&decl.name]);
                    self.alloc_unlinked(&decl, SymbolKind::Accessor, flags, idx)
                }
            }
            None => {
                let id = self.alloc_unlinked(&decl, SymbolKind::Accessor, flags, idx);
                self.insert_into_container(&decl, id);
                id
            }
        };
        self.record_symbol(&decl, idx, id);
        self.with_container(id, |s| {
            s.bind_children(decls, idx);
        });
    }

    /// Call/construct/index signature members of an interface or class
    /// body. These are unnamed: they never enter a member table, only the
    /// container's signature lists.
    fn bind_signature(&mut self, decls: &DeclArena, idx: DeclIndex) {
        let Some(decl) = decls.get(idx).cloned() else {
            return;
        };
        let kind = Self::symbol_kind_for(decl.kind);
        let id = self.alloc_unlinked(&decl, kind, Self::symbol_flags_for(&decl), idx);
        if let Some(container) = self.current_container() {
            if let Some(container_sym) = self.symbols.get_mut(container) {
                match kind {
                    SymbolKind::CallSignature => container_sym.call_signatures.push(id),
                    SymbolKind::ConstructSignature => container_sym.construct_signatures.push(id),
                    SymbolKind::IndexSignature => container_sym.index_signatures.push(id),
                    _ => {}
                }
            }
        }
        self.record_symbol(&decl, idx, id);
        self.with_container(id, |s| {
            s.bind_type_parameters(decls, idx, id);
            s.bind_children(decls, idx);
        });
    }

    fn bind_variable_like(&mut self, decls: &DeclArena, idx: DeclIndex) {
        self.declare_symbol(decls, idx);
    }

    // =========================================================================
    // Overload chains
    // =========================================================================

    /// A run of bodiless overload signatures must be terminated by a
    /// same-named implementation before anything else appears. Ambient
    /// signatures never need a body. Reported at the last dangling
    /// signature.
    pub(crate) fn check_overload_chains(&mut self, decls: &DeclArena, container: DeclIndex) {
        let children = match decls.get(container) {
            Some(decl) => decl.children.clone(),
            None => return,
        };
        let mut pending: Option<DeclIndex> = None;
        for child in children {
            let Some(decl) = decls.get(child) else {
                continue;
            };
            let overloadable = matches!(
                decl.kind,
                DeclKind::Function | DeclKind::Method | DeclKind::ConstructorMethod
            );
            if let Some(p) = pending {
                let continues = overloadable
                    && decls.get(p).is_some_and(|prior| prior.name == decl.name);
                if !continues {
                    self.report_missing_implementation(decls, p);
                    pending = None;
                }
            }
            if overloadable && decl.is_signature() {
                if !decl.has_flag(decl_flags::AMBIENT) {
                    pending = Some(child);
                }
            } else if overloadable {
                pending = None;
            }
        }
        if let Some(p) = pending {
            self.report_missing_implementation(decls, p);
        }
    }

    fn report_missing_implementation(&mut self, decls: &DeclArena, signature: DeclIndex) {
        let Some(decl) = decls.get(signature).cloned() else {
            return;
        };
        let message = if decl.kind == DeclKind::ConstructorMethod {
            diagnostic_messages::CONSTRUCTOR_IMPLEMENTATION_EXPECTED
        } else {
            diagnostic_messages::FUNCTION_IMPLEMENTATION_EXPECTED
        };
        self.error_at(&decl, message, &[&decl.name]);
    }
}
