//! Symbols, symbol tables, and the symbol arena.

use indexmap::IndexMap;
use serde::Serialize;
use tsmeta_decl::DeclIndex;

/// Index of a symbol inside a [`SymbolArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// Semantic kind of a symbol. One declaration kind maps to exactly one
/// symbol kind; merging across kinds is rejected as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Class,
    Interface,
    /// Module/namespace container.
    Container,
    DynamicModule,
    Enum,
    EnumMember,
    Function,
    Method,
    ConstructorMethod,
    /// Getter/setter pair bound to one property name.
    Accessor,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    /// Call-signature-bearing type associated with a function or method.
    FunctionType,
    /// Construct-signature-bearing type associated with a class; also
    /// holds the class's static members.
    ConstructorType,
    Variable,
    Property,
    TypeAlias,
    Parameter,
    TypeParameter,
}

/// Symbol attribute flags.
pub mod symbol_flags {
    pub const NONE: u32 = 0;
    pub const EXPORTED: u32 = 1 << 0;
    pub const PRIVATE: u32 = 1 << 1;
    pub const STATIC: u32 = 1 << 2;
    pub const OPTIONAL: u32 = 1 << 3;
    pub const AMBIENT: u32 = 1 << 4;
    /// Symbol manufactured by the binder (e.g. a default constructor);
    /// it has no source declarations and survives rebind pruning.
    pub const SYNTHESIZED: u32 = 1 << 5;
    /// Symbol emptied by a rebind sweep. Arena slots are never reused,
    /// so the slot stays allocated, unlinked from every table and map.
    pub const TOMBSTONE: u32 = 1 << 6;
}

/// Name-to-symbol map with deterministic insertion-order iteration, so
/// duplicate resolution and member listing follow document order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: IndexMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn set(&mut self, name: String, id: SymbolId) {
        self.entries.insert(name, id);
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.entries.get(name).copied()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove an entry, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<SymbolId> {
        self.entries.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolId)> {
        self.entries.iter()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, SymbolId) -> bool) {
        self.entries.retain(|name, id| keep(name, *id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Persistent identity for a named program entity. A symbol owns its
/// member tables; the `container` back-reference is for scope lookups
/// only, never ownership.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub flags: u32,
    /// One entry per physical declaration site, in bind order.
    pub declarations: Vec<DeclIndex>,
    pub container: SymbolId,
    /// Exported/public members.
    pub members: SymbolTable,
    /// Non-exported/private members (visible inside the container only).
    pub contained: SymbolTable,
    pub type_parameters: Vec<SymbolId>,
    pub call_signatures: Vec<SymbolId>,
    pub construct_signatures: Vec<SymbolId>,
    pub index_signatures: Vec<SymbolId>,
    /// For functions/methods/accessors: their call-signature-bearing
    /// type. For classes: the constructor type holding statics.
    pub associated_type: SymbolId,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: String, flags: u32) -> Self {
        Self {
            name,
            kind,
            flags,
            declarations: Vec::new(),
            container: SymbolId::NONE,
            members: SymbolTable::new(),
            contained: SymbolTable::new(),
            type_parameters: Vec::new(),
            call_signatures: Vec::new(),
            construct_signatures: Vec::new(),
            index_signatures: Vec::new(),
            associated_type: SymbolId::NONE,
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn is_synthesized(&self) -> bool {
        self.has_flag(symbol_flags::SYNTHESIZED)
    }

    pub fn is_tombstone(&self) -> bool {
        self.has_flag(symbol_flags::TOMBSTONE)
    }

    /// Find a type parameter of this symbol by name.
    pub fn find_type_parameter(&self, arena: &SymbolArena, name: &str) -> Option<SymbolId> {
        self.type_parameters
            .iter()
            .copied()
            .find(|&tp| arena.get(tp).is_some_and(|s| s.name == name))
    }
}

/// Vec-backed symbol allocator shared by a whole compilation.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
        }
    }

    pub fn alloc(&mut self, kind: SymbolKind, name: impl Into<String>, flags: u32) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol::new(kind, name.into(), flags));
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SymbolId> {
        (0..self.symbols.len() as u32).map(SymbolId)
    }
}
