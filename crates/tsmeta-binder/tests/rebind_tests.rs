//! Incremental re-binding after a single-file edit.
//!
//! The flow mirrors an embedder reacting to a file change: take a
//! generation marker from the declaration arena, re-collect the changed
//! script into the same arena, then re-bind with the marker as the
//! staleness cutoff.

use tsmeta_ast::{AstArena, NodeBuilder, NodeIndex};
use tsmeta_binder::{BindSession, SymbolId, SymbolKind};
use tsmeta_decl::{DeclArena, DeclIndex, collect_script};

fn bind_first(
    ast: &AstArena,
    root: NodeIndex,
    script: &str,
    decls: &mut DeclArena,
) -> (BindSession, DeclIndex) {
    let script_decl = collect_script(ast, root, script, decls);
    let mut session = BindSession::new();
    session.bind_script(decls, script_decl);
    (session, script_decl)
}

fn rebind(
    session: &mut BindSession,
    ast: &AstArena,
    root: NodeIndex,
    script: &str,
    decls: &mut DeclArena,
) -> DeclIndex {
    let marker = decls.generation_marker();
    let script_decl = collect_script(ast, root, script, decls);
    session.rebind_script(decls, script_decl, marker);
    script_decl
}

fn global(session: &BindSession, name: &str) -> SymbolId {
    session
        .globals
        .get(name)
        .unwrap_or_else(|| panic!("no global symbol named {name}"))
}

#[test]
fn pruning_drops_removed_declaration_but_keeps_identity() {
    let mut ast = AstArena::new();
    let first = NodeBuilder::class("Foo").span(0, 10).build(&mut ast);
    let second = NodeBuilder::class("Foo").span(20, 10).build(&mut ast);
    let script_v1 = NodeBuilder::script().child(first).child(second).build(&mut ast);

    let mut decls = DeclArena::new();
    let (mut session, _) = bind_first(&ast, script_v1, "a.ts", &mut decls);
    let original = global(&session, "Foo");
    assert_eq!(session.symbols.get(original).unwrap().declarations.len(), 2);

    // Edit removes the second declaration.
    let survivor = NodeBuilder::class("Foo").span(0, 10).build(&mut ast);
    let script_v2 = NodeBuilder::script().child(survivor).build(&mut ast);
    rebind(&mut session, &ast, script_v2, "a.ts", &mut decls);

    let rebound = global(&session, "Foo");
    assert_eq!(rebound, original, "symbol identity must survive a rebind");
    assert_eq!(session.symbols.get(rebound).unwrap().declarations.len(), 1);
    assert_eq!(session.symbol_for_node(survivor), Some(original));
}

#[test]
fn deleted_top_level_symbol_is_swept() {
    let mut ast = AstArena::new();
    let keep = NodeBuilder::class("Keep").build(&mut ast);
    let drop = NodeBuilder::class("Drop").build(&mut ast);
    let script_v1 = NodeBuilder::script().child(keep).child(drop).build(&mut ast);

    let mut decls = DeclArena::new();
    let (mut session, _) = bind_first(&ast, script_v1, "a.ts", &mut decls);
    assert!(session.globals.has("Drop"));

    let keep_v2 = NodeBuilder::class("Keep").build(&mut ast);
    let script_v2 = NodeBuilder::script().child(keep_v2).build(&mut ast);
    rebind(&mut session, &ast, script_v2, "a.ts", &mut decls);

    assert!(session.globals.has("Keep"));
    assert!(!session.globals.has("Drop"));
    assert!(session.validate().is_empty());
}

#[test]
fn other_scripts_are_untouched_by_rebind() {
    let mut ast = AstArena::new();
    let class_a = NodeBuilder::class("A").build(&mut ast);
    let script_a = NodeBuilder::script().child(class_a).build(&mut ast);
    let class_b = NodeBuilder::class("B").build(&mut ast);
    let script_b = NodeBuilder::script().child(class_b).build(&mut ast);

    let mut decls = DeclArena::new();
    let root_a = collect_script(&ast, script_a, "a.ts", &mut decls);
    let root_b = collect_script(&ast, script_b, "b.ts", &mut decls);
    let mut session = BindSession::new();
    session.bind_script(&decls, root_a);
    session.bind_script(&decls, root_b);
    let b_before = global(&session, "B");

    // Rebind a.ts only; b.ts symbols and declarations must be untouched
    // even though their generations predate the cutoff.
    let class_a2 = NodeBuilder::class("A").build(&mut ast);
    let script_a2 = NodeBuilder::script().child(class_a2).build(&mut ast);
    let marker = decls.generation_marker();
    let root_a2 = collect_script(&ast, script_a2, "a.ts", &mut decls);
    session.rebind_script(&decls, root_a2, marker);

    let b_after = global(&session, "B");
    assert_eq!(b_before, b_after);
    assert_eq!(session.symbols.get(b_after).unwrap().declarations.len(), 1);
}

#[test]
fn member_removed_by_edit_leaves_class_table() {
    let mut ast = AstArena::new();
    let x = NodeBuilder::variable("x").build(&mut ast);
    let y = NodeBuilder::variable("y").build(&mut ast);
    let class_v1 = NodeBuilder::class("Point").child(x).child(y).build(&mut ast);
    let script_v1 = NodeBuilder::script().child(class_v1).build(&mut ast);

    let mut decls = DeclArena::new();
    let (mut session, _) = bind_first(&ast, script_v1, "a.ts", &mut decls);
    let class_sym = global(&session, "Point");
    assert!(session.symbols.get(class_sym).unwrap().members.has("y"));

    let x2 = NodeBuilder::variable("x").build(&mut ast);
    let class_v2 = NodeBuilder::class("Point").child(x2).build(&mut ast);
    let script_v2 = NodeBuilder::script().child(class_v2).build(&mut ast);
    rebind(&mut session, &ast, script_v2, "a.ts", &mut decls);

    let sym = session.symbols.get(class_sym).unwrap();
    assert!(sym.members.has("x"));
    assert!(!sym.members.has("y"));
}

#[test]
fn rebind_can_change_export_visibility() {
    let mut ast = AstArena::new();
    let class_v1 = NodeBuilder::class("Foo").exported().build(&mut ast);
    let module_v1 = NodeBuilder::module("M").child(class_v1).build(&mut ast);
    let script_v1 = NodeBuilder::script().child(module_v1).build(&mut ast);

    let mut decls = DeclArena::new();
    let (mut session, _) = bind_first(&ast, script_v1, "a.ts", &mut decls);
    let m = global(&session, "M");
    assert!(session.symbols.get(m).unwrap().members.has("Foo"));

    // The edit drops the export modifier; the symbol moves to the
    // contained table because the old public entry is swept and the new
    // declaration binds as unexported.
    let class_v2 = NodeBuilder::class("Foo").build(&mut ast);
    let module_v2 = NodeBuilder::module("M").child(class_v2).build(&mut ast);
    let script_v2 = NodeBuilder::script().child(module_v2).build(&mut ast);
    rebind(&mut session, &ast, script_v2, "a.ts", &mut decls);

    let m_sym = session.symbols.get(m).unwrap();
    assert!(!m_sym.members.has("Foo"));
    assert!(m_sym.contained.has("Foo"));
}

#[test]
fn swept_symbols_do_not_fail_validation() {
    let mut ast = AstArena::new();
    let method = NodeBuilder::function("go").build(&mut ast);
    let class_v1 = NodeBuilder::class("Keep").child(method).build(&mut ast);
    let gone = NodeBuilder::class("Drop").build(&mut ast);
    let script_v1 = NodeBuilder::script().child(class_v1).child(gone).build(&mut ast);

    let mut decls = DeclArena::new();
    let (mut session, _) = bind_first(&ast, script_v1, "a.ts", &mut decls);
    let dropped = global(&session, "Drop");
    assert!(session.validate().is_empty());

    // The edit deletes class Drop and the method on Keep. Both swept
    // symbols keep their arena slots but must not read as orphans.
    let class_v2 = NodeBuilder::class("Keep").build(&mut ast);
    let script_v2 = NodeBuilder::script().child(class_v2).build(&mut ast);
    rebind(&mut session, &ast, script_v2, "a.ts", &mut decls);

    assert!(!session.globals.has("Drop"));
    assert!(session.symbols.get(dropped).unwrap().is_tombstone());
    assert!(session.validate().is_empty());

    // A second edit over the already-swept graph stays clean too.
    let class_v3 = NodeBuilder::class("Keep").build(&mut ast);
    let script_v3 = NodeBuilder::script().child(class_v3).build(&mut ast);
    rebind(&mut session, &ast, script_v3, "a.ts", &mut decls);
    assert!(session.validate().is_empty());
}

#[test]
fn kind_change_on_rebind_is_not_a_duplicate() {
    let mut ast = AstArena::new();
    let class_v1 = NodeBuilder::class("Thing").build(&mut ast);
    let script_v1 = NodeBuilder::script().child(class_v1).build(&mut ast);

    let mut decls = DeclArena::new();
    let (mut session, _) = bind_first(&ast, script_v1, "a.ts", &mut decls);
    let old = global(&session, "Thing");
    assert_eq!(session.symbols.get(old).unwrap().kind, SymbolKind::Class);

    // The edit turns the class into a variable. The old declaration is
    // stale, so this must bind cleanly as a fresh symbol.
    let var_v2 = NodeBuilder::variable("Thing").build(&mut ast);
    let script_v2 = NodeBuilder::script().child(var_v2).build(&mut ast);
    rebind(&mut session, &ast, script_v2, "a.ts", &mut decls);

    assert!(session.diagnostics.is_empty());
    let new = global(&session, "Thing");
    assert_ne!(new, old);
    assert_eq!(session.symbols.get(new).unwrap().kind, SymbolKind::Variable);
}

#[test]
fn constructor_added_by_rebind_evicts_synthesized_default() {
    let mut ast = AstArena::new();
    let class_v1 = NodeBuilder::class("Foo").build(&mut ast);
    let script_v1 = NodeBuilder::script().child(class_v1).build(&mut ast);

    let mut decls = DeclArena::new();
    let (mut session, _) = bind_first(&ast, script_v1, "a.ts", &mut decls);
    let class_sym = global(&session, "Foo");
    let ctor_type = session.symbols.get(class_sym).unwrap().associated_type;
    let sigs = &session.symbols.get(ctor_type).unwrap().construct_signatures;
    assert_eq!(sigs.len(), 1);
    assert!(session.symbols.get(sigs[0]).unwrap().is_synthesized());

    let ctor = NodeBuilder::constructor().build(&mut ast);
    let class_v2 = NodeBuilder::class("Foo").child(ctor).build(&mut ast);
    let script_v2 = NodeBuilder::script().child(class_v2).build(&mut ast);
    let marker = decls.generation_marker();
    let root_v2 = collect_script(&ast, script_v2, "a.ts", &mut decls);
    session.rebind_script(&decls, root_v2, marker);

    let ctor_type = session.symbols.get(class_sym).unwrap().associated_type;
    let sigs: Vec<_> = session
        .symbols
        .get(ctor_type)
        .unwrap()
        .construct_signatures
        .iter()
        .filter(|&&s| session.symbols.get(s).is_some())
        .copied()
        .collect();
    assert_eq!(sigs.len(), 1);
    assert!(!session.symbols.get(sigs[0]).unwrap().is_synthesized());
    assert_eq!(session.symbols.get(ctor_type).unwrap().kind, SymbolKind::ConstructorType);
}
