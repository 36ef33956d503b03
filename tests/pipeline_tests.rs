//! Full pipeline: syntax trees in, resolved reflection out.

use tsmeta::{Compilation, NodeBuilder, ResolveOptions, SymbolKind, TypeExpr};

#[test]
fn bind_reflect_resolve_roundtrip() {
    let mut comp = Compilation::new();
    let field = NodeBuilder::variable("name")
        .typed(TypeExpr::named("string"))
        .build(comp.ast_mut());
    let greet = NodeBuilder::function("greet")
        .returns(TypeExpr::named("Greeting"))
        .build(comp.ast_mut());
    let greeter = NodeBuilder::class("Greeter")
        .exported()
        .child(field)
        .child(greet)
        .build(comp.ast_mut());
    let greeting = NodeBuilder::class("Greeting").exported().build(comp.ast_mut());
    let module = NodeBuilder::module("App")
        .child(greeter)
        .child(greeting)
        .build(comp.ast_mut());
    let script = NodeBuilder::script().child(module).build(comp.ast_mut());
    comp.add_script("app.ts", script);

    assert!(comp.diagnostics().is_empty());
    assert!(comp.validate().is_empty());

    let app = comp
        .session()
        .globals
        .get("App")
        .and_then(|id| comp.session().symbols.get(id))
        .unwrap();
    assert_eq!(app.kind, SymbolKind::Container);
    assert!(app.members.has("Greeter"));

    let (scripts, diagnostics) = comp.resolve(ResolveOptions {
        strict_unresolved: false,
    });
    assert!(diagnostics.is_empty());
    let app = &scripts[0].modules[0];
    assert_eq!(app.classes.len(), 2);
    let greet = &app.classes[0].methods[0];
    let ret = greet.return_type.as_ref().unwrap();
    assert!(ret.resolved);
    assert_eq!(ret.qualified_name(), "App.Greeting");
    // Primitive annotation stays unresolved, by the silent-degrade rule.
    let name_ty = app.classes[0].variables[0].ty.as_ref().unwrap();
    assert!(!name_ty.resolved);
    assert_eq!(name_ty.name, "string");
}

#[test]
fn update_script_reuses_symbols_and_refreshes_reflection() {
    let mut comp = Compilation::new();
    let a = NodeBuilder::class("A").build(comp.ast_mut());
    let b = NodeBuilder::class("B").build(comp.ast_mut());
    let script_v1 = NodeBuilder::script().child(a).child(b).build(comp.ast_mut());
    comp.add_script("main.ts", script_v1);

    let a_sym = comp.symbol_for_node(a).unwrap();

    let a2 = NodeBuilder::class("A").build(comp.ast_mut());
    let script_v2 = NodeBuilder::script().child(a2).build(comp.ast_mut());
    assert!(comp.update_script("main.ts", script_v2));

    assert_eq!(comp.symbol_for_node(a2), Some(a_sym));
    assert!(!comp.session().globals.has("B"));
    assert!(comp.validate().is_empty());

    let scripts = comp.reflect();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].classes.len(), 1);
    assert_eq!(scripts[0].classes[0].name, "A");
}

#[test]
fn update_of_unknown_script_is_rejected() {
    let mut comp = Compilation::new();
    let script = NodeBuilder::script().build(comp.ast_mut());
    assert!(!comp.update_script("never-added.ts", script));
}

#[test]
fn binder_diagnostics_surface_through_the_facade() {
    let mut comp = Compilation::new();
    let class = NodeBuilder::class("Thing").span(0, 5).build(comp.ast_mut());
    let var = NodeBuilder::variable("Thing").span(10, 5).build(comp.ast_mut());
    let script = NodeBuilder::script().child(class).child(var).build(comp.ast_mut());
    comp.add_script("dup.ts", script);

    assert_eq!(comp.diagnostics().len(), 1);
    let diag = &comp.diagnostics()[0];
    assert_eq!(diag.code, 2300);
    assert_eq!(diag.file, "dup.ts");
}

#[test]
fn reflection_serializes_to_stable_json() {
    let mut comp = Compilation::new();
    let item = NodeBuilder::class("Item").exported().build(comp.ast_mut());
    let collection = NodeBuilder::class("Collection").exported().build(comp.ast_mut());
    let list = NodeBuilder::class("List")
        .exported()
        .child(
            NodeBuilder::variable("items")
                .typed(TypeExpr::with_args(
                    "Collection",
                    vec![TypeExpr::named("Item")],
                ))
                .build(comp.ast_mut()),
        )
        .build(comp.ast_mut());
    let module = NodeBuilder::module("Store")
        .child(item)
        .child(collection)
        .child(list)
        .build(comp.ast_mut());
    let script = NodeBuilder::script().child(module).build(comp.ast_mut());
    comp.add_script("store.ts", script);

    let (scripts, _) = comp.resolve(ResolveOptions::default());
    let json = serde_json::to_value(&scripts[0]).unwrap();
    assert_eq!(json["path"], "store.ts");
    assert_eq!(json["modules"][0]["name"], "Store");
    let items = &json["modules"][0]["classes"][2]["variables"][0];
    assert_eq!(items["ty"]["args"][0]["name"], "Item");
    assert_eq!(items["ty"]["args"][0]["resolved"], true);
}

#[test]
fn generic_type_parameters_flow_into_reflection() {
    let mut comp = Compilation::new();
    let t = NodeBuilder::type_parameter("T").build(comp.ast_mut());
    let value = NodeBuilder::variable("value")
        .typed(TypeExpr::named("T"))
        .build(comp.ast_mut());
    let boxed = NodeBuilder::class("Boxed")
        .type_param(t)
        .child(value)
        .build(comp.ast_mut());
    let script = NodeBuilder::script().child(boxed).build(comp.ast_mut());
    comp.add_script("box.ts", script);

    let scripts = comp.reflect();
    assert_eq!(scripts[0].classes[0].type_parameters, vec!["T".to_string()]);
}
