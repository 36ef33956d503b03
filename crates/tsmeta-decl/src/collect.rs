//! Declaration collection: syntax tree to declaration tree.
//!
//! Driven by the generic AST walker; the user-data stack carries the
//! enclosing declaration, so each collected declaration attaches to the
//! nearest ancestor that produced one.

use tracing::debug;
use tsmeta_ast::{AstArena, Node, NodeIndex, SyntaxKind, ast_flags, walk_ast};

use crate::decl::{DeclArena, DeclIndex, DeclKind, decl_flags};

/// Collect the declaration tree for one parsed script. Returns the root
/// `Script` declaration.
pub fn collect_script(
    ast: &AstArena,
    root: NodeIndex,
    script_key: &str,
    decls: &mut DeclArena,
) -> DeclIndex {
    let mut script_decl = DeclIndex::NONE;

    walk_ast::<DeclIndex, _>(ast, root, &mut |_, idx, node, cx| {
        let parent = cx.current_data().copied();
        let parent_kind = parent.and_then(|p| decls.get(p)).map(|d| d.kind);
        let kind = classify(node, parent_kind);

        let name = match kind {
            DeclKind::Script => script_key.to_string(),
            _ => node.name_str().to_string(),
        };
        let decl = decls.alloc(
            kind,
            convert_flags(node),
            name,
            script_key,
            idx,
            node.span,
        );
        debug!(kind = ?kind, decl = decl.0, node = idx.0, "collected declaration");

        match parent {
            Some(p) => decls.add_child(p, decl),
            None => script_decl = decl,
        }
        cx.push_data(decl);
    });

    script_decl
}

fn classify(node: &Node, parent: Option<DeclKind>) -> DeclKind {
    let member_context = matches!(
        parent,
        Some(DeclKind::Class | DeclKind::Interface | DeclKind::Enum)
    );
    match node.kind {
        SyntaxKind::Script => DeclKind::Script,
        SyntaxKind::Module => {
            if node.has_flag(ast_flags::DYNAMIC_MODULE) {
                DeclKind::DynamicModule
            } else {
                DeclKind::Module
            }
        }
        SyntaxKind::Import => DeclKind::TypeAlias,
        SyntaxKind::Class => DeclKind::Class,
        SyntaxKind::Interface => DeclKind::Interface,
        SyntaxKind::Enum => DeclKind::Enum,
        SyntaxKind::EnumMember => DeclKind::EnumMember,
        SyntaxKind::Function => {
            if node.has_flag(ast_flags::CONSTRUCTOR) {
                DeclKind::ConstructorMethod
            } else if node.has_flag(ast_flags::GET_ACCESSOR) {
                DeclKind::GetAccessor
            } else if node.has_flag(ast_flags::SET_ACCESSOR) {
                DeclKind::SetAccessor
            } else if node.has_flag(ast_flags::CALL_SIGNATURE) {
                DeclKind::CallSignature
            } else if node.has_flag(ast_flags::CONSTRUCT_SIGNATURE) {
                DeclKind::ConstructSignature
            } else if node.has_flag(ast_flags::INDEX_SIGNATURE) {
                DeclKind::IndexSignature
            } else if member_context {
                DeclKind::Method
            } else {
                DeclKind::Function
            }
        }
        SyntaxKind::Variable => {
            if member_context {
                DeclKind::Property
            } else {
                DeclKind::Variable
            }
        }
        SyntaxKind::Parameter => DeclKind::Parameter,
        SyntaxKind::TypeParameter => DeclKind::TypeParameter,
        SyntaxKind::Catch => DeclKind::CatchBlock,
        SyntaxKind::With => DeclKind::WithBlock,
    }
}

fn convert_flags(node: &Node) -> u32 {
    let mut flags = decl_flags::NONE;
    if node.has_flag(ast_flags::EXPORTED) {
        flags |= decl_flags::EXPORTED;
    }
    if node.has_flag(ast_flags::PRIVATE) {
        flags |= decl_flags::PRIVATE;
    }
    if node.has_flag(ast_flags::STATIC) {
        flags |= decl_flags::STATIC;
    }
    if node.has_flag(ast_flags::OPTIONAL) {
        flags |= decl_flags::OPTIONAL;
    }
    if node.has_flag(ast_flags::AMBIENT) {
        flags |= decl_flags::AMBIENT;
    }
    if node.has_flag(ast_flags::SIGNATURE) {
        flags |= decl_flags::SIGNATURE;
    }
    if node.kind == SyntaxKind::Class && !node.extends.is_empty() {
        flags |= decl_flags::HAS_BASE;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsmeta_ast::NodeBuilder;

    #[test]
    fn collects_nested_containers() {
        let mut ast = AstArena::new();
        let field = NodeBuilder::variable("x").build(&mut ast);
        let method = NodeBuilder::function("go").build(&mut ast);
        let class = NodeBuilder::class("Foo")
            .exported()
            .child(field)
            .child(method)
            .build(&mut ast);
        let module = NodeBuilder::module("M").child(class).build(&mut ast);
        let top_var = NodeBuilder::variable("v").build(&mut ast);
        let script = NodeBuilder::script()
            .child(module)
            .child(top_var)
            .build(&mut ast);

        let mut decls = DeclArena::new();
        let root = collect_script(&ast, script, "a.ts", &mut decls);

        let script_decl = decls.get(root).unwrap();
        assert_eq!(script_decl.kind, DeclKind::Script);
        assert_eq!(script_decl.name, "a.ts");
        assert_eq!(script_decl.children.len(), 2);

        let module_decl = decls.get(script_decl.children[0]).unwrap();
        assert_eq!(module_decl.kind, DeclKind::Module);
        let class_decl = decls.get(module_decl.children[0]).unwrap();
        assert_eq!(class_decl.kind, DeclKind::Class);
        assert!(class_decl.is_exported());

        // Class members classify as property/method, script level as
        // variable/function.
        let member_kinds: Vec<_> = class_decl
            .children
            .iter()
            .map(|&c| decls.get(c).unwrap().kind)
            .collect();
        assert_eq!(member_kinds, vec![DeclKind::Property, DeclKind::Method]);
        let top = decls.get(script_decl.children[1]).unwrap();
        assert_eq!(top.kind, DeclKind::Variable);
    }

    #[test]
    fn constructor_and_accessors_classify_by_flags() {
        let mut ast = AstArena::new();
        let ctor = NodeBuilder::constructor().build(&mut ast);
        let getter = NodeBuilder::getter("value").build(&mut ast);
        let setter = NodeBuilder::setter("value").build(&mut ast);
        let class = NodeBuilder::class("Foo")
            .child(ctor)
            .child(getter)
            .child(setter)
            .build(&mut ast);
        let script = NodeBuilder::script().child(class).build(&mut ast);

        let mut decls = DeclArena::new();
        let root = collect_script(&ast, script, "a.ts", &mut decls);
        let class_decl = decls
            .get(decls.get(root).unwrap().children[0])
            .unwrap()
            .clone();
        let kinds: Vec<_> = class_decl
            .children
            .iter()
            .map(|&c| decls.get(c).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                DeclKind::ConstructorMethod,
                DeclKind::GetAccessor,
                DeclKind::SetAccessor
            ]
        );
    }

    #[test]
    fn type_parameters_attach_to_owner() {
        let mut ast = AstArena::new();
        let tp = NodeBuilder::type_parameter("T").build(&mut ast);
        let class = NodeBuilder::class("Box").type_param(tp).build(&mut ast);
        let script = NodeBuilder::script().child(class).build(&mut ast);

        let mut decls = DeclArena::new();
        let root = collect_script(&ast, script, "a.ts", &mut decls);
        let class_decl = decls.get(decls.get(root).unwrap().children[0]).unwrap();
        assert_eq!(class_decl.type_parameters.len(), 1);
        let tp_decl = decls.get(class_decl.type_parameters[0]).unwrap();
        assert_eq!(tp_decl.kind, DeclKind::TypeParameter);
        assert_eq!(tp_decl.name, "T");
    }

    #[test]
    fn extends_clause_sets_has_base() {
        let mut ast = AstArena::new();
        let derived = NodeBuilder::class("Derived")
            .extends(tsmeta_ast::TypeExpr::named("Base"))
            .build(&mut ast);
        let base = NodeBuilder::class("Base").build(&mut ast);
        let script = NodeBuilder::script().child(base).child(derived).build(&mut ast);

        let mut decls = DeclArena::new();
        let root = collect_script(&ast, script, "a.ts", &mut decls);
        let script_decl = decls.get(root).unwrap();
        let base_decl = decls.get(script_decl.children[0]).unwrap();
        let derived_decl = decls.get(script_decl.children[1]).unwrap();
        assert!(!base_decl.has_flag(decl_flags::HAS_BASE));
        assert!(derived_decl.has_flag(decl_flags::HAS_BASE));
    }
}
