//! Reflection building: bound syntax trees to the entity model.
//!
//! Unlike declaration collection this is a direct recursion, not a
//! walker pass: each level knows exactly which child kinds it admits.
//! The bind session supplies merged per-symbol facts (type parameter
//! lists) that a single syntax node cannot see on its own.

use tracing::trace;
use tsmeta_ast::{AstArena, Node, NodeIndex, SyntaxKind, ast_flags};
use tsmeta_binder::BindSession;

use crate::model::{Class, Import, Interface, Method, Module, Parameter, Script, Type, Variable};

/// Build the reflection of one bound script.
pub fn reflect_script(
    ast: &AstArena,
    root: NodeIndex,
    session: &BindSession,
    path: &str,
) -> Script {
    let mut script = Script::new(path);
    let Some(node) = ast.get(root) else {
        return script;
    };
    trace!(path, "reflecting script");
    let scope: Vec<String> = Vec::new();
    for &child in &node.children {
        reflect_into(
            ast,
            child,
            session,
            &scope,
            &mut script.imports,
            &mut script.modules,
            &mut script.classes,
            &mut script.interfaces,
            &mut script.variables,
            &mut script.methods,
        );
    }
    script
}

#[allow(clippy::too_many_arguments)]
fn reflect_into(
    ast: &AstArena,
    idx: NodeIndex,
    session: &BindSession,
    scope: &[String],
    imports: &mut Vec<Import>,
    modules: &mut Vec<Module>,
    classes: &mut Vec<Class>,
    interfaces: &mut Vec<Interface>,
    variables: &mut Vec<Variable>,
    methods: &mut Vec<Method>,
) {
    let Some(node) = ast.get(idx) else {
        return;
    };
    match node.kind {
        SyntaxKind::Import => imports.push(Import {
            name: node.name_str().to_string(),
            target: node.alias_target.clone().unwrap_or_default(),
        }),
        SyntaxKind::Module => modules.push(reflect_module(ast, node, session, scope)),
        SyntaxKind::Class => classes.push(reflect_class(ast, idx, node, session, scope)),
        SyntaxKind::Interface => interfaces.push(reflect_interface(ast, idx, node, session, scope)),
        SyntaxKind::Variable => variables.push(reflect_variable(node, scope)),
        SyntaxKind::Function => methods.push(reflect_method(ast, idx, node, session, scope)),
        // Enums, blocks, and loose parameters have no reflection shape.
        _ => {}
    }
}

fn reflect_module(
    ast: &AstArena,
    node: &Node,
    session: &BindSession,
    scope: &[String],
) -> Module {
    let mut module = Module {
        name: node.name_str().to_string(),
        scope: scope.to_vec(),
        is_dynamic: node.has_flag(ast_flags::DYNAMIC_MODULE),
        ..Default::default()
    };
    let mut inner = scope.to_vec();
    inner.push(module.name.clone());
    for &child in &node.children {
        reflect_into(
            ast,
            child,
            session,
            &inner,
            &mut module.imports,
            &mut module.modules,
            &mut module.classes,
            &mut module.interfaces,
            &mut module.variables,
            &mut module.methods,
        );
    }
    module
}

fn reflect_class(
    ast: &AstArena,
    idx: NodeIndex,
    node: &Node,
    session: &BindSession,
    scope: &[String],
) -> Class {
    let mut class = Class {
        name: node.name_str().to_string(),
        scope: scope.to_vec(),
        type_parameters: symbol_type_parameters(session, idx),
        extends: node.extends.first().map(Type::from_expr),
        implements: node.implements.iter().map(Type::from_expr).collect(),
        ..Default::default()
    };
    // Members record the module path only; class and interface names
    // are not scope segments for type resolution.
    let member_scope = scope.to_vec();
    for &child in &node.children {
        let Some(member) = ast.get(child) else {
            continue;
        };
        match member.kind {
            SyntaxKind::Variable => class.variables.push(reflect_variable(member, &member_scope)),
            SyntaxKind::Function => class
                .methods
                .push(reflect_method(ast, child, member, session, &member_scope)),
            _ => {}
        }
    }
    class
}

fn reflect_interface(
    ast: &AstArena,
    idx: NodeIndex,
    node: &Node,
    session: &BindSession,
    scope: &[String],
) -> Interface {
    let mut iface = Interface {
        name: node.name_str().to_string(),
        scope: scope.to_vec(),
        type_parameters: symbol_type_parameters(session, idx),
        extends: node.extends.iter().map(Type::from_expr).collect(),
        ..Default::default()
    };
    let member_scope = scope.to_vec();
    for &child in &node.children {
        let Some(member) = ast.get(child) else {
            continue;
        };
        match member.kind {
            SyntaxKind::Variable => iface.variables.push(reflect_variable(member, &member_scope)),
            SyntaxKind::Function => iface
                .methods
                .push(reflect_method(ast, child, member, session, &member_scope)),
            _ => {}
        }
    }
    iface
}

fn reflect_method(
    ast: &AstArena,
    idx: NodeIndex,
    node: &Node,
    session: &BindSession,
    scope: &[String],
) -> Method {
    Method {
        name: node.name_str().to_string(),
        scope: scope.to_vec(),
        type_parameters: symbol_type_parameters(session, idx),
        parameters: node
            .parameters
            .iter()
            .filter_map(|&p| ast.get(p))
            .map(reflect_parameter)
            .collect(),
        return_type: node.type_annotation.as_ref().map(Type::from_expr),
        is_static: node.has_flag(ast_flags::STATIC),
        is_private: node.has_flag(ast_flags::PRIVATE),
        is_constructor: node.has_flag(ast_flags::CONSTRUCTOR),
    }
}

fn reflect_parameter(node: &Node) -> Parameter {
    Parameter {
        name: node.name_str().to_string(),
        ty: node.type_annotation.as_ref().map(Type::from_expr),
        optional: node.has_flag(ast_flags::OPTIONAL),
    }
}

fn reflect_variable(node: &Node, scope: &[String]) -> Variable {
    Variable {
        name: node.name_str().to_string(),
        scope: scope.to_vec(),
        ty: node.type_annotation.as_ref().map(Type::from_expr),
        is_static: node.has_flag(ast_flags::STATIC),
        is_private: node.has_flag(ast_flags::PRIVATE),
        is_optional: node.has_flag(ast_flags::OPTIONAL),
    }
}

/// Type parameter names come off the bound symbol, not the node, so a
/// declaration merged across several sites reports the full merged list.
fn symbol_type_parameters(session: &BindSession, idx: NodeIndex) -> Vec<String> {
    session
        .symbol_for_node(idx)
        .and_then(|id| session.symbols.get(id))
        .map(|sym| {
            sym.type_parameters
                .iter()
                .filter_map(|&tp| session.symbols.get(tp))
                .map(|tp| tp.name.clone())
                .collect()
        })
        .unwrap_or_default()
}
