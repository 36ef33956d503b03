//! Two-pass type reference resolution over the reflected entity model.
//!
//! Pass 1 resolves against each script's own module nesting. Pass 2
//! flattens the top-level views of every script into one shared stack
//! and re-resolves, which is what lets a module reopened in a second
//! script see types declared in the first. Resolution mutates `Type`
//! nodes in place and is idempotent; scope views are owned snapshots
//! taken before any mutation starts.

use tracing::{debug, trace};
use tsmeta_common::{Diagnostic, diagnostic_messages};

use crate::model::{Class, Interface, Method, Module, Script, Type, Variable};

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Report a `Cannot find type` diagnostic for every type still
    /// unresolved after both passes, instead of degrading silently.
    pub strict_unresolved: bool,
}

/// Immutable snapshot of one module's resolvable surface.
#[derive(Debug, Clone)]
pub struct ModuleView {
    /// Module name; empty for a script's top level.
    name: String,
    /// Enclosing module path of this module itself.
    scope: Vec<String>,
    /// Class (name, declared scope) pairs, in document order.
    classes: Vec<(String, Vec<String>)>,
    interfaces: Vec<(String, Vec<String>)>,
    children: Vec<ModuleView>,
}

impl ModuleView {
    pub fn of_script(script: &Script) -> Self {
        Self {
            name: String::new(),
            scope: Vec::new(),
            classes: script
                .classes
                .iter()
                .map(|c| (c.name.clone(), c.scope.clone()))
                .collect(),
            interfaces: script
                .interfaces
                .iter()
                .map(|i| (i.name.clone(), i.scope.clone()))
                .collect(),
            children: script.modules.iter().map(Self::of_module).collect(),
        }
    }

    pub fn of_module(module: &Module) -> Self {
        Self {
            name: module.name.clone(),
            scope: module.scope.clone(),
            classes: module
                .classes
                .iter()
                .map(|c| (c.name.clone(), c.scope.clone()))
                .collect(),
            interfaces: module
                .interfaces
                .iter()
                .map(|i| (i.name.clone(), i.scope.clone()))
                .collect(),
            children: module.modules.iter().map(Self::of_module).collect(),
        }
    }

    /// The module's own full scope path (enclosing path plus name).
    fn full_path(&self) -> Vec<&str> {
        let mut path: Vec<&str> = self.scope.iter().map(String::as_str).collect();
        if !self.name.is_empty() {
            path.push(&self.name);
        }
        path
    }

    /// Classes are searched before interfaces; first name match wins.
    fn find(&self, simple: &str) -> Option<Vec<String>> {
        self.classes
            .iter()
            .chain(self.interfaces.iter())
            .find(|(name, _)| name == simple)
            .map(|(_, scope)| scope.clone())
    }
}

fn suffix_matches(full: &[&str], required: &[&str]) -> bool {
    required.len() <= full.len() && full[full.len() - required.len()..] == *required
}

/// Search one view for the simple name: the view itself if its scope
/// path suffix-matches, then (for qualified names only) its child
/// modules transitively, in document order.
fn search_view(view: &ModuleView, required: &[&str], simple: &str) -> Option<Vec<String>> {
    if suffix_matches(&view.full_path(), required) {
        if let Some(scope) = view.find(simple) {
            return Some(scope);
        }
    }
    if !required.is_empty() {
        for child in &view.children {
            if let Some(scope) = search_view(child, required, simple) {
                return Some(scope);
            }
        }
    }
    None
}

/// Resolve one type against a scope stack (outermost first). Idempotent:
/// an already-resolved type is untouched. Returns whether the type is
/// resolved afterwards.
pub fn resolve_type(stack: &[ModuleView], ty: &mut Type) -> bool {
    if ty.resolved {
        return true;
    }
    let mut parts: Vec<&str> = ty.name.split('.').collect();
    let Some(simple) = parts.pop() else {
        return false;
    };
    let required = parts;

    let mut found: Option<(Vec<String>, String)> = None;
    // Innermost enclosing module first.
    for view in stack.iter().rev() {
        if let Some(scope) = search_view(view, &required, simple) {
            found = Some((scope, simple.to_string()));
            break;
        }
    }
    let Some((scope, simple)) = found else {
        return false;
    };
    trace!(name = %ty.name, scope = ?scope, "resolved type");
    ty.scope = scope;
    ty.name = simple;
    ty.resolved = true;
    // Generic arguments resolve against the same original stack, not the
    // matched entity's scope.
    for arg in &mut ty.args {
        resolve_type(stack, arg);
    }
    true
}

/// Run both resolution passes over the scripts, in the order given.
/// Determinism of first-match-wins depends on that order being stable.
pub fn resolve_scripts(scripts: &mut [Script], options: ResolveOptions) -> Vec<Diagnostic> {
    resolve_pass_local(scripts);
    resolve_pass_global(scripts);

    let mut diagnostics = Vec::new();
    if options.strict_unresolved {
        for script in scripts.iter_mut() {
            let path = script.path.clone();
            for_each_type(script, &mut |ty| {
                if !ty.resolved {
                    diagnostics.push(Diagnostic::from_message(
                        &path,
                        0,
                        0,
                        diagnostic_messages::UNRESOLVED_TYPE,
                        &[&ty.name],
                    ));
                }
            });
        }
    }
    diagnostics
}

/// Pass 1: each script resolves against its own module nesting only.
pub fn resolve_pass_local(scripts: &mut [Script]) {
    for script in scripts.iter_mut() {
        debug!(path = %script.path, "local resolution pass");
        let root = ModuleView::of_script(script);
        let mut stack = vec![root.clone()];
        resolve_level(
            &mut script.classes,
            &mut script.interfaces,
            &mut script.variables,
            &mut script.methods,
            &stack,
        );
        walk_modules(&mut script.modules, &root.children, &mut stack);
    }
}

fn walk_modules(modules: &mut [Module], views: &[ModuleView], stack: &mut Vec<ModuleView>) {
    for (module, view) in modules.iter_mut().zip(views.iter()) {
        stack.push(view.clone());
        resolve_level(
            &mut module.classes,
            &mut module.interfaces,
            &mut module.variables,
            &mut module.methods,
            stack,
        );
        walk_modules(&mut module.modules, &view.children, stack);
        stack.pop();
    }
}

/// Pass 2: one flattened stack of every script's top-level view, applied
/// to every type in every script.
pub fn resolve_pass_global(scripts: &mut [Script]) {
    // Each script contributes its top-level surface and each of its
    // top-level modules as a separate stack entry, so unqualified names
    // can match a module reopened in another script.
    let mut global: Vec<ModuleView> = Vec::new();
    for script in scripts.iter() {
        global.push(ModuleView::of_script(script));
        for module in &script.modules {
            global.push(ModuleView::of_module(module));
        }
    }
    // resolve_type walks the stack back to front; reverse so the first
    // supplied script is searched first.
    global.reverse();
    debug!(scripts = scripts.len(), "global resolution pass");
    for script in scripts.iter_mut() {
        for_each_type(script, &mut |ty| {
            resolve_type(&global, ty);
        });
    }
}

/// Apply `f` to every type reference in the script, in document order.
pub fn for_each_type(script: &mut Script, f: &mut impl FnMut(&mut Type)) {
    fn visit_type(ty: &mut Type, f: &mut impl FnMut(&mut Type)) {
        f(ty);
        for arg in &mut ty.args {
            visit_type(arg, f);
        }
    }
    fn visit_variable(v: &mut Variable, f: &mut impl FnMut(&mut Type)) {
        if let Some(ty) = &mut v.ty {
            visit_type(ty, f);
        }
    }
    fn visit_method(m: &mut Method, f: &mut impl FnMut(&mut Type)) {
        for p in &mut m.parameters {
            if let Some(ty) = &mut p.ty {
                visit_type(ty, f);
            }
        }
        if let Some(ty) = &mut m.return_type {
            visit_type(ty, f);
        }
    }
    fn visit_class(c: &mut Class, f: &mut impl FnMut(&mut Type)) {
        if let Some(ty) = &mut c.extends {
            visit_type(ty, f);
        }
        for ty in &mut c.implements {
            visit_type(ty, f);
        }
        for v in &mut c.variables {
            visit_variable(v, f);
        }
        for m in &mut c.methods {
            visit_method(m, f);
        }
    }
    fn visit_interface(i: &mut Interface, f: &mut impl FnMut(&mut Type)) {
        for ty in &mut i.extends {
            visit_type(ty, f);
        }
        for v in &mut i.variables {
            visit_variable(v, f);
        }
        for m in &mut i.methods {
            visit_method(m, f);
        }
    }
    fn visit_module(module: &mut Module, f: &mut impl FnMut(&mut Type)) {
        for c in &mut module.classes {
            visit_class(c, f);
        }
        for i in &mut module.interfaces {
            visit_interface(i, f);
        }
        for v in &mut module.variables {
            visit_variable(v, f);
        }
        for m in &mut module.methods {
            visit_method(m, f);
        }
        for child in &mut module.modules {
            visit_module(child, f);
        }
    }

    for c in &mut script.classes {
        visit_class(c, f);
    }
    for i in &mut script.interfaces {
        visit_interface(i, f);
    }
    for v in &mut script.variables {
        visit_variable(v, f);
    }
    for m in &mut script.methods {
        visit_method(m, f);
    }
    for module in &mut script.modules {
        visit_module(module, f);
    }
}

fn resolve_level(
    classes: &mut [Class],
    interfaces: &mut [Interface],
    variables: &mut [Variable],
    methods: &mut [Method],
    stack: &[ModuleView],
) {
    for class in classes.iter_mut() {
        if let Some(ty) = &mut class.extends {
            resolve_type(stack, ty);
        }
        for ty in &mut class.implements {
            resolve_type(stack, ty);
        }
        for v in &mut class.variables {
            if let Some(ty) = &mut v.ty {
                resolve_type(stack, ty);
            }
        }
        for m in &mut class.methods {
            resolve_method(m, stack);
        }
    }
    for iface in interfaces.iter_mut() {
        for ty in &mut iface.extends {
            resolve_type(stack, ty);
        }
        for v in &mut iface.variables {
            if let Some(ty) = &mut v.ty {
                resolve_type(stack, ty);
            }
        }
        for m in &mut iface.methods {
            resolve_method(m, stack);
        }
    }
    for v in variables.iter_mut() {
        if let Some(ty) = &mut v.ty {
            resolve_type(stack, ty);
        }
    }
    for m in methods.iter_mut() {
        resolve_method(m, stack);
    }
}

fn resolve_method(method: &mut Method, stack: &[ModuleView]) {
    for p in &mut method.parameters {
        if let Some(ty) = &mut p.ty {
            resolve_type(stack, ty);
        }
    }
    if let Some(ty) = &mut method.return_type {
        resolve_type(stack, ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, scope: &[&str]) -> Class {
        Class {
            name: name.into(),
            scope: scope.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn suffix_match_rules() {
        assert!(suffix_matches(&["A", "B"], &["B"]));
        assert!(suffix_matches(&["A", "B"], &["A", "B"]));
        assert!(suffix_matches(&["A", "B"], &[]));
        assert!(!suffix_matches(&["A", "B"], &["A"]));
        assert!(!suffix_matches(&["B"], &["A", "B"]));
    }

    #[test]
    fn unqualified_name_skips_child_modules() {
        let inner = Module {
            name: "B".into(),
            scope: vec!["A".into()],
            classes: vec![class("Foo", &["A", "B"])],
            ..Default::default()
        };
        let outer = Module {
            name: "A".into(),
            modules: vec![inner],
            ..Default::default()
        };
        let view = ModuleView::of_module(&outer);

        let mut unqualified = Type::new("Foo");
        assert!(!resolve_type(std::slice::from_ref(&view), &mut unqualified));

        let mut qualified = Type::new("B.Foo");
        assert!(resolve_type(&[view], &mut qualified));
        assert_eq!(qualified.name, "Foo");
        assert_eq!(qualified.scope, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn classes_shadow_interfaces_of_same_name() {
        let module = Module {
            name: "M".into(),
            classes: vec![class("Thing", &["M"])],
            interfaces: vec![Interface {
                name: "Thing".into(),
                scope: vec!["other".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let view = ModuleView::of_module(&module);
        let mut ty = Type::new("Thing");
        assert!(resolve_type(&[view], &mut ty));
        assert_eq!(ty.scope, vec!["M".to_string()]);
    }

    #[test]
    fn innermost_module_wins() {
        let outer = Module {
            name: "M".into(),
            classes: vec![class("Foo", &["M"])],
            ..Default::default()
        };
        let inner = Module {
            name: "N".into(),
            scope: vec!["M".into()],
            classes: vec![class("Foo", &["M", "N"])],
            ..Default::default()
        };
        let stack = vec![ModuleView::of_module(&outer), ModuleView::of_module(&inner)];
        let mut ty = Type::new("Foo");
        assert!(resolve_type(&stack, &mut ty));
        assert_eq!(ty.scope, vec!["M".to_string(), "N".to_string()]);
    }

    #[test]
    fn generic_arguments_resolve_against_original_stack() {
        let module = Module {
            name: "M".into(),
            classes: vec![class("List", &["M"]), class("Item", &["M"])],
            ..Default::default()
        };
        let view = ModuleView::of_module(&module);
        let mut ty = Type {
            name: "List".into(),
            args: vec![Type::new("Item")],
            ..Type::new("List")
        };
        assert!(resolve_type(&[view], &mut ty));
        assert!(ty.args[0].resolved);
        assert_eq!(ty.args[0].scope, vec!["M".to_string()]);
    }
}
