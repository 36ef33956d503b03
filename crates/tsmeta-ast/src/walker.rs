//! Generic single-pass AST traversal.
//!
//! The walker keeps an explicit ancestor stack and a caller-supplied
//! user-data stack in lockstep. The user-data stack's length is recorded
//! before each node's callback runs and restored once its subtree is
//! done, so a frame pushed for one sibling subtree is gone by the time
//! the next sibling is visited — even when enclosing nodes pushed no
//! frame of their own. The callback runs before the node's children and
//! may push at most one frame to associate with the node's subtree.

use smallvec::SmallVec;
use tracing::trace;

use crate::node::{AstArena, Node, NodeIndex, SyntaxKind};

/// Traversal state handed to the walk callback.
pub struct WalkContext<D> {
    ancestors: SmallVec<[NodeIndex; 16]>,
    data: Vec<D>,
}

impl<D> WalkContext<D> {
    fn new() -> Self {
        Self {
            ancestors: SmallVec::new(),
            data: Vec::new(),
        }
    }

    /// Depth of the node currently being visited (0 for the root).
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn ancestors(&self) -> &[NodeIndex] {
        &self.ancestors
    }

    /// Associate one data frame with the current node's subtree.
    pub fn push_data(&mut self, data: D) {
        self.data.push(data);
    }

    /// The innermost visible frame: the nearest ancestor's frame during a
    /// visit, or the current node's own frame after `push_data`.
    pub fn current_data(&self) -> Option<&D> {
        self.data.last()
    }

    pub fn data(&self) -> &[D] {
        &self.data
    }
}

/// Walk the subtree rooted at `root`, invoking `callback` for every node
/// in a fixed per-kind order (callback first, then children).
pub fn walk_ast<D, F>(arena: &AstArena, root: NodeIndex, callback: &mut F)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    let mut cx = WalkContext::new();
    walk_node(arena, root, callback, &mut cx);
}

fn walk_node<D, F>(arena: &AstArena, idx: NodeIndex, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    let Some(node) = arena.get(idx) else {
        return;
    };

    // Any frame the callback pushes for this node lives exactly as long
    // as its subtree. Ancestor depth is not a usable baseline: an
    // enclosing node that pushed nothing would leave a sibling's frame
    // below it.
    let baseline = cx.data.len();

    trace!(node = idx.0, kind = ?node.kind, depth = cx.depth(), "visit");
    callback(arena, idx, node, cx);
    debug_assert!(
        cx.data.len() <= baseline + 1,
        "callback pushed more than one frame per node"
    );

    cx.ancestors.push(idx);
    match node.kind {
        SyntaxKind::Script => visit_script(arena, node, callback, cx),
        SyntaxKind::Module => visit_module(arena, node, callback, cx),
        SyntaxKind::Import => visit_import(arena, node, callback, cx),
        SyntaxKind::Class => visit_class(arena, node, callback, cx),
        SyntaxKind::Interface => visit_interface(arena, node, callback, cx),
        SyntaxKind::Function => visit_function(arena, node, callback, cx),
        SyntaxKind::Variable => visit_variable(arena, node, callback, cx),
        SyntaxKind::Parameter => visit_parameter(arena, node, callback, cx),
        _ => visit_children(arena, node, callback, cx),
    }
    cx.ancestors.pop();
    cx.data.truncate(baseline);
}

fn visit_children<D, F>(arena: &AstArena, node: &Node, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    for &child in &node.children {
        walk_node(arena, child, callback, cx);
    }
}

fn visit_script<D, F>(arena: &AstArena, node: &Node, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    visit_children(arena, node, callback, cx);
}

fn visit_module<D, F>(arena: &AstArena, node: &Node, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    visit_children(arena, node, callback, cx);
}

fn visit_import<D, F>(_arena: &AstArena, _node: &Node, _callback: &mut F, _cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    // Imports are leaves.
}

fn visit_class<D, F>(arena: &AstArena, node: &Node, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    for &tp in &node.type_parameters {
        walk_node(arena, tp, callback, cx);
    }
    visit_children(arena, node, callback, cx);
}

fn visit_interface<D, F>(arena: &AstArena, node: &Node, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    for &tp in &node.type_parameters {
        walk_node(arena, tp, callback, cx);
    }
    visit_children(arena, node, callback, cx);
}

fn visit_function<D, F>(arena: &AstArena, node: &Node, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    for &tp in &node.type_parameters {
        walk_node(arena, tp, callback, cx);
    }
    for &param in &node.parameters {
        walk_node(arena, param, callback, cx);
    }
    visit_children(arena, node, callback, cx);
}

fn visit_variable<D, F>(arena: &AstArena, node: &Node, callback: &mut F, cx: &mut WalkContext<D>)
where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    visit_children(arena, node, callback, cx);
}

fn visit_parameter<D, F>(
    _arena: &AstArena,
    _node: &Node,
    _callback: &mut F,
    _cx: &mut WalkContext<D>,
) where
    F: FnMut(&AstArena, NodeIndex, &Node, &mut WalkContext<D>),
{
    // Parameters are leaves.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NodeBuilder;

    fn two_sibling_classes() -> (AstArena, NodeIndex) {
        let mut ast = AstArena::new();
        let a_field = NodeBuilder::variable("x").build(&mut ast);
        let a = NodeBuilder::class("A").child(a_field).build(&mut ast);
        let b_field = NodeBuilder::variable("y").build(&mut ast);
        let b = NodeBuilder::class("B").child(b_field).build(&mut ast);
        let script = NodeBuilder::script().child(a).child(b).build(&mut ast);
        (ast, script)
    }

    #[test]
    fn visits_in_document_order() {
        let (ast, script) = two_sibling_classes();
        let mut names = Vec::new();
        walk_ast::<(), _>(&ast, script, &mut |_, _, node, _| {
            names.push(node.name_str().to_string());
        });
        assert_eq!(names, vec!["", "A", "x", "B", "y"]);
    }

    #[test]
    fn sibling_data_does_not_leak() {
        let (ast, script) = two_sibling_classes();
        let mut observed: Vec<(String, Option<String>)> = Vec::new();
        walk_ast::<String, _>(&ast, script, &mut |_, _, node, cx| {
            observed.push((node.name_str().to_string(), cx.current_data().cloned()));
            if node.kind == SyntaxKind::Class {
                cx.push_data(node.name_str().to_string());
            }
        });

        // Class B must not see the frame pushed while visiting class A.
        let b = observed.iter().find(|(n, _)| n == "B").unwrap();
        assert_eq!(b.1, None);
        // Members see their own class's frame.
        let x = observed.iter().find(|(n, _)| n == "x").unwrap();
        assert_eq!(x.1.as_deref(), Some("A"));
        let y = observed.iter().find(|(n, _)| n == "y").unwrap();
        assert_eq!(y.1.as_deref(), Some("B"));
    }

    #[test]
    fn frames_survive_non_pushing_ancestors_without_leaking() {
        // Modules push nothing here; only classes do. A class frame must
        // still end with its own subtree and never reach the class in
        // the next module, even though the frame sits below the depth of
        // the module nodes above it.
        let mut ast = AstArena::new();
        let a_field = NodeBuilder::variable("x").build(&mut ast);
        let a = NodeBuilder::class("A").child(a_field).build(&mut ast);
        let m1 = NodeBuilder::module("M1").child(a).build(&mut ast);
        let b_field = NodeBuilder::variable("y").build(&mut ast);
        let b = NodeBuilder::class("B").child(b_field).build(&mut ast);
        let m2 = NodeBuilder::module("M2").child(b).build(&mut ast);
        let script = NodeBuilder::script().child(m1).child(m2).build(&mut ast);

        let mut observed: Vec<(String, Option<String>)> = Vec::new();
        walk_ast::<String, _>(&ast, script, &mut |_, _, node, cx| {
            observed.push((node.name_str().to_string(), cx.current_data().cloned()));
            if node.kind == SyntaxKind::Class {
                cx.push_data(node.name_str().to_string());
            }
        });

        let at = |name: &str| observed.iter().find(|(n, _)| n == name).unwrap().1.clone();
        assert_eq!(at("x").as_deref(), Some("A"));
        assert_eq!(at("M2"), None);
        assert_eq!(at("B"), None);
        assert_eq!(at("y").as_deref(), Some("B"));
    }

    #[test]
    fn data_depth_tracks_ancestor_depth() {
        let (ast, script) = two_sibling_classes();
        walk_ast::<u32, _>(&ast, script, &mut |_, _, _, cx| {
            assert!(cx.data().len() <= cx.depth());
            cx.push_data(0);
        });
    }

    #[test]
    fn function_children_visit_type_params_then_params() {
        let mut ast = AstArena::new();
        let tp = NodeBuilder::type_parameter("T").build(&mut ast);
        let p = NodeBuilder::parameter("arg").build(&mut ast);
        let f = NodeBuilder::function("f")
            .type_param(tp)
            .param(p)
            .build(&mut ast);
        let script = NodeBuilder::script().child(f).build(&mut ast);

        let mut names = Vec::new();
        walk_ast::<(), _>(&ast, script, &mut |_, _, node, _| {
            names.push(node.name_str().to_string());
        });
        assert_eq!(names, vec!["", "f", "T", "arg"]);
    }
}
