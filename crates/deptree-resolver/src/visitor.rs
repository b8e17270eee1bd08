//! Visitors over [`DependencyNode`] trees and the node filters they use.

use deptree_core::filter::ArtifactFilter;

use crate::node::{DependencyNode, NodeState};

/// Callbacks driven by [`DependencyNode::accept`].
///
/// Returning false from `visit` skips the node's children; returning false
/// from `end_visit` stops the parent from visiting further siblings.
pub trait DependencyNodeVisitor<'a> {
    fn visit(&mut self, node: &'a DependencyNode) -> bool;

    fn end_visit(&mut self, node: &'a DependencyNode) -> bool;
}

/// Flattens a tree into its nodes in pre-order.
#[derive(Debug, Default)]
pub struct CollectingVisitor<'a> {
    nodes: Vec<&'a DependencyNode>,
}

impl<'a> CollectingVisitor<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[&'a DependencyNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<&'a DependencyNode> {
        self.nodes
    }
}

impl<'a> DependencyNodeVisitor<'a> for CollectingVisitor<'a> {
    fn visit(&mut self, node: &'a DependencyNode) -> bool {
        self.nodes.push(node);
        true
    }

    fn end_visit(&mut self, _node: &'a DependencyNode) -> bool {
        true
    }
}

/// Decides whether a visitor should be shown a node.
pub trait DependencyNodeFilter {
    fn accept(&self, node: &DependencyNode) -> bool;
}

/// Accepts nodes in any of the given states.
#[derive(Debug, Clone)]
pub struct StateNodeFilter {
    states: Vec<NodeState>,
}

impl StateNodeFilter {
    pub fn new(states: impl IntoIterator<Item = NodeState>) -> Self {
        Self {
            states: states.into_iter().collect(),
        }
    }

    /// Only nodes that made it into the resolved tree.
    pub fn included() -> Self {
        Self::new([NodeState::Included])
    }
}

impl DependencyNodeFilter for StateNodeFilter {
    fn accept(&self, node: &DependencyNode) -> bool {
        self.states.contains(&node.state())
    }
}

/// Accepts nodes whose artifact passes an [`ArtifactFilter`].
pub struct ArtifactNodeFilter<F> {
    filter: F,
}

impl<F: ArtifactFilter> ArtifactNodeFilter<F> {
    pub fn new(filter: F) -> Self {
        Self { filter }
    }
}

impl<F: ArtifactFilter> DependencyNodeFilter for ArtifactNodeFilter<F> {
    fn accept(&self, node: &DependencyNode) -> bool {
        self.filter.include(node.artifact())
    }
}

/// Accepts a node only when every inner filter does.
#[derive(Default)]
pub struct AndNodeFilter {
    filters: Vec<Box<dyn DependencyNodeFilter>>,
}

impl AndNodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl DependencyNodeFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl DependencyNodeFilter for AndNodeFilter {
    fn accept(&self, node: &DependencyNode) -> bool {
        self.filters.iter().all(|f| f.accept(node))
    }
}

/// Accepts the given nodes and every ancestor leading to them.
///
/// Nodes are compared by address, so the targets must come from the tree
/// being visited.
pub struct AncestorOrSelfNodeFilter<'t> {
    targets: Vec<&'t DependencyNode>,
}

impl<'t> AncestorOrSelfNodeFilter<'t> {
    pub fn new(targets: Vec<&'t DependencyNode>) -> Self {
        Self { targets }
    }
}

fn contains_node(haystack: &DependencyNode, needle: &DependencyNode) -> bool {
    std::ptr::eq(haystack, needle)
        || haystack
            .children()
            .iter()
            .any(|child| contains_node(child, needle))
}

impl DependencyNodeFilter for AncestorOrSelfNodeFilter<'_> {
    fn accept(&self, node: &DependencyNode) -> bool {
        self.targets.iter().any(|target| contains_node(node, target))
    }
}

/// Forwards to `delegate` only the nodes accepted by `filter`.
///
/// Rejected nodes are still descended into.
pub struct FilteringVisitor<V, F> {
    delegate: V,
    filter: F,
}

impl<V, F> FilteringVisitor<V, F> {
    pub fn new(delegate: V, filter: F) -> Self {
        Self { delegate, filter }
    }

    pub fn delegate(&self) -> &V {
        &self.delegate
    }

    pub fn into_inner(self) -> V {
        self.delegate
    }
}

impl<'a, V, F> DependencyNodeVisitor<'a> for FilteringVisitor<V, F>
where
    V: DependencyNodeVisitor<'a>,
    F: DependencyNodeFilter,
{
    fn visit(&mut self, node: &'a DependencyNode) -> bool {
        if self.filter.accept(node) {
            self.delegate.visit(node)
        } else {
            true
        }
    }

    fn end_visit(&mut self, node: &'a DependencyNode) -> bool {
        if self.filter.accept(node) {
            self.delegate.end_visit(node)
        } else {
            true
        }
    }
}

/// Rebuilds an owned tree from the nodes it is shown.
///
/// Behind a [`FilteringVisitor`], nodes whose parent was filtered out are
/// attached to their nearest shown ancestor.
#[derive(Debug, Default)]
pub struct BuildingVisitor {
    stack: Vec<DependencyNode>,
    root: Option<DependencyNode>,
}

impl BuildingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&DependencyNode> {
        self.root.as_ref()
    }

    pub fn into_root(self) -> Option<DependencyNode> {
        self.root
    }
}

impl<'a> DependencyNodeVisitor<'a> for BuildingVisitor {
    fn visit(&mut self, node: &'a DependencyNode) -> bool {
        self.stack.push(node.shallow_clone());
        true
    }

    fn end_visit(&mut self, _node: &'a DependencyNode) -> bool {
        if let Some(built) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.push_child(built),
                None => self.root = Some(built),
            }
        }
        true
    }
}
