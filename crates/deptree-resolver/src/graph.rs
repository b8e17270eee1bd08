//! Resolved dependency graphs and their translation into trees.
//!
//! A resolver that performs conflict resolution itself hands back a graph
//! in which losing vertices point at the winning artifact. This module holds
//! such graphs and maps them onto [`DependencyNode`] trees.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use deptree_core::artifact::{Artifact, ArtifactKey, ArtifactScope};
use deptree_core::filter::ArtifactFilter;
use deptree_util::errors::{DepTreeError, DepTreeResult};

use crate::node::DependencyNode;

/// A vertex of a resolved dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVertex {
    pub artifact: Artifact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premanaged_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premanaged_scope: Option<ArtifactScope>,
    /// The artifact conflict resolution picked instead of this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Artifact>,
    /// Why the resolver could not resolve this artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ResolvedVertex {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            premanaged_version: None,
            premanaged_scope: None,
            winner: None,
            failure: None,
        }
    }
}

/// Edge label in the dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepEdge {
    /// Scope the dependency is declared with, overriding the vertex's own.
    #[serde(default)]
    pub scope: Option<ArtifactScope>,
    #[serde(default)]
    pub optional: bool,
}

/// Serialized form of a [`ResolvedGraph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub root: usize,
    pub vertices: Vec<ResolvedVertex>,
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDocument {
    pub from: usize,
    pub to: usize,
    #[serde(flatten)]
    pub edge: DepEdge,
}

/// A resolved dependency graph backed by petgraph.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    graph: DiGraph<ResolvedVertex, DepEdge>,
    pub root: Option<NodeIndex>,
}

impl ResolvedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: ResolvedVertex) -> NodeIndex {
        self.graph.add_node(vertex)
    }

    /// Set the root vertex of the graph (the project itself).
    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    /// Add a dependency edge from `from` to `to`; repeated edges are ignored.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: DepEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub fn vertex(&self, idx: NodeIndex) -> &ResolvedVertex {
        &self.graph[idx]
    }

    /// Direct dependencies of a vertex, in the order they were added.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &DepEdge)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target(), e.weight()))
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges
            .into_iter()
            .map(|(_, target, weight)| (target, weight))
            .collect()
    }

    /// Number of vertices (excluding root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_document(doc: GraphDocument) -> DepTreeResult<Self> {
        let mut graph = Self::new();
        let indices: Vec<NodeIndex> = doc
            .vertices
            .into_iter()
            .map(|v| graph.add_vertex(v))
            .collect();
        let lookup = |i: usize| {
            indices.get(i).copied().ok_or_else(|| DepTreeError::InvalidInput {
                message: format!("graph refers to missing vertex {i}"),
            })
        };
        graph.set_root(lookup(doc.root)?);
        for edge in doc.edges {
            graph.add_edge(lookup(edge.from)?, lookup(edge.to)?, edge.edge);
        }
        Ok(graph)
    }

    pub fn from_json(json: &str) -> DepTreeResult<Self> {
        let doc: GraphDocument =
            serde_json::from_str(json).map_err(|e| DepTreeError::InvalidInput {
                message: format!("malformed dependency graph: {e}"),
            })?;
        Self::from_document(doc)
    }

    /// Translate the graph into a tree rooted at the root vertex.
    ///
    /// Losing vertices become duplicate or conflict leaves, revisiting an
    /// ancestor becomes a cycle leaf, and children rejected by `filter` are
    /// pruned. Each artifact is expanded once; later visits become duplicate
    /// leaves pointing at the expanded one. A failed vertex aborts the
    /// translation unless it is one of the `reactor` projects.
    pub fn to_dependency_tree(
        &self,
        filter: Option<&dyn ArtifactFilter>,
        reactor: &[Artifact],
    ) -> DepTreeResult<DependencyNode> {
        let root = self.root.ok_or_else(|| DepTreeError::InvalidInput {
            message: "dependency graph has no root".to_string(),
        })?;
        let mut translator = Translator {
            graph: self,
            filter,
            reactor,
            path: HashSet::new(),
            expanded: HashMap::new(),
        };
        translator.translate(root, self.vertex(root).artifact.clone())
    }
}

struct Translator<'g> {
    graph: &'g ResolvedGraph,
    filter: Option<&'g dyn ArtifactFilter>,
    reactor: &'g [Artifact],
    /// Vertices between the root and the one being translated.
    path: HashSet<NodeIndex>,
    /// Artifacts already expanded somewhere in the tree.
    expanded: HashMap<ArtifactKey, Artifact>,
}

impl Translator<'_> {
    fn translate(&mut self, idx: NodeIndex, artifact: Artifact) -> DepTreeResult<DependencyNode> {
        let graph = self.graph;
        let vertex = graph.vertex(idx);
        if let Some(ref message) = vertex.failure {
            if self.reactor.iter().any(|p| p.same_key(&artifact)) {
                tracing::warn!(%artifact, "unresolved artifact provided by the reactor");
            } else {
                return Err(DepTreeError::Resolution {
                    artifact: artifact.id(),
                    message: message.clone(),
                });
            }
        }

        let kept = match vertex.winner {
            Some(ref winner) if self.path.is_empty() => {
                tracing::debug!(%artifact, %winner, "ignoring conflict winner on the root");
                None
            }
            Some(ref winner) => Some(winner.clone()),
            None => self.expanded.get(&artifact.key()).cloned(),
        };
        let mut node = match kept {
            Some(kept) => DependencyNode::omitted_for_nearer(artifact, kept),
            None => DependencyNode::new(artifact),
        };
        node.premanaged_version = vertex.premanaged_version.clone();
        node.premanaged_scope = vertex.premanaged_scope;
        if !node.state().is_included() {
            return Ok(node);
        }

        self.expanded
            .insert(node.artifact().key(), node.artifact().clone());
        self.path.insert(idx);
        for (child, edge) in graph.dependencies_of(idx) {
            let mut child_artifact = graph.vertex(child).artifact.clone();
            if let Some(scope) = edge.scope {
                child_artifact.scope = Some(scope);
            }
            if edge.optional {
                child_artifact.optional = true;
            }
            if let Some(filter) = self.filter {
                if !filter.include(&child_artifact) {
                    continue;
                }
            }
            if self.path.contains(&child) {
                node.push_child(DependencyNode::omitted_for_cycle(child_artifact));
                continue;
            }
            let translated = self.translate(child, child_artifact)?;
            node.push_child(translated);
        }
        self.path.remove(&idx);
        Ok(node)
    }
}
