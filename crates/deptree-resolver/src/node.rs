//! The dependency tree node shared by every resolver back-end.

use std::fmt;

use deptree_core::artifact::{Artifact, ArtifactScope};
use deptree_core::filter::ArtifactFilter;
use deptree_util::errors::{DepTreeError, DepTreeResult};
use serde::{Deserialize, Serialize};

use crate::visitor::DependencyNodeVisitor;

/// Indentation unit of the legacy tree rendering.
const LEGACY_INDENT: &str = "   ";

/// Outcome of one artifact visit during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeState {
    Included,
    OmittedForDuplicate,
    OmittedForConflict,
    OmittedForCycle,
}

impl NodeState {
    pub fn is_included(&self) -> bool {
        matches!(self, Self::Included)
    }
}

/// One visitation of an artifact during resolution.
///
/// Omitted nodes are always leaves. Nodes are assembled by a
/// [`ResolutionListener`](crate::listener::ResolutionListener) or a graph
/// adapter and are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub(crate) artifact: Artifact,
    pub(crate) state: NodeState,
    pub(crate) related_artifact: Option<Artifact>,
    pub(crate) premanaged_version: Option<String>,
    pub(crate) premanaged_scope: Option<ArtifactScope>,
    pub(crate) original_scope: Option<ArtifactScope>,
    pub(crate) failed_update_scope: Option<ArtifactScope>,
    pub(crate) depth: usize,
    pub(crate) children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// An included node with no children.
    pub fn new(artifact: Artifact) -> Self {
        Self::with_state(artifact, NodeState::Included, None)
    }

    /// A node omitted in favour of `kept`: a duplicate when both share a
    /// version, a conflict otherwise.
    pub fn omitted_for_nearer(artifact: Artifact, kept: Artifact) -> Self {
        let state = if artifact.version == kept.version {
            NodeState::OmittedForDuplicate
        } else {
            NodeState::OmittedForConflict
        };
        Self::with_state(artifact, state, Some(kept))
    }

    /// A node omitted because it revisits one of its own ancestors.
    pub fn omitted_for_cycle(artifact: Artifact) -> Self {
        Self::with_state(artifact, NodeState::OmittedForCycle, None)
    }

    pub(crate) fn with_state(
        artifact: Artifact,
        state: NodeState,
        related_artifact: Option<Artifact>,
    ) -> Self {
        Self {
            artifact,
            state,
            related_artifact,
            premanaged_version: None,
            premanaged_scope: None,
            original_scope: None,
            failed_update_scope: None,
            depth: 0,
            children: Vec::new(),
        }
    }

    pub fn with_premanaged_version(mut self, version: impl Into<String>) -> Self {
        self.premanaged_version = Some(version.into());
        self
    }

    pub fn with_premanaged_scope(mut self, scope: ArtifactScope) -> Self {
        self.premanaged_scope = Some(scope);
        self
    }

    pub fn with_original_scope(mut self, scope: ArtifactScope) -> Self {
        self.original_scope = Some(scope);
        self
    }

    pub fn with_failed_update_scope(mut self, scope: ArtifactScope) -> Self {
        self.failed_update_scope = Some(scope);
        self
    }

    /// Append a child; only included nodes may have children.
    pub fn add_child(&mut self, child: DependencyNode) -> DepTreeResult<()> {
        if !self.state.is_included() {
            return Err(DepTreeError::protocol(format!(
                "cannot add child {} to omitted node {}",
                child.artifact, self.artifact
            )));
        }
        self.push_child(child);
        Ok(())
    }

    pub(crate) fn push_child(&mut self, mut child: DependencyNode) {
        child.set_depth(self.depth + 1);
        self.children.push(child);
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.set_depth(depth + 1);
        }
    }

    /// A copy of this node without its children.
    pub(crate) fn shallow_clone(&self) -> Self {
        Self {
            artifact: self.artifact.clone(),
            state: self.state,
            related_artifact: self.related_artifact.clone(),
            premanaged_version: self.premanaged_version.clone(),
            premanaged_scope: self.premanaged_scope,
            original_scope: self.original_scope,
            failed_update_scope: self.failed_update_scope,
            depth: 0,
            children: Vec::new(),
        }
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// The artifact kept instead of this one, for duplicate and conflict
    /// omissions.
    pub fn related_artifact(&self) -> Option<&Artifact> {
        self.related_artifact.as_ref()
    }

    pub fn premanaged_version(&self) -> Option<&str> {
        self.premanaged_version.as_deref()
    }

    pub fn premanaged_scope(&self) -> Option<ArtifactScope> {
        self.premanaged_scope
    }

    pub fn original_scope(&self) -> Option<ArtifactScope> {
        self.original_scope
    }

    pub fn failed_update_scope(&self) -> Option<ArtifactScope> {
        self.failed_update_scope
    }

    /// Distance from the root this node was attached under.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[DependencyNode] {
        &self.children
    }

    /// Pre-order traversal.
    ///
    /// Children are visited only when `visit` returns true, and stop at the
    /// first child whose own traversal returns false. The result of
    /// `end_visit` is returned so the parent can stop as well.
    pub fn accept<'a, V>(&'a self, visitor: &mut V) -> bool
    where
        V: DependencyNodeVisitor<'a> + ?Sized,
    {
        if visitor.visit(self) {
            for child in &self.children {
                if !child.accept(visitor) {
                    break;
                }
            }
        }
        visitor.end_visit(self)
    }

    /// A copy keeping only the children (recursively) whose artifact passes
    /// `filter`. Pruned children vanish together with their subtrees.
    pub fn filtered(&self, filter: &dyn ArtifactFilter) -> DependencyNode {
        let mut copy = self.shallow_clone();
        copy.depth = self.depth;
        for child in &self.children {
            if filter.include(&child.artifact) {
                copy.push_child(child.filtered(filter));
            }
        }
        copy
    }

    /// One-line description of this node.
    ///
    /// Included: `g:a:type:version:scope (annotation; ...)`, then ` (optional)`
    /// for optional dependencies.
    /// Omitted: `(g:a:type:version:scope - annotation; ...; omitted for ...)`.
    pub fn to_node_string(&self) -> String {
        let included = self.state.is_included();
        let mut out = String::new();
        if !included {
            out.push('(');
        }
        out.push_str(&self.artifact.to_string());

        let mut items: Vec<String> = Vec::new();
        if let Some(ref version) = self.premanaged_version {
            items.push(format!("version managed from {version}"));
        }
        if let Some(scope) = self.premanaged_scope {
            items.push(format!("scope managed from {scope}"));
        }
        if let Some(scope) = self.original_scope {
            items.push(format!("scope updated from {scope}"));
        }
        if let Some(scope) = self.failed_update_scope {
            items.push(format!("scope not updated to {scope}"));
        }
        match self.state {
            NodeState::Included => {}
            NodeState::OmittedForDuplicate => items.push("omitted for duplicate".to_string()),
            NodeState::OmittedForConflict => {
                let version = self
                    .related_artifact
                    .as_ref()
                    .map(|a| a.version.as_str())
                    .unwrap_or_default();
                items.push(format!("omitted for conflict with {version}"));
            }
            NodeState::OmittedForCycle => items.push("omitted for cycle".to_string()),
        }

        if !items.is_empty() {
            if included {
                out.push_str(" (");
                out.push_str(&items.join("; "));
                out.push(')');
            } else {
                out.push_str(" - ");
                out.push_str(&items.join("; "));
            }
        }
        if included && self.artifact.optional {
            out.push_str(" (optional)");
        }
        if !included {
            out.push(')');
        }
        out
    }

    /// Legacy rendering: one line per node, three spaces per level below
    /// this node.
    pub fn to_tree_string(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, indent: usize) {
        for _ in 0..indent {
            out.push_str(LEGACY_INDENT);
        }
        out.push_str(&self.to_node_string());
        out.push('\n');
        for child in &self.children {
            child.write_tree(out, indent + 1);
        }
    }
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_node_string())
    }
}
