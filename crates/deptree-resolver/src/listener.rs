//! Assembles a dependency tree from resolution-listener callbacks.
//!
//! The resolver drives the walk; the listener only reacts. It keeps a stack
//! of the nodes whose children are being processed, an index from artifact
//! identity to the live node for it, and dependency-management values that
//! arrive before the include they belong to.

use std::collections::HashMap;

use deptree_core::artifact::{Artifact, ArtifactKey, ArtifactScope, ConflictId};
use deptree_util::errors::{DepTreeError, DepTreeResult};
use tracing::{debug, trace};

use crate::event::ResolutionEvent;
use crate::node::{DependencyNode, NodeState};

type NodeId = usize;

#[derive(Debug)]
struct NodeRecord {
    artifact: Artifact,
    state: NodeState,
    related_artifact: Option<Artifact>,
    premanaged_version: Option<String>,
    premanaged_scope: Option<ArtifactScope>,
    original_scope: Option<ArtifactScope>,
    failed_update_scope: Option<ArtifactScope>,
    children: Vec<NodeId>,
}

/// Management values captured before the managed artifact is included.
///
/// The resolver rewrites the artifact right after reporting the management,
/// so the original values only exist at that moment.
#[derive(Debug, Default)]
struct PendingManagement {
    /// Id of the replacement artifact the next include must carry.
    managed_by: String,
    version: Option<String>,
    scope: Option<ArtifactScope>,
}

/// Stateful tree assembler for one resolution pass.
#[derive(Debug, Default)]
pub struct ResolutionListener {
    nodes: Vec<NodeRecord>,
    parents: Vec<NodeId>,
    index: HashMap<ArtifactKey, NodeId>,
    pending: HashMap<ConflictId, PendingManagement>,
    current: Option<NodeId>,
    root: Option<NodeId>,
}

impl ResolutionListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a recorded callback.
    pub fn handle(&mut self, event: &ResolutionEvent) -> DepTreeResult<()> {
        match event {
            ResolutionEvent::TestArtifact { artifact } => self.test_artifact(artifact),
            ResolutionEvent::StartChildren { artifact } => self.start_process_children(artifact)?,
            ResolutionEvent::EndChildren { artifact } => self.end_process_children(artifact)?,
            ResolutionEvent::Include { artifact } => self.include_artifact(artifact)?,
            ResolutionEvent::OmitForNearer { omitted, kept } => {
                self.omit_for_nearer(omitted, kept)?
            }
            ResolutionEvent::UpdateScope { artifact, scope } => {
                self.update_scope(artifact, *scope)?
            }
            ResolutionEvent::UpdateScopeCurrentPom { artifact, scope } => {
                self.update_scope_current_pom(artifact, *scope)?
            }
            ResolutionEvent::ManageVersion {
                artifact,
                replacement,
            } => self.manage_artifact_version(artifact, replacement),
            ResolutionEvent::ManageScope {
                artifact,
                replacement,
            } => self.manage_artifact_scope(artifact, replacement),
            ResolutionEvent::OmitForCycle { artifact } => self.omit_for_cycle(artifact)?,
            ResolutionEvent::SelectVersionFromRange { artifact } => {
                self.select_version_from_range(artifact)
            }
            ResolutionEvent::RestrictRange {
                artifact,
                replacement,
                range,
            } => self.restrict_range(artifact, replacement, range),
            ResolutionEvent::Failed { artifact, message } => {
                return Err(DepTreeError::Resolution {
                    artifact: artifact.id(),
                    message: message.clone(),
                })
            }
        }
        Ok(())
    }

    pub fn test_artifact(&mut self, artifact: &Artifact) {
        trace!(%artifact, "test artifact");
    }

    pub fn start_process_children(&mut self, artifact: &Artifact) -> DepTreeResult<()> {
        debug!(%artifact, depth = self.parents.len(), "start processing children");
        let current = self.current.ok_or_else(|| {
            DepTreeError::protocol(format!(
                "cannot process children of {artifact}: no current node"
            ))
        })?;
        let expected = &self.nodes[current].artifact;
        if !expected.same_key(artifact) {
            return Err(DepTreeError::protocol(format!(
                "artifact was expected to be {expected} but was {artifact}"
            )));
        }
        self.parents.push(current);
        Ok(())
    }

    pub fn end_process_children(&mut self, artifact: &Artifact) -> DepTreeResult<()> {
        debug!(%artifact, depth = self.parents.len(), "end processing children");
        let parent = self.parents.pop().ok_or_else(|| {
            DepTreeError::protocol(format!(
                "end of children for {artifact} without a matching start"
            ))
        })?;
        let expected = &self.nodes[parent].artifact;
        if !expected.same_key(artifact) {
            return Err(DepTreeError::protocol(format!(
                "parent node artifact was expected to be {expected} but was {artifact}"
            )));
        }
        Ok(())
    }

    pub fn include_artifact(&mut self, artifact: &Artifact) -> DepTreeResult<()> {
        debug!(%artifact, depth = self.parents.len(), "include artifact");
        // omitForNearer may already have registered the kept artifact
        if self.index.contains_key(&artifact.key()) || !self.is_current_node_included() {
            return Ok(());
        }
        let id = self.add_node(artifact, NodeState::Included, None)?;
        if let Some(pending) = self.pending.remove(&artifact.conflict_id()) {
            let id_str = artifact.id();
            if pending.managed_by != id_str {
                return Err(DepTreeError::protocol(format!(
                    "dependency management recorded for {} but {id_str} was included",
                    pending.managed_by
                )));
            }
            self.apply_management(id, pending);
        }
        Ok(())
    }

    pub fn omit_for_nearer(&mut self, omitted: &Artifact, kept: &Artifact) -> DepTreeResult<()> {
        debug!(%omitted, %kept, depth = self.parents.len(), "omit for nearer");
        if omitted.conflict_id() != kept.conflict_id() {
            return Err(DepTreeError::protocol(format!(
                "omitted artifact dependency conflict id {} differs from kept artifact dependency conflict id {}",
                omitted.conflict_id(),
                kept.conflict_id()
            )));
        }
        if !self.is_current_node_included() {
            return Ok(());
        }

        let state = if omitted.version == kept.version {
            NodeState::OmittedForDuplicate
        } else {
            NodeState::OmittedForConflict
        };
        let omitted_id = match self.index.remove(&omitted.key()) {
            Some(id) => {
                if self.parents.contains(&id) {
                    return Err(DepTreeError::protocol(format!(
                        "cannot omit {omitted} while its children are being processed"
                    )));
                }
                self.detach_children(id);
                let record = &mut self.nodes[id];
                record.state = state;
                record.related_artifact = Some(kept.clone());
                id
            }
            None => self.create_node(omitted, state, Some(kept.clone()))?,
        };
        self.current = Some(omitted_id);

        let conflict_id = omitted.conflict_id();
        let managed_here = self
            .pending
            .get(&conflict_id)
            .is_some_and(|p| p.managed_by == omitted.id());
        if managed_here {
            if let Some(pending) = self.pending.remove(&conflict_id) {
                self.apply_management(omitted_id, pending);
            }
        }

        if !self.index.contains_key(&kept.key()) {
            self.add_node(kept, NodeState::Included, None)?;
        }
        Ok(())
    }

    pub fn update_scope(&mut self, artifact: &Artifact, new_scope: ArtifactScope) -> DepTreeResult<()> {
        debug!(%artifact, %new_scope, "update scope");
        let id = self.live_node(artifact)?;
        let record = &mut self.nodes[id];
        record.original_scope = artifact.scope;
        record.artifact.scope = Some(new_scope);
        Ok(())
    }

    pub fn update_scope_current_pom(
        &mut self,
        artifact: &Artifact,
        ignored_scope: ArtifactScope,
    ) -> DepTreeResult<()> {
        debug!(%artifact, %ignored_scope, "scope update ignored by current pom");
        let id = self.live_node(artifact)?;
        self.nodes[id].failed_update_scope = Some(ignored_scope);
        Ok(())
    }

    pub fn manage_artifact_version(&mut self, artifact: &Artifact, replacement: &Artifact) {
        debug!(%artifact, %replacement, "manage version");
        // the resolver reports again once the artifact has been rewritten
        if !self.is_current_node_included() || artifact.version == replacement.version {
            return;
        }
        let pending = self.pending_for(artifact, replacement);
        if pending.version.is_none() {
            pending.version = Some(artifact.version.clone());
        }
    }

    pub fn manage_artifact_scope(&mut self, artifact: &Artifact, replacement: &Artifact) {
        debug!(%artifact, %replacement, "manage scope");
        if !self.is_current_node_included() || artifact.scope == replacement.scope {
            return;
        }
        let Some(scope) = artifact.scope else {
            return;
        };
        let pending = self.pending_for(artifact, replacement);
        if pending.scope.is_none() {
            pending.scope = Some(scope);
        }
    }

    pub fn omit_for_cycle(&mut self, artifact: &Artifact) -> DepTreeResult<()> {
        debug!(%artifact, depth = self.parents.len(), "omit for cycle");
        if self.is_current_node_included() {
            self.create_node(artifact, NodeState::OmittedForCycle, None)?;
        }
        Ok(())
    }

    pub fn select_version_from_range(&mut self, artifact: &Artifact) {
        trace!(%artifact, "select version from range");
    }

    pub fn restrict_range(&mut self, artifact: &Artifact, replacement: &Artifact, new_range: &str) {
        trace!(%artifact, %replacement, new_range, "restrict range");
    }

    /// Number of nodes created so far, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// A frozen copy of the tree assembled so far.
    pub fn root_node(&self) -> Option<DependencyNode> {
        self.root.map(|root| self.freeze(root, 0))
    }

    /// The assembled tree, moving node data out of the listener.
    pub fn into_root_node(self) -> Option<DependencyNode> {
        let root = self.root?;
        let mut records: Vec<Option<NodeRecord>> = self.nodes.into_iter().map(Some).collect();
        Self::take_subtree(&mut records, root, 0)
    }

    /// Every record has at most one parent, so each is taken exactly once.
    fn take_subtree(
        records: &mut [Option<NodeRecord>],
        id: NodeId,
        depth: usize,
    ) -> Option<DependencyNode> {
        let record = records.get_mut(id)?.take()?;
        let children = record
            .children
            .iter()
            .filter_map(|&child| Self::take_subtree(records, child, depth + 1))
            .collect();
        Some(DependencyNode {
            artifact: record.artifact,
            state: record.state,
            related_artifact: record.related_artifact,
            premanaged_version: record.premanaged_version,
            premanaged_scope: record.premanaged_scope,
            original_scope: record.original_scope,
            failed_update_scope: record.failed_update_scope,
            depth,
            children,
        })
    }

    fn freeze(&self, id: NodeId, depth: usize) -> DependencyNode {
        let record = &self.nodes[id];
        DependencyNode {
            artifact: record.artifact.clone(),
            state: record.state,
            related_artifact: record.related_artifact.clone(),
            premanaged_version: record.premanaged_version.clone(),
            premanaged_scope: record.premanaged_scope,
            original_scope: record.original_scope,
            failed_update_scope: record.failed_update_scope,
            depth,
            children: record
                .children
                .iter()
                .map(|&child| self.freeze(child, depth + 1))
                .collect(),
        }
    }

    /// Whether every node whose children are being processed is included.
    fn is_current_node_included(&self) -> bool {
        self.parents
            .iter()
            .all(|&id| self.nodes[id].state.is_included())
    }

    fn live_node(&self, artifact: &Artifact) -> DepTreeResult<NodeId> {
        self.index.get(&artifact.key()).copied().ok_or_else(|| {
            DepTreeError::protocol(format!("cannot find dependency node for artifact {artifact}"))
        })
    }

    fn pending_for(&mut self, artifact: &Artifact, replacement: &Artifact) -> &mut PendingManagement {
        let pending = self.pending.entry(artifact.conflict_id()).or_default();
        pending.managed_by = replacement.id();
        pending
    }

    fn apply_management(&mut self, id: NodeId, pending: PendingManagement) {
        let record = &mut self.nodes[id];
        if pending.version.is_some() {
            record.premanaged_version = pending.version;
        }
        if pending.scope.is_some() {
            record.premanaged_scope = pending.scope;
        }
    }

    /// Create a node under the current parent, or as the root.
    fn create_node(
        &mut self,
        artifact: &Artifact,
        state: NodeState,
        related_artifact: Option<Artifact>,
    ) -> DepTreeResult<NodeId> {
        let id = self.nodes.len();
        match self.parents.last() {
            Some(&parent) => self.nodes[parent].children.push(id),
            None => match self.root {
                None => self.root = Some(id),
                Some(root) => {
                    return Err(DepTreeError::protocol(format!(
                        "{artifact} has no parent but the tree already has root {}",
                        self.nodes[root].artifact
                    )))
                }
            },
        }
        self.nodes.push(NodeRecord {
            artifact: artifact.clone(),
            state,
            related_artifact,
            premanaged_version: None,
            premanaged_scope: None,
            original_scope: None,
            failed_update_scope: None,
            children: Vec::new(),
        });
        Ok(id)
    }

    /// Create a node, register it as the live node for its artifact and make
    /// it current.
    fn add_node(
        &mut self,
        artifact: &Artifact,
        state: NodeState,
        related_artifact: Option<Artifact>,
    ) -> DepTreeResult<NodeId> {
        let key = artifact.key();
        if self.index.contains_key(&key) {
            return Err(DepTreeError::protocol(format!(
                "duplicate node registered for artifact {artifact}"
            )));
        }
        let id = self.create_node(artifact, state, related_artifact)?;
        self.index.insert(key, id);
        self.current = Some(id);
        Ok(id)
    }

    /// Drop a node's children, unregistering the detached subtree.
    fn detach_children(&mut self, id: NodeId) {
        let mut stack = std::mem::take(&mut self.nodes[id].children);
        while let Some(child) = stack.pop() {
            let key = self.nodes[child].artifact.key();
            if self.index.get(&key) == Some(&child) {
                self.index.remove(&key);
            }
            stack.extend(self.nodes[child].children.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: &str, version: &str) -> Artifact {
        Artifact::new("test", id, version).with_scope(ArtifactScope::Compile)
    }

    fn root_of(listener: &ResolutionListener) -> DependencyNode {
        listener.root_node().unwrap()
    }

    /// Listener with project `p` included and its children open.
    fn with_project() -> (ResolutionListener, Artifact) {
        let mut listener = ResolutionListener::new();
        let project = artifact("p", "1.0");
        listener.include_artifact(&project).unwrap();
        listener.start_process_children(&project).unwrap();
        (listener, project)
    }

    #[test]
    fn single_artifact_becomes_root() {
        let mut listener = ResolutionListener::new();
        let project = artifact("p", "1.0");
        listener.include_artifact(&project).unwrap();
        listener.start_process_children(&project).unwrap();
        listener.end_process_children(&project).unwrap();
        let root = root_of(&listener);
        assert_eq!(root.artifact(), &project);
        assert_eq!(root.state(), NodeState::Included);
        assert!(root.children().is_empty());
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn nested_children() {
        let (mut listener, project) = with_project();
        let a = artifact("a", "1.0");
        let b = artifact("b", "1.0");
        let c = artifact("c", "1.0");
        listener.include_artifact(&a).unwrap();
        listener.start_process_children(&a).unwrap();
        listener.include_artifact(&b).unwrap();
        listener.end_process_children(&a).unwrap();
        listener.include_artifact(&c).unwrap();
        listener.end_process_children(&project).unwrap();

        let expected = "\
test:p:jar:1.0:compile
   test:a:jar:1.0:compile
      test:b:jar:1.0:compile
   test:c:jar:1.0:compile
";
        assert_eq!(root_of(&listener).to_tree_string(), expected);
    }

    #[test]
    fn omitted_duplicate_then_include() {
        let (mut listener, project) = with_project();
        let x = artifact("x", "1.0");
        let y = artifact("x", "1.0");
        listener.include_artifact(&x).unwrap();
        listener.omit_for_nearer(&x, &y).unwrap();
        listener.include_artifact(&y).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        assert_eq!(root.children().len(), 2);
        let omitted = &root.children()[0];
        assert_eq!(omitted.state(), NodeState::OmittedForDuplicate);
        assert_eq!(omitted.related_artifact(), Some(&y));
        assert_eq!(root.children()[1].state(), NodeState::Included);
        assert_eq!(root.children()[1].artifact(), &y);
    }

    #[test]
    fn omitted_conflict_then_include() {
        let (mut listener, project) = with_project();
        let x = artifact("x", "1.0");
        let y = artifact("x", "2.0");
        listener.include_artifact(&x).unwrap();
        listener.omit_for_nearer(&x, &y).unwrap();
        listener.include_artifact(&y).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        assert_eq!(root.children().len(), 2);
        let omitted = &root.children()[0];
        assert_eq!(omitted.state(), NodeState::OmittedForConflict);
        assert_eq!(omitted.related_artifact().unwrap().version, "2.0");
        assert_eq!(
            omitted.to_node_string(),
            "(test:x:jar:1.0:compile - omitted for conflict with 2.0)"
        );
        assert_eq!(root.children()[1].artifact().version, "2.0");
    }

    #[test]
    fn omit_before_include_creates_omitted_node_directly() {
        let (mut listener, project) = with_project();
        let near = artifact("x", "2.0");
        let far = artifact("x", "1.0");
        listener.include_artifact(&near).unwrap();
        listener.omit_for_nearer(&far, &near).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let states: Vec<NodeState> = root.children().iter().map(|n| n.state()).collect();
        assert_eq!(states, vec![NodeState::Included, NodeState::OmittedForConflict]);
        assert_eq!(listener.node_count(), 3);
    }

    #[test]
    fn only_one_included_node_per_identity() {
        let (mut listener, project) = with_project();
        let x1 = artifact("x", "1.0");
        let x2 = artifact("x", "2.0");
        listener.include_artifact(&x1).unwrap();
        listener.omit_for_nearer(&x1, &x2).unwrap();
        listener.include_artifact(&x2).unwrap();
        listener.include_artifact(&x2).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let included = root
            .children()
            .iter()
            .filter(|n| n.state() == NodeState::Included)
            .count();
        assert_eq!(included, 1);
        assert_eq!(root.children().len(), 2);
    }

    #[test]
    fn omission_detaches_children() {
        let (mut listener, project) = with_project();
        let a1 = artifact("a", "1.0");
        let a2 = artifact("a", "2.0");
        let b = artifact("b", "1.0");
        let c = artifact("c", "1.0");
        listener.include_artifact(&a1).unwrap();
        listener.start_process_children(&a1).unwrap();
        listener.include_artifact(&b).unwrap();
        listener.start_process_children(&b).unwrap();
        listener.include_artifact(&c).unwrap();
        listener.end_process_children(&b).unwrap();
        listener.end_process_children(&a1).unwrap();
        listener.omit_for_nearer(&a1, &a2).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let omitted = &root.children()[0];
        assert_eq!(omitted.state(), NodeState::OmittedForConflict);
        assert!(omitted.children().is_empty());
    }

    #[test]
    fn owned_root_matches_frozen_copy() {
        let (mut listener, project) = with_project();
        let a1 = artifact("a", "1.0");
        let a2 = artifact("a", "2.0");
        let b = artifact("b", "1.0");
        let d = artifact("d", "1.0");
        listener.include_artifact(&a1).unwrap();
        listener.start_process_children(&a1).unwrap();
        listener.include_artifact(&b).unwrap();
        listener.end_process_children(&a1).unwrap();
        listener.omit_for_nearer(&a1, &a2).unwrap();
        listener.manage_artifact_version(&artifact("d", "0.5"), &d);
        listener.include_artifact(&d).unwrap();
        listener.start_process_children(&d).unwrap();
        listener.omit_for_cycle(&project).unwrap();
        listener.end_process_children(&d).unwrap();
        listener.end_process_children(&project).unwrap();

        let frozen = root_of(&listener);
        let owned = listener.into_root_node().unwrap();
        assert_eq!(owned, frozen);
        assert_eq!(owned.children().len(), 3);
        assert_eq!(owned.children()[2].premanaged_version(), Some("0.5"));
        assert_eq!(owned.children()[2].children()[0].depth(), 2);
    }

    #[test]
    fn detached_artifacts_can_be_included_again() {
        let (mut listener, project) = with_project();
        let a1 = artifact("a", "1.0");
        let a2 = artifact("a", "2.0");
        let b = artifact("b", "1.0");
        listener.include_artifact(&a1).unwrap();
        listener.start_process_children(&a1).unwrap();
        listener.include_artifact(&b).unwrap();
        listener.end_process_children(&a1).unwrap();
        listener.omit_for_nearer(&a1, &a2).unwrap();
        listener.start_process_children(&a2).unwrap();
        listener.include_artifact(&b).unwrap();
        listener.end_process_children(&a2).unwrap();
        listener.end_process_children(&project).unwrap();

        let expected = "\
test:p:jar:1.0:compile
   (test:a:jar:1.0:compile - omitted for conflict with 2.0)
   test:a:jar:2.0:compile
      test:b:jar:1.0:compile
";
        assert_eq!(root_of(&listener).to_tree_string(), expected);
    }

    #[test]
    fn nothing_is_added_below_an_omitted_parent() {
        let (mut listener, project) = with_project();
        let near = artifact("a", "2.0");
        let far = artifact("a", "1.0");
        let b = artifact("b", "1.0");
        listener.include_artifact(&near).unwrap();
        listener.omit_for_nearer(&far, &near).unwrap();
        listener.start_process_children(&far).unwrap();
        listener.include_artifact(&b).unwrap();
        listener.omit_for_cycle(&b).unwrap();
        listener.end_process_children(&far).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        assert_eq!(root.children().len(), 2);
        assert!(root.children().iter().all(|n| n.children().is_empty()));
    }

    #[test]
    fn omitting_an_open_parent_fails() {
        let (mut listener, _) = with_project();
        let a1 = artifact("a", "1.0");
        listener.include_artifact(&a1).unwrap();
        listener.start_process_children(&a1).unwrap();
        let err = listener
            .omit_for_nearer(&a1, &artifact("a", "2.0"))
            .unwrap_err();
        assert!(matches!(err, DepTreeError::ProtocolViolation { .. }));
    }

    #[test]
    fn omit_for_cycle_adds_leaf() {
        let (mut listener, project) = with_project();
        listener.omit_for_cycle(&project).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        assert_eq!(root.children().len(), 1);
        let cycle = &root.children()[0];
        assert_eq!(cycle.state(), NodeState::OmittedForCycle);
        assert!(cycle.related_artifact().is_none());
        assert!(cycle.children().is_empty());
        assert_eq!(cycle.to_node_string(), "(test:p:jar:1.0:compile - omitted for cycle)");
    }

    #[test]
    fn managed_version_is_applied_on_include() {
        let (mut listener, project) = with_project();
        let original = artifact("a", "1.0");
        let managed = artifact("a", "2.0");
        listener.manage_artifact_version(&original, &managed);
        listener.manage_artifact_version(&managed, &managed);
        listener.include_artifact(&managed).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let node = &root.children()[0];
        assert_eq!(node.premanaged_version(), Some("1.0"));
        assert_eq!(
            node.to_node_string(),
            "test:a:jar:2.0:compile (version managed from 1.0)"
        );
    }

    #[test]
    fn managed_scope_is_applied_on_include() {
        let (mut listener, project) = with_project();
        let original = artifact("a", "1.0").with_scope(ArtifactScope::Test);
        let managed = artifact("a", "1.0");
        listener.manage_artifact_scope(&original, &managed);
        listener.manage_artifact_scope(&managed, &managed);
        listener.include_artifact(&managed).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let node = &root.children()[0];
        assert_eq!(node.premanaged_scope(), Some(ArtifactScope::Test));
        assert!(node.premanaged_version().is_none());
    }

    #[test]
    fn management_is_consumed_once() {
        let (mut listener, project) = with_project();
        let original = artifact("a", "1.0");
        let managed = artifact("a", "2.0");
        let other = artifact("b", "1.0");
        listener.manage_artifact_version(&original, &managed);
        listener.include_artifact(&managed).unwrap();
        listener.start_process_children(&managed).unwrap();
        listener.include_artifact(&other).unwrap();
        listener.end_process_children(&managed).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        assert!(root.children()[0].children()[0].premanaged_version().is_none());
    }

    #[test]
    fn management_below_omitted_parent_is_ignored() {
        let (mut listener, project) = with_project();
        let near = artifact("a", "2.0");
        let far = artifact("a", "1.0");
        listener.include_artifact(&near).unwrap();
        listener.omit_for_nearer(&far, &near).unwrap();
        listener.start_process_children(&far).unwrap();
        listener.manage_artifact_version(&artifact("m", "1.0"), &artifact("m", "2.0"));
        listener.end_process_children(&far).unwrap();
        listener.include_artifact(&artifact("m", "2.0")).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let m = root.children().last().unwrap();
        assert_eq!(m.artifact().artifact_id, "m");
        assert!(m.premanaged_version().is_none());
    }

    #[test]
    fn management_mismatch_is_a_violation() {
        let (mut listener, _) = with_project();
        listener.manage_artifact_version(&artifact("a", "1.0"), &artifact("a", "2.0"));
        let err = listener.include_artifact(&artifact("a", "3.0")).unwrap_err();
        assert!(matches!(err, DepTreeError::ProtocolViolation { .. }));
    }

    #[test]
    fn management_flushed_into_omitted_node() {
        let (mut listener, project) = with_project();
        let near = artifact("a", "2.0");
        listener.include_artifact(&near).unwrap();
        listener.manage_artifact_version(&artifact("a", "1.0"), &near);
        listener.omit_for_nearer(&near, &near).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let omitted = &root.children()[0];
        assert_eq!(omitted.state(), NodeState::OmittedForDuplicate);
        assert_eq!(omitted.premanaged_version(), Some("1.0"));
        assert!(root.children()[1].premanaged_version().is_none());
    }

    #[test]
    fn update_scope_records_original() {
        let (mut listener, project) = with_project();
        let a = artifact("a", "1.0").with_scope(ArtifactScope::Runtime);
        listener.include_artifact(&a).unwrap();
        listener.update_scope(&a, ArtifactScope::Compile).unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let node = &root.children()[0];
        assert_eq!(node.original_scope(), Some(ArtifactScope::Runtime));
        assert_eq!(node.artifact().scope, Some(ArtifactScope::Compile));
        assert_eq!(
            node.to_node_string(),
            "test:a:jar:1.0:compile (scope updated from runtime)"
        );
    }

    #[test]
    fn update_scope_current_pom_records_failed_scope() {
        let (mut listener, project) = with_project();
        let a = artifact("a", "1.0");
        listener.include_artifact(&a).unwrap();
        listener
            .update_scope_current_pom(&a, ArtifactScope::Test)
            .unwrap();
        listener.end_process_children(&project).unwrap();

        let root = root_of(&listener);
        let node = &root.children()[0];
        assert_eq!(node.failed_update_scope(), Some(ArtifactScope::Test));
        assert_eq!(node.artifact().scope, Some(ArtifactScope::Compile));
    }

    #[test]
    fn update_scope_of_unknown_artifact_fails() {
        let (mut listener, _) = with_project();
        let err = listener
            .update_scope(&artifact("nope", "1.0"), ArtifactScope::Test)
            .unwrap_err();
        assert!(err.to_string().contains("cannot find dependency node"), "got: {err}");
        assert!(listener
            .update_scope_current_pom(&artifact("nope", "1.0"), ArtifactScope::Test)
            .is_err());
    }

    #[test]
    fn start_children_of_wrong_artifact_fails() {
        let (mut listener, _) = with_project();
        listener.include_artifact(&artifact("a", "1.0")).unwrap();
        let err = listener
            .start_process_children(&artifact("b", "1.0"))
            .unwrap_err();
        assert!(matches!(err, DepTreeError::ProtocolViolation { .. }));
    }

    #[test]
    fn start_children_without_current_node_fails() {
        let mut listener = ResolutionListener::new();
        assert!(listener.start_process_children(&artifact("a", "1.0")).is_err());
    }

    #[test]
    fn end_children_mismatch_fails() {
        let (mut listener, _) = with_project();
        let err = listener.end_process_children(&artifact("a", "1.0")).unwrap_err();
        assert!(err.to_string().contains("expected to be test:p:jar:1.0:compile"), "got: {err}");
    }

    #[test]
    fn end_children_with_empty_stack_fails() {
        let mut listener = ResolutionListener::new();
        assert!(listener.end_process_children(&artifact("a", "1.0")).is_err());
    }

    #[test]
    fn omit_for_nearer_requires_same_conflict_id() {
        let (mut listener, _) = with_project();
        let err = listener
            .omit_for_nearer(&artifact("a", "1.0"), &artifact("b", "1.0"))
            .unwrap_err();
        assert!(matches!(err, DepTreeError::ProtocolViolation { .. }));
    }

    #[test]
    fn second_root_is_a_violation() {
        let mut listener = ResolutionListener::new();
        listener.include_artifact(&artifact("p", "1.0")).unwrap();
        assert!(listener.include_artifact(&artifact("q", "1.0")).is_err());
    }

    #[test]
    fn scope_changes_keep_identity() {
        let (mut listener, project) = with_project();
        let a = artifact("a", "1.0");
        listener.include_artifact(&a).unwrap();
        listener.update_scope(&a, ArtifactScope::Runtime).unwrap();
        listener
            .start_process_children(&a.clone().with_scope(ArtifactScope::Runtime))
            .unwrap();
        listener.end_process_children(&a).unwrap();
        listener.end_process_children(&project).unwrap();
    }

    #[test]
    fn replays_events() {
        let project = artifact("p", "1.0");
        let a = artifact("a", "1.0");
        let events = vec![
            ResolutionEvent::Include {
                artifact: project.clone(),
            },
            ResolutionEvent::StartChildren {
                artifact: project.clone(),
            },
            ResolutionEvent::TestArtifact {
                artifact: a.clone(),
            },
            ResolutionEvent::Include {
                artifact: a.clone(),
            },
            ResolutionEvent::SelectVersionFromRange {
                artifact: a.clone(),
            },
            ResolutionEvent::EndChildren { artifact: project },
        ];
        let mut listener = ResolutionListener::new();
        for event in &events {
            listener.handle(event).unwrap();
        }
        assert_eq!(root_of(&listener).children().len(), 1);
    }

    #[test]
    fn failed_event_is_a_resolution_error() {
        let mut listener = ResolutionListener::new();
        let err = listener
            .handle(&ResolutionEvent::Failed {
                artifact: artifact("a", "1.0"),
                message: "not found".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, DepTreeError::Resolution { .. }));
    }
}
