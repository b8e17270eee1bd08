//! Version conflict reporting over finished dependency trees.

use std::fmt;

use crate::node::{DependencyNode, NodeState};
use crate::visitor::{CollectingVisitor, FilteringVisitor, StateNodeFilter};

/// All version conflicts recorded in a dependency tree.
#[derive(Debug, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// An artifact that lost to a different version of itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub conflict_id: String,
    pub requested: String,
    pub resolved: String,
    /// Depth of the omitted node in the tree.
    pub depth: usize,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every node omitted for conflict, in pre-order.
    pub fn from_tree(root: &DependencyNode) -> Self {
        let filter = StateNodeFilter::new([NodeState::OmittedForConflict]);
        let mut visitor = FilteringVisitor::new(CollectingVisitor::new(), filter);
        root.accept(&mut visitor);

        let mut report = Self::new();
        for node in visitor.into_inner().into_nodes() {
            let Some(kept) = node.related_artifact() else {
                continue;
            };
            report.add(VersionConflict {
                conflict_id: node.artifact().conflict_id().to_string(),
                requested: node.artifact().version.clone(),
                resolved: kept.version.clone(),
                depth: node.depth(),
            });
        }
        tracing::debug!(conflicts = report.len(), "collected version conflicts");
        report
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested {} but resolved {} (depth {})",
            self.conflict_id, self.requested, self.resolved, self.depth
        )
    }
}
