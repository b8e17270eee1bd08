//! Builds the dependency tree of a project from whichever resolver
//! generation is configured.

use deptree_core::artifact::Artifact;
use deptree_core::config::BackendKind;
use deptree_core::filter::ArtifactFilter;
use deptree_util::errors::{DepTreeError, DepTreeResult};
use tracing::{debug, info, warn};

use crate::event::{parse_events, ResolutionEvent};
use crate::graph::ResolvedGraph;
use crate::listener::ResolutionListener;
use crate::node::DependencyNode;

/// What to build a tree for.
#[derive(Clone, Copy)]
pub struct ProjectRequest<'a> {
    pub project: &'a Artifact,
    pub filter: Option<&'a dyn ArtifactFilter>,
    /// Projects built in the same session; their artifacts need not resolve.
    pub reactor_projects: &'a [Artifact],
}

impl<'a> ProjectRequest<'a> {
    pub fn new(project: &'a Artifact) -> Self {
        Self {
            project,
            filter: None,
            reactor_projects: &[],
        }
    }

    pub fn with_filter(mut self, filter: &'a dyn ArtifactFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_reactor_projects(mut self, projects: &'a [Artifact]) -> Self {
        self.reactor_projects = projects;
        self
    }

    /// Whether `artifact` is produced by a project in the reactor.
    pub fn in_reactor(&self, artifact: &Artifact) -> bool {
        self.reactor_projects.iter().any(|p| p.same_key(artifact))
    }
}

/// One generation of dependency resolver.
pub trait ResolutionBackend {
    fn name(&self) -> &'static str;

    /// The artifact the recorded input is rooted at, if any.
    fn project(&self) -> Option<Artifact>;

    fn collect(&self, request: &ProjectRequest<'_>) -> DepTreeResult<DependencyNode>;
}

/// Replays a recorded stream of listener callbacks.
#[derive(Debug, Clone)]
pub struct EventReplayBackend {
    events: Vec<ResolutionEvent>,
}

impl EventReplayBackend {
    pub fn new(events: Vec<ResolutionEvent>) -> Self {
        Self { events }
    }

    pub fn from_json(json: &str) -> DepTreeResult<Self> {
        Ok(Self::new(parse_events(json)?))
    }
}

impl ResolutionBackend for EventReplayBackend {
    fn name(&self) -> &'static str {
        "events"
    }

    fn project(&self) -> Option<Artifact> {
        self.events.iter().find_map(|event| match event {
            ResolutionEvent::Include { artifact } => Some(artifact.clone()),
            _ => None,
        })
    }

    fn collect(&self, request: &ProjectRequest<'_>) -> DepTreeResult<DependencyNode> {
        let mut listener = ResolutionListener::new();
        for event in &self.events {
            if let ResolutionEvent::Failed { artifact, message } = event {
                if request.in_reactor(artifact) {
                    warn!(%artifact, %message, "unresolved artifact provided by the reactor");
                    continue;
                }
            }
            listener.handle(event)?;
        }
        debug!(nodes = listener.node_count(), "replayed resolution events");

        let root = listener.into_root_node().ok_or_else(|| DepTreeError::InvalidInput {
            message: "no artifact was included during resolution".to_string(),
        })?;
        if !root.artifact().same_key(request.project) {
            return Err(DepTreeError::InvalidInput {
                message: format!(
                    "recorded resolution is rooted at {}, not {}",
                    root.artifact().id(),
                    request.project.id()
                ),
            });
        }
        Ok(match request.filter {
            Some(filter) => root.filtered(filter),
            None => root,
        })
    }
}

/// Adapts a graph that was already resolved and mediated.
#[derive(Debug, Clone)]
pub struct ResolvedGraphBackend {
    graph: ResolvedGraph,
}

impl ResolvedGraphBackend {
    pub fn new(graph: ResolvedGraph) -> Self {
        Self { graph }
    }

    pub fn from_json(json: &str) -> DepTreeResult<Self> {
        Ok(Self::new(ResolvedGraph::from_json(json)?))
    }
}

impl ResolutionBackend for ResolvedGraphBackend {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn project(&self) -> Option<Artifact> {
        self.graph.root.map(|idx| self.graph.vertex(idx).artifact.clone())
    }

    fn collect(&self, request: &ProjectRequest<'_>) -> DepTreeResult<DependencyNode> {
        let root = self
            .graph
            .to_dependency_tree(request.filter, request.reactor_projects)?;
        if !root.artifact().same_key(request.project) {
            return Err(DepTreeError::InvalidInput {
                message: format!(
                    "resolved graph is rooted at {}, not {}",
                    root.artifact().id(),
                    request.project.id()
                ),
            });
        }
        Ok(root)
    }
}

/// Entry point for building dependency trees.
pub struct DependencyGraphBuilder {
    backend: Box<dyn ResolutionBackend>,
}

impl DependencyGraphBuilder {
    pub fn new(backend: Box<dyn ResolutionBackend>) -> Self {
        Self { backend }
    }

    /// Pick the backend for `kind` and load its recorded input.
    pub fn from_input(kind: BackendKind, input: &str) -> DepTreeResult<Self> {
        let backend: Box<dyn ResolutionBackend> = match kind {
            BackendKind::Events => Box::new(EventReplayBackend::from_json(input)?),
            BackendKind::Graph => Box::new(ResolvedGraphBackend::from_json(input)?),
        };
        Ok(Self::new(backend))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn recorded_project(&self) -> Option<Artifact> {
        self.backend.project()
    }

    pub fn build_dependency_graph(&self, request: &ProjectRequest<'_>) -> DepTreeResult<DependencyNode> {
        let root = self
            .backend
            .collect(request)
            .map_err(|e| DepTreeError::GraphBuild {
                project: request.project.id(),
                source: Box::new(e),
            })?;
        info!(
            project = %request.project,
            backend = self.backend.name(),
            children = root.children().len(),
            "built dependency tree"
        );
        Ok(root)
    }
}
