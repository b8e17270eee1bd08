//! Artifact predicates used to prune dependency trees.

use globset::{Glob, GlobMatcher};

use deptree_util::errors::{DepTreeError, DepTreeResult};

use crate::artifact::{Artifact, ArtifactScope};

/// Decides whether an artifact belongs in a dependency tree.
pub trait ArtifactFilter {
    fn include(&self, artifact: &Artifact) -> bool;
}

impl<F> ArtifactFilter for F
where
    F: Fn(&Artifact) -> bool,
{
    fn include(&self, artifact: &Artifact) -> bool {
        self(artifact)
    }
}

/// Includes the artifacts visible on the classpath of a given scope.
///
/// `compile` sees compile, provided and system artifacts; `runtime` sees
/// compile and runtime; `test` sees everything; `provided` and `system` see
/// only themselves. Artifacts without a scope are included.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    compile: bool,
    provided: bool,
    runtime: bool,
    test: bool,
    system: bool,
}

impl ScopeFilter {
    pub fn new(scope: ArtifactScope) -> Self {
        let mut filter = Self {
            compile: false,
            provided: false,
            runtime: false,
            test: false,
            system: false,
        };
        match scope {
            ArtifactScope::Compile => {
                filter.compile = true;
                filter.provided = true;
                filter.system = true;
            }
            ArtifactScope::Runtime => {
                filter.compile = true;
                filter.runtime = true;
            }
            ArtifactScope::Test => {
                filter.compile = true;
                filter.provided = true;
                filter.runtime = true;
                filter.test = true;
                filter.system = true;
            }
            ArtifactScope::Provided => filter.provided = true,
            ArtifactScope::System => filter.system = true,
            ArtifactScope::Import => {}
        }
        filter
    }
}

impl ArtifactFilter for ScopeFilter {
    fn include(&self, artifact: &Artifact) -> bool {
        match artifact.scope {
            None => true,
            Some(ArtifactScope::Compile) => self.compile,
            Some(ArtifactScope::Provided) => self.provided,
            Some(ArtifactScope::Runtime) => self.runtime,
            Some(ArtifactScope::Test) => self.test,
            Some(ArtifactScope::System) => self.system,
            Some(ArtifactScope::Import) => false,
        }
    }
}

/// One `groupId[:artifactId[:type[:version]]]` pattern.
///
/// Each segment is a glob; missing trailing segments match anything.
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
    raw: String,
    segments: Vec<GlobMatcher>,
}

impl ArtifactPattern {
    pub fn parse(pattern: &str) -> DepTreeResult<Self> {
        let parts: Vec<&str> = pattern.split(':').collect();
        if pattern.is_empty() || parts.len() > 4 {
            return Err(DepTreeError::InvalidInput {
                message: format!(
                    "invalid artifact pattern '{pattern}', expected groupId[:artifactId[:type[:version]]]"
                ),
            });
        }
        let segments = parts
            .iter()
            .map(|part| {
                let glob = if part.is_empty() { "*" } else { part };
                Glob::new(glob)
                    .map(|g| g.compile_matcher())
                    .map_err(|e| DepTreeError::InvalidInput {
                        message: format!("invalid artifact pattern '{pattern}': {e}"),
                    })
            })
            .collect::<DepTreeResult<Vec<_>>>()?;
        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, artifact: &Artifact) -> bool {
        let values = [
            artifact.group_id.as_str(),
            artifact.artifact_id.as_str(),
            artifact.artifact_type.as_str(),
            artifact.version.as_str(),
        ];
        self.segments
            .iter()
            .zip(values)
            .all(|(matcher, value)| matcher.is_match(value))
    }
}

/// Includes (or excludes) artifacts matching any of a set of patterns.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    patterns: Vec<ArtifactPattern>,
    include_matches: bool,
}

impl PatternFilter {
    /// Keep only artifacts matching at least one pattern.
    pub fn includes<S: AsRef<str>>(patterns: &[S]) -> DepTreeResult<Self> {
        Ok(Self {
            patterns: parse_patterns(patterns)?,
            include_matches: true,
        })
    }

    /// Drop artifacts matching any pattern.
    pub fn excludes<S: AsRef<str>>(patterns: &[S]) -> DepTreeResult<Self> {
        Ok(Self {
            patterns: parse_patterns(patterns)?,
            include_matches: false,
        })
    }
}

fn parse_patterns<S: AsRef<str>>(patterns: &[S]) -> DepTreeResult<Vec<ArtifactPattern>> {
    patterns
        .iter()
        .map(|p| ArtifactPattern::parse(p.as_ref()))
        .collect()
}

impl ArtifactFilter for PatternFilter {
    fn include(&self, artifact: &Artifact) -> bool {
        let matched = self.patterns.iter().any(|p| p.matches(artifact));
        matched == self.include_matches
    }
}

/// Includes an artifact only when every inner filter does.
#[derive(Default)]
pub struct AndFilter {
    filters: Vec<Box<dyn ArtifactFilter>>,
}

impl AndFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl ArtifactFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ArtifactFilter for AndFilter {
    fn include(&self, artifact: &Artifact) -> bool {
        self.filters.iter().all(|f| f.include(artifact))
    }
}
