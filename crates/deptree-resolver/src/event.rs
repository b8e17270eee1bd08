//! Serializable form of the resolution-listener callbacks.
//!
//! A resolver adapter can record its callbacks as a JSON array of these
//! events and replay them later through a
//! [`ResolutionListener`](crate::listener::ResolutionListener).

use deptree_core::artifact::{Artifact, ArtifactScope};
use deptree_util::errors::{DepTreeError, DepTreeResult};
use serde::{Deserialize, Serialize};

/// One callback emitted by a resolver while it walks a project's
/// dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ResolutionEvent {
    TestArtifact {
        artifact: Artifact,
    },
    StartChildren {
        artifact: Artifact,
    },
    EndChildren {
        artifact: Artifact,
    },
    Include {
        artifact: Artifact,
    },
    OmitForNearer {
        omitted: Artifact,
        kept: Artifact,
    },
    UpdateScope {
        artifact: Artifact,
        scope: ArtifactScope,
    },
    UpdateScopeCurrentPom {
        artifact: Artifact,
        scope: ArtifactScope,
    },
    ManageVersion {
        artifact: Artifact,
        replacement: Artifact,
    },
    ManageScope {
        artifact: Artifact,
        replacement: Artifact,
    },
    OmitForCycle {
        artifact: Artifact,
    },
    SelectVersionFromRange {
        artifact: Artifact,
    },
    RestrictRange {
        artifact: Artifact,
        replacement: Artifact,
        range: String,
    },
    /// The resolver could not resolve `artifact`.
    Failed {
        artifact: Artifact,
        message: String,
    },
}

impl ResolutionEvent {
    /// The artifact the callback is about.
    pub fn artifact(&self) -> &Artifact {
        match self {
            Self::TestArtifact { artifact }
            | Self::StartChildren { artifact }
            | Self::EndChildren { artifact }
            | Self::Include { artifact }
            | Self::UpdateScope { artifact, .. }
            | Self::UpdateScopeCurrentPom { artifact, .. }
            | Self::ManageVersion { artifact, .. }
            | Self::ManageScope { artifact, .. }
            | Self::OmitForCycle { artifact }
            | Self::SelectVersionFromRange { artifact }
            | Self::RestrictRange { artifact, .. }
            | Self::Failed { artifact, .. } => artifact,
            Self::OmitForNearer { omitted, .. } => omitted,
        }
    }
}

/// Parse a JSON array of events.
pub fn parse_events(json: &str) -> DepTreeResult<Vec<ResolutionEvent>> {
    serde_json::from_str(json).map_err(|e| DepTreeError::InvalidInput {
        message: format!("malformed resolution events: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_events() {
        let json = r#"[
            {"event": "include", "artifact": "g:app:1.0"},
            {"event": "start-children", "artifact": "g:app:1.0"},
            {"event": "omit-for-nearer", "omitted": "g:x:1.0", "kept": "g:x:2.0"},
            {"event": "update-scope", "artifact": "g:y:1.0", "scope": "runtime"},
            {"event": "end-children", "artifact": "g:app:1.0"}
        ]"#;
        let events = parse_events(json).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0],
            ResolutionEvent::Include {
                artifact: Artifact::new("g", "app", "1.0")
            }
        );
        assert_eq!(events[2].artifact().version, "1.0");
        assert_eq!(
            events[3],
            ResolutionEvent::UpdateScope {
                artifact: Artifact::new("g", "y", "1.0"),
                scope: ArtifactScope::Runtime,
            }
        );
    }

    #[test]
    fn parses_detailed_artifacts() {
        let json = r#"[{"event": "omit-for-cycle", "artifact": {"group": "g", "artifact": "a", "version": "1", "classifier": "tests"}}]"#;
        let events = parse_events(json).unwrap();
        assert_eq!(events[0].artifact().classifier.as_deref(), Some("tests"));
    }

    #[test]
    fn rejects_unknown_events() {
        let err = parse_events(r#"[{"event": "explode", "artifact": "g:a:1"}]"#).unwrap_err();
        assert!(err.to_string().contains("malformed resolution events"), "got: {err}");
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(parse_events(r#"[{"event": "include", "artifact": "g:a"}]"#).is_err());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = ResolutionEvent::Include {
            artifact: Artifact::new("g", "a", "1"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with(r#"{"event":"include""#), "got: {json}");
    }
}
