use std::fmt;
use std::str::FromStr;

use deptree_util::errors::DepTreeError;
use serde::{Deserialize, Serialize};

/// Maven-compatible dependency scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactScope {
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl ArtifactScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Provided => "provided",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::System => "system",
            Self::Import => "import",
        }
    }
}

impl Default for ArtifactScope {
    fn default() -> Self {
        Self::Compile
    }
}

impl fmt::Display for ArtifactScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactScope {
    type Err = DepTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Self::Compile),
            "provided" => Ok(Self::Provided),
            "runtime" => Ok(Self::Runtime),
            "test" => Ok(Self::Test),
            "system" => Ok(Self::System),
            "import" => Ok(Self::Import),
            other => Err(DepTreeError::InvalidInput {
                message: format!("unknown scope '{other}'"),
            }),
        }
    }
}

/// A resolved (or being resolved) Maven artifact.
///
/// Deserializes from either a coordinate string
/// (`group:artifact[:type[:classifier]]:version[:scope]`) or a table with
/// explicit fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ArtifactSpec")]
pub struct Artifact {
    #[serde(rename = "group")]
    pub group_id: String,
    #[serde(rename = "artifact")]
    pub artifact_id: String,
    pub version: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ArtifactScope>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Value-equality identity of one artifact version.
///
/// Scope is deliberately not part of the key so scope updates never change
/// which node an artifact maps to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub artifact_type: String,
    pub classifier: Option<String>,
}

/// "Same dependency" identity irrespective of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConflictId {
    pub group_id: String,
    pub artifact_id: String,
    pub artifact_type: String,
    pub classifier: Option<String>,
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.artifact_type)?;
        if let Some(ref classifier) = self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.artifact_type)?;
        if let Some(ref classifier) = self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, ":{}", self.version)
    }
}

impl Artifact {
    /// A `jar` artifact with no classifier and no scope.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            artifact_type: "jar".to_string(),
            classifier: None,
            scope: None,
            optional: false,
        }
    }

    pub fn with_scope(mut self, scope: ArtifactScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = artifact_type.into();
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Parse a coordinate string.
    ///
    /// Accepted shapes: `g:a:v`, `g:a:t:v`, `g:a:t:v:scope`, `g:a:t:c:v` and
    /// `g:a:t:c:v:scope`. A five-part coordinate is read as carrying a scope
    /// when its last part names one.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let artifact = match parts.as_slice() {
            [g, a, v] => Self::new(*g, *a, *v),
            [g, a, t, v] => Self::new(*g, *a, *v).with_type(*t),
            [g, a, t, x, y] => match y.parse::<ArtifactScope>() {
                Ok(scope) => Self::new(*g, *a, *x).with_type(*t).with_scope(scope),
                Err(_) => Self::new(*g, *a, *y).with_type(*t).with_classifier(*x),
            },
            [g, a, t, c, v, s] => Self::new(*g, *a, *v)
                .with_type(*t)
                .with_classifier(*c)
                .with_scope(s.parse().ok()?),
            _ => return None,
        };
        Some(artifact)
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            artifact_type: self.artifact_type.clone(),
            classifier: self.classifier.clone(),
        }
    }

    pub fn conflict_id(&self) -> ConflictId {
        ConflictId {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            artifact_type: self.artifact_type.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// `group:artifact:type[:classifier]:version`.
    pub fn id(&self) -> String {
        self.key().to_string()
    }

    /// Whether both artifacts denote the same artifact version.
    pub fn same_key(&self, other: &Artifact) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.version == other.version
            && self.artifact_type == other.artifact_type
            && self.classifier == other.classifier
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())?;
        if let Some(scope) = self.scope {
            write!(f, ":{scope}")?;
        }
        Ok(())
    }
}

impl FromStr for Artifact {
    type Err = DepTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DepTreeError::InvalidInput {
            message: format!("invalid artifact coordinate '{s}'"),
        })
    }
}

/// Wire form of an [`Artifact`]: shorthand string or detailed table.
#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactSpec {
    Short(String),
    Detailed(DetailedArtifact),
}

#[derive(Deserialize)]
struct DetailedArtifact {
    group: String,
    artifact: String,
    version: String,
    #[serde(default = "default_type", rename = "type")]
    artifact_type: String,
    #[serde(default)]
    classifier: Option<String>,
    #[serde(default)]
    scope: Option<ArtifactScope>,
    #[serde(default)]
    optional: bool,
}

fn default_type() -> String {
    "jar".to_string()
}

impl TryFrom<ArtifactSpec> for Artifact {
    type Error = DepTreeError;

    fn try_from(spec: ArtifactSpec) -> Result<Self, Self::Error> {
        match spec {
            ArtifactSpec::Short(s) => s.parse(),
            ArtifactSpec::Detailed(d) => Ok(Self {
                group_id: d.group,
                artifact_id: d.artifact,
                version: d.version,
                artifact_type: d.artifact_type,
                classifier: d.classifier,
                scope: d.scope,
                optional: d.optional,
            }),
        }
    }
}
