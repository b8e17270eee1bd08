use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use deptree_util::errors::{DepTreeError, DepTreeResult};

use crate::artifact::ArtifactScope;
use crate::filter::{AndFilter, ArtifactFilter, PatternFilter, ScopeFilter};

/// Name of the project-local configuration file.
pub const CONFIG_FILE_NAME: &str = "deptree.toml";

/// Configuration loaded from `deptree.toml` or `~/.deptree/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Rendering settings from `[output]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub tokens: TokenStyle,
    /// Render with the legacy three-space indentation instead of tree tokens.
    #[serde(default)]
    pub legacy: bool,
}

/// Which set of branch tokens the serializer draws with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStyle {
    #[default]
    Standard,
    Whitespace,
    Extended,
}

impl std::str::FromStr for TokenStyle {
    type Err = DepTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "whitespace" => Ok(Self::Whitespace),
            "extended" => Ok(Self::Extended),
            other => Err(DepTreeError::InvalidInput {
                message: format!(
                    "unknown tree tokens '{other}' (expected standard, whitespace or extended)"
                ),
            }),
        }
    }
}

/// Artifact filtering from `[filter]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub scope: Option<ArtifactScope>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// Resolver back-end selection from `[resolver]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub backend: BackendKind,
}

/// The resolver generation whose output is turned into a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Recorded resolution-listener callbacks.
    #[default]
    Events,
    /// An already resolved dependency graph.
    Graph,
}

impl FilterConfig {
    /// Combine scope, include and exclude settings into one filter.
    ///
    /// Returns `None` when nothing is configured.
    pub fn build(&self) -> DepTreeResult<Option<Box<dyn ArtifactFilter>>> {
        let mut filter = AndFilter::new();
        if let Some(scope) = self.scope {
            filter.push(ScopeFilter::new(scope));
        }
        if !self.includes.is_empty() {
            filter.push(PatternFilter::includes(&self.includes)?);
        }
        if !self.excludes.is_empty() {
            filter.push(PatternFilter::excludes(&self.excludes)?);
        }
        if filter.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Box::new(filter)))
        }
    }
}

impl TreeConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the nearest `deptree.toml` above
    /// `cwd` is used, then the user config, then defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> DepTreeResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        if let Some(dir) = deptree_util::fs::find_ancestor_with(cwd, CONFIG_FILE_NAME) {
            return Self::from_path(&dir.join(CONFIG_FILE_NAME));
        }
        let user = Self::default_path();
        if user.is_file() {
            Self::from_path(&user)
        } else {
            tracing::debug!("no configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_path(path: &Path) -> DepTreeResult<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| DepTreeError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> DepTreeResult<Self> {
        toml::from_str(content).map_err(|e| DepTreeError::Config {
            message: format!("Failed to parse configuration: {e}"),
        })
    }

    pub fn to_string_pretty(&self) -> DepTreeResult<String> {
        toml::to_string_pretty(self).map_err(|e| DepTreeError::Config {
            message: format!("Failed to serialize configuration: {e}"),
        })
    }

    /// Returns the default path to the user config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the deptree data directory (`~/.deptree/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".deptree")
}
