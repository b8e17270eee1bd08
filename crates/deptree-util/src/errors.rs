use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all deptree operations.
#[derive(Debug, Error, Diagnostic)]
pub enum DepTreeError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The resolver emitted a callback sequence the listener cannot accept
    /// (mismatched start/end children, unknown node, identity mismatch).
    #[error("Resolution protocol violated: {message}")]
    #[diagnostic(help("The event stream is inconsistent; this is a bug in the resolver adapter"))]
    ProtocolViolation { message: String },

    /// The underlying resolver failed to resolve an artifact.
    #[error("Dependency resolution failed for {artifact}: {message}")]
    Resolution { artifact: String, message: String },

    /// Building the dependency graph of a project failed.
    #[error("Cannot build dependency graph for {project}")]
    GraphBuild {
        project: String,
        #[source]
        source: Box<DepTreeError>,
    },

    /// Invalid or malformed configuration (e.g. deptree.toml).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your deptree.toml for syntax errors"))]
    Config { message: String },

    /// Input that could not be read or parsed (event streams, graphs, patterns).
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl DepTreeError {
    /// Shorthand for a [`DepTreeError::ProtocolViolation`].
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }
}

/// Result alias used by the library crates.
pub type DepTreeResult<T> = Result<T, DepTreeError>;
