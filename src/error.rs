/// Frontend error types and handling utilities
/// Main error type for packager operations
#[derive(Debug)]
pub enum PackagerError {
    /// Required source option absent for the given target
    MissingSource { target: String },
    /// Reference does not use the huggingface:// scheme
    NotHuggingFace { source: String },
    /// Reference uses the scheme but does not match the grammar
    InvalidHuggingFace { source: String },
    /// Unrecognized layer_packaging option value
    UnknownPackMode { value: String },
    /// Graph plumbing failure; stage is one of marshal, solve, get result reference
    Graph {
        stage: String,
        name: String,
        cause: String,
    },
    /// Assembler script exited nonzero inside the builder container
    Script { exit_code: i32, stderr: String },
    /// Wrapped anyhow error for compatibility
    Other(anyhow::Error),
}

impl std::fmt::Display for PackagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSource { target } => {
                write!(f, "source is required for {} target", target)
            }
            Self::NotHuggingFace { source } => {
                write!(f, "not a huggingface source: {}", source)
            }
            Self::InvalidHuggingFace { source } => {
                write!(f, "invalid huggingface source: {}", source)
            }
            Self::UnknownPackMode { value } => {
                write!(f, "unsupported layer_packaging value: {}", value)
            }
            Self::Graph { stage, name, cause } => {
                write!(f, "failed to {} {}: {}", stage, name, cause)
            }
            Self::Script { exit_code, stderr } => {
                write!(f, "assembler script failed (exit {}): {}", exit_code, stderr)
            }
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PackagerError {}

impl From<anyhow::Error> for PackagerError {
    fn from(err: anyhow::Error) -> Self {
        PackagerError::Other(err)
    }
}

/// Helper to determine whether an error is caused by caller input, as opposed
/// to a failure inside the graph or the builder container.
pub fn is_option_error(err: &PackagerError) -> bool {
    match err {
        PackagerError::MissingSource { .. } => true,
        PackagerError::NotHuggingFace { .. } => true,
        PackagerError::InvalidHuggingFace { .. } => true,
        PackagerError::UnknownPackMode { .. } => true,
        PackagerError::Graph { .. } => false,
        PackagerError::Script { .. } => false,
        PackagerError::Other(_) => false,
    }
}
