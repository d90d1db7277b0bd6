//! Error types and context helpers shared by every utility in the crate

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all toolbox operations
#[derive(Debug)]
pub enum ToolError {
    /// Failed to load an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save an image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A line of a text input could not be parsed
    MalformedLine {
        /// File the line came from
        path: PathBuf,
        /// One-based line number
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Input data doesn't meet the operation's requirements
    InvalidInput {
        /// Description of what's wrong with the input
        reason: String,
    },

    /// A character has no Beta Code mapping
    UnknownBetacode {
        /// The offending character
        character: char,
        /// Character offset within the converted line
        position: usize,
    },

    /// The node graph is wired incorrectly or a node cannot be evaluated
    Model {
        /// Name of the node involved
        node: String,
        /// Description of the failure
        reason: String,
    },

    /// Numerical computation produced an invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::MalformedLine { path, line, reason } => {
                write!(f, "Malformed line {line} in '{}': {reason}", path.display())
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidInput { reason } => write!(f, "Invalid input: {reason}"),
            Self::UnknownBetacode {
                character,
                position,
            } => {
                write!(
                    f,
                    "No Beta Code mapping for {character:?} at position {position}"
                )
            }
            Self::Model { node, reason } => write!(f, "Model error at node '{node}': {reason}"),
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for toolbox results
pub type Result<T> = std::result::Result<T, ToolError>;

/// Attaches a path and operation to raw I/O failures
pub trait WithPath<T> {
    /// Wrap an I/O error as [`ToolError::FileSystem`]
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path and operation applied
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| ToolError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

impl From<image::ImageError> for ToolError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> ToolError {
    ToolError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> ToolError {
    ToolError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a model wiring or evaluation error
pub fn model_error(node: &str, reason: &impl ToString) -> ToolError {
    ToolError::Model {
        node: node.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid input error
pub fn invalid_input(reason: &impl ToString) -> ToolError {
    ToolError::InvalidInput {
        reason: reason.to_string(),
    }
}
