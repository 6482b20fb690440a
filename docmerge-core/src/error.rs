//! Typed error handling for docmerge.
//!
//! Errors here are the *fatal* conditions of a stage: a module whose facts
//! cannot be loaded or whose structure is broken, an unreadable config, a
//! content store that refuses a key. Recoverable per-element problems never
//! surface as `DocmergeError`; they are collected as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s next to the result.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for docmerge operations.
#[derive(Error, Debug)]
pub enum DocmergeError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Module facts could not be loaded or decoded
    #[error("Fact source error for module {module}: {message}")]
    FactSource { module: String, message: String },

    /// A member references a container absent from its own module's facts
    #[error("Structural error in module {module} at {key}: {message}")]
    Structural {
        module: String,
        key: String,
        message: String,
    },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Content store unavailable or rejected a key
    #[error("Content store error for {key}: {message}")]
    ContentStore { key: String, message: String },

    /// Every module pipeline failed, nothing to merge
    #[error("No module could be built ({failed} failed)")]
    NoModulesBuilt { failed: usize },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DocmergeError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a fact source error.
    pub fn fact_source(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FactSource {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create a structural error for one module.
    pub fn structural(
        module: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Structural {
            module: module.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a content store error.
    pub fn content_store(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContentStore {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error only affects one module or key (the run can continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FactSource { .. } | Self::Structural { .. } | Self::ContentStore { .. }
        )
    }

    /// Get the module name associated with this error, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::FactSource { module, .. } => Some(module),
            Self::Structural { module, .. } => Some(module),
            _ => None,
        }
    }
}

/// Convenience type alias for docmerge results.
pub type DocmergeResult<T> = Result<T, DocmergeError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DocmergeResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DocmergeResult<T> {
        self.map_err(|e| DocmergeError::io(path, e))
    }
}
