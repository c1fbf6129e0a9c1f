//! Error types for the lint engine.
//!
//! Only [`LinterError`] (and the [`PathSecurityError`] it wraps) ever leaves the
//! crate as an `Err`. Configuration and script failures are recovered inside
//! the loader, and per-file failures are recorded on the file's `LintResult`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can escape a lint run.
#[derive(Debug, Error)]
pub enum LinterError {
    /// A caller-supplied path failed security validation.
    #[error(transparent)]
    Path(#[from] PathSecurityError),

    /// Caller-supplied configuration was rejected (e.g. an invalid glob).
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LinterError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Path validation failures raised by the security gate.
#[derive(Debug, Error)]
pub enum PathSecurityError {
    #[error("Invalid path: {0}")]
    InvalidInput(String),

    #[error("Path contains a null byte")]
    NullByte,

    #[error("Path traversal detected: {} escapes {}", path.display(), base.display())]
    Traversal { path: PathBuf, base: PathBuf },

    #[error("Path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Symlink escape detected: {} resolves outside {}", path.display(), base.display())]
    SymlinkEscape { path: PathBuf, base: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PathSecurityError {
    /// Classifies an I/O error raised while probing `path`.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }
}

/// Reasons a configuration file was not used.
///
/// These never propagate to callers; the loader logs them and falls back to
/// "no configuration".
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Configuration in {} must be an object", .0.display())]
    NotAnObject(PathBuf),

    #[error("Configuration file {} resolves outside the project root", .0.display())]
    OutsideProject(PathBuf),

    #[error("Configuration file name is not allowed for scripts: {0}")]
    FilenameNotAllowed(String),

    #[error("Security check failed for {}: {description} (matched `{pattern}`)", path.display())]
    ForbiddenPattern {
        path: PathBuf,
        pattern: String,
        description: String,
    },

    #[error("Script configuration {} timed out after {millis} ms", path.display())]
    Timeout { path: PathBuf, millis: u128 },

    #[error("Script configuration {} failed: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: ScriptError,
    },
}

/// Failures of the embedded configuration script runtime.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScriptError {
    #[error("syntax error at line {line}: {message}")]
    Lex { line: usize, message: String },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("evaluation exceeded its step budget")]
    BudgetExceeded,

    #[error("evaluation timed out after {0} ms")]
    Timeout(u128),
}

impl ScriptError {
    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}
