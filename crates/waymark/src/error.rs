//! Error types for the rule engine.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating rule sets, matching rules, or
/// building descriptors.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed rule set at construction. The engine is unusable.
    #[error("Invalid rule set: {0}")]
    RuleSet(String),

    /// Malformed intent at build time.
    #[error("Invalid intent: {0}")]
    Intent(String),

    /// Wrong arity or invalid literal argument for a fired action.
    #[error("Action '{action}': {detail}")]
    Argument {
        /// Wire name of the offending action.
        action: &'static str,
        /// What was wrong with the arguments.
        detail: String,
    },

    /// A regex trigger argument failed to compile.
    #[error("Invalid regex '{pattern}': {detail}")]
    Regex {
        /// The pattern that failed to compile.
        pattern: String,
        /// Compiler diagnostic.
        detail: String,
    },

    /// The built descriptor failed final validation.
    #[error("Invalid descriptor: {0}")]
    Descriptor(String),

    /// A file-backed credential could not be read.
    #[error("Failed to read credential file {}: {source}", path.display())]
    CredentialFile {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn argument(action: &'static str, detail: impl Into<String>) -> Self {
        Error::Argument {
            action,
            detail: detail.into(),
        }
    }
}
