//! Top-level error types for the command line.
//!
//! Library failures arrive as [`crate::packager::Error`] and keep their stage
//! label; everything the CLI itself rejects is a [`CliError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum PackagerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file errors
    #[error("settings file {}: {source}", path.display())]
    SettingsFile {
        /// Settings file path
        path: PathBuf,
        /// Parse failure
        #[source]
        source: toml::de::Error,
    },

    /// Packaging pipeline errors
    #[error("{0}")]
    Packager(#[from] crate::packager::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::{Error, Operation};

    #[test]
    fn pipeline_errors_keep_stage_label() {
        let err: PackagerError = Error::Operation {
            operation: Operation::CheckVersion,
            source: Box::new(Error::InvalidVersion("x".into())),
        }
        .into();
        assert!(err.to_string().starts_with("check version failed"));
    }

    #[test]
    fn missing_argument_names_the_flag() {
        let err = PackagerError::from(CliError::MissingArgument {
            argument: "--tenant-id".into(),
        });
        assert!(err.to_string().contains("--tenant-id"));
    }
}
