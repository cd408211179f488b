//! Error types for packaging and publishing operations.
//!
//! Every failure the pipeline can surface is a variant of [`Error`]. Stage
//! failures are wrapped in [`Error::Operation`] so the top-level message names
//! the step that failed.

use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type alias for packager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Named pipeline step, used to label errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Preflight input and destination checks.
    Preflight,
    /// Editing the configuration document copy.
    EditConfiguration,
    /// Staging files and running the packaging tool.
    AssemblePackage,
    /// Reading the installer's file version.
    InspectInstaller,
    /// Building the package manifest.
    BuildManifest,
    /// Signing in to the remote catalog.
    Authenticate,
    /// Comparing against published versions.
    CheckVersion,
    /// Creating the remote package record.
    CreatePackage,
    /// Marking older records as superseded.
    ApplySupersedence,
}

impl Operation {
    /// Returns the label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::EditConfiguration => "edit configuration",
            Self::AssemblePackage => "assemble package",
            Self::InspectInstaller => "inspect installer",
            Self::BuildManifest => "build manifest",
            Self::Authenticate => "authenticate",
            Self::CheckVersion => "check version",
            Self::CreatePackage => "create package",
            Self::ApplySupersedence => "apply supersedence",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised by the packager library.
#[derive(Error, Debug)]
pub enum Error {
    /// Free-form failure.
    #[error("{0}")]
    GenericError(String),

    /// IO error with the operation and path that failed.
    #[error("{context} ({}): {error}", path.display())]
    Fs {
        /// What was being attempted.
        context: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        error: std::io::Error,
    },

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parse errors.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] xmltree::ParseError),

    /// XML write errors.
    #[error("XML write error: {0}")]
    XmlWrite(#[from] xmltree::Error),

    /// HTTP transport errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL errors.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Archive read errors.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required input file does not exist.
    #[error("required input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// The staging destination already contains files.
    #[error("destination is not empty: {}", .0.display())]
    DestinationNotEmpty(PathBuf),

    /// A named field is missing from the configuration document.
    #[error("configuration field not found: {0}")]
    ConfigFieldNotFound(String),

    /// The document is not an installer configuration.
    #[error("wrong document type: expected <{expected}>, found <{found}>")]
    WrongDocumentType {
        /// Expected root element.
        expected: &'static str,
        /// Actual root element.
        found: String,
    },

    /// An identifier is missing or not a GUID.
    #[error("invalid identifier {value:?} in {field}")]
    InvalidIdentifier {
        /// Field holding the identifier.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A detection rule expected by the manifest builder is absent.
    #[error("detection rule not found in manifest template: {0}")]
    DetectionRuleNotFound(&'static str),

    /// A version string could not be parsed.
    #[error("invalid version: {0:?}")]
    InvalidVersion(String),

    /// No version is known for the release channel.
    #[error("no version available for channel {0}")]
    ChannelVersionNotFound(String),

    /// The package archive lacks metadata the upload needs.
    #[error("archive metadata incomplete: {0}")]
    ArchiveMetadata(String),

    /// The installer is not a readable PE image or has no version resource.
    #[error("cannot read installer version from {}: {reason}", path.display())]
    InstallerVersion {
        /// Installer path.
        path: PathBuf,
        /// What was missing or malformed.
        reason: String,
    },

    /// The packaging tool output could not be located.
    #[error("expected exactly one .{extension} archive in {}, found {count}", dir.display())]
    ArtifactNotFound {
        /// Directory searched.
        dir: PathBuf,
        /// Extension looked for.
        extension: &'static str,
        /// Number of candidates found.
        count: usize,
    },

    /// A subprocess could not be started or awaited.
    #[error("failed to run {command}: {error}")]
    CommandFailed {
        /// Command that failed.
        command: String,
        /// Underlying error.
        error: std::io::Error,
    },

    /// A subprocess ran and exited unsuccessfully.
    #[error("{command} exited with {status}: {stderr}")]
    ToolFailed {
        /// Command that failed.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The remote catalog returned an error.
    #[error("remote catalog error ({status}): {message}")]
    Remote {
        /// HTTP status or service error code.
        status: String,
        /// Service message.
        message: String,
    },

    /// A pipeline stage failed.
    #[error("{operation} failed: {source}")]
    Operation {
        /// Stage label.
        operation: Operation,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the innermost error, skipping [`Error::Operation`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the stage label if this error came from a pipeline stage.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Operation { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

/// Extension for attaching path context to IO results.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`Error::Fs`] with the given context and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Extension for attaching a message to failures and empty options.
pub trait Context<T> {
    /// Replaces the failure with [`Error::GenericError`] prefixed by `msg`.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T> Context<T> for Result<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

/// Extension for labelling a stage result with its [`Operation`].
pub trait OperationExt<T> {
    /// Wraps a failure in [`Error::Operation`].
    fn operation(self, operation: Operation) -> Result<T>;
}

impl<T> OperationExt<T> for Result<T> {
    fn operation(self, operation: Operation) -> Result<T> {
        self.map_err(|e| {
            log::error!("{operation} failed: {e}");
            Error::Operation {
                operation,
                source: Box::new(e),
            }
        })
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::packager::Error::GenericError(format!($($arg)*)))
    };
}
