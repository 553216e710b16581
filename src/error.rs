//! Error types for tzshapefilegen
//!
//! Every error is terminal for a run. Errors are grouped by the pipeline stage
//! that raised them so the binary can print one diagnostic line naming the
//! failing stage and exit with a code per error class.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for tzshapefilegen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tzshapefilegen
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "release")
        key: Option<String>,
    },

    /// Required external executable could not be resolved
    #[error("{tool} executable not found: {reason}")]
    MissingExecutable {
        /// Name of the executable (e.g., "mapshaper")
        tool: String,
        /// Why resolution failed
        reason: String,
    },

    /// Temporary working directory could not be created
    #[error("could not create working directory under {parent}: {source}")]
    Workspace {
        /// Parent directory the workspace was created in
        parent: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Dataset download failed
    #[error("download failed: {0}")]
    Transfer(#[from] TransferError),

    /// Downloaded archive does not have the expected layout
    #[error("unexpected dataset archive: {0}")]
    Format(#[from] FormatError),

    /// Writing the extracted entry to the workspace failed
    #[error("failed to extract {path}: {source}")]
    Extract {
        /// Destination file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// External tool could not be launched
    #[error("failed to run {tool}: {source}")]
    ToolLaunch {
        /// Name of the tool
        tool: String,
        /// Underlying spawn error
        source: std::io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("{tool} exited with {status}")]
    ToolFailed {
        /// Name of the tool
        tool: String,
        /// Exit status reported by the process
        status: ExitStatus,
    },

    /// Compressing the simplified geometry failed
    #[error("failed to compress {path}: {source}")]
    Compress {
        /// File being compressed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The run was cancelled before it finished
    #[error("cancelled during {0}")]
    Cancelled(Stage),

    /// Background task ended abnormally
    #[error("{stage} task failed: {source}")]
    Task {
        /// Stage the task was running for
        stage: Stage,
        /// Panic or abort reported by the runtime
        source: tokio::task::JoinError,
    },
}

/// Transfer-related errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// The HTTP client could not be constructed
    #[error("could not build HTTP client: {0}")]
    Client(reqwest::Error),

    /// The HTTP request could not be completed
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying client error
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// Reading the response body failed partway
    #[error("reading response body failed after {received} bytes: {source}")]
    Body {
        /// Bytes buffered before the failure
        received: u64,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Body length does not match Content-Length
    #[error("expected {expected} bytes, received {received}")]
    LengthMismatch {
        /// Advertised length
        expected: u64,
        /// Bytes actually read
        received: u64,
    },
}

/// Dataset archive format errors
#[derive(Debug, Error)]
pub enum FormatError {
    /// The body is not a readable zip archive
    #[error("not a valid zip archive: {0}")]
    InvalidArchive(String),

    /// The archive has no entries
    #[error("release zip file has no files")]
    EmptyArchive,

    /// The first entry is not the expected file
    #[error("first file in zip file is {found:?}, expected {expected:?}")]
    UnexpectedEntry {
        /// Name that was required
        expected: &'static str,
        /// Name that was found
        found: String,
    },
}

/// Pipeline stage an error originated from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Loading and validating configuration
    Config,
    /// Checking the environment before any network work
    Environment,
    /// Downloading the release archive
    Download,
    /// Validating and extracting the archive
    Extract,
    /// Running the external simplifier
    Simplify,
    /// Compressing and rendering the literal
    Encode,
    /// Writing the generated file
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Environment => "environment",
            Stage::Download => "download",
            Stage::Extract => "extract",
            Stage::Simplify => "simplify",
            Stage::Encode => "encode",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Map a [`JoinError`](tokio::task::JoinError) from a task run for `stage`
    pub(crate) fn task(stage: Stage) -> impl FnOnce(tokio::task::JoinError) -> Self {
        move |source| Error::Task { stage, source }
    }

    /// Stage this error is attributed to
    ///
    /// Plain I/O errors are attributed to [`Stage::Write`]; the generator wraps
    /// stage-specific I/O failures in dedicated variants before they get here.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Cancelled(stage) | Error::Task { stage, .. } => *stage,
            Error::Config { .. } | Error::Serialization(_) => Stage::Config,
            Error::MissingExecutable { .. } | Error::Workspace { .. } => Stage::Environment,
            Error::Transfer(_) => Stage::Download,
            Error::Format(_) | Error::Extract { .. } => Stage::Extract,
            Error::ToolLaunch { .. } | Error::ToolFailed { .. } => Stage::Simplify,
            Error::Compress { .. } => Stage::Encode,
            Error::Io(_) => Stage::Write,
        }
    }
}

/// Convert errors to process exit codes
///
/// Each error class gets its own code so scripts can tell "nothing to do about
/// it" (format) apart from "try again later" (transfer).
pub trait ToExitCode {
    /// Get the process exit code for this error
    fn exit_code(&self) -> i32;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> i32 {
        match self {
            Error::Config { .. } | Error::Serialization(_) => 2,
            Error::MissingExecutable { .. } | Error::Workspace { .. } => 3,
            Error::Transfer(_) => 4,
            Error::Format(_) => 5,
            Error::ToolLaunch { .. } | Error::ToolFailed { .. } => 6,
            Error::Extract { .. } | Error::Compress { .. } | Error::Io(_) | Error::Task { .. } => 7,
            // Conventional code for termination by SIGINT
            Error::Cancelled(_) => 130,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Serialization(_) => "serialization_error",
            Error::MissingExecutable { .. } => "missing_executable",
            Error::Workspace { .. } => "workspace_error",
            Error::Transfer(e) => match e {
                TransferError::Client(_) => "client_error",
                TransferError::Request { .. } => "request_failed",
                TransferError::Status { .. } => "http_status",
                TransferError::Body { .. } => "body_read_failed",
                TransferError::LengthMismatch { .. } => "length_mismatch",
            },
            Error::Format(e) => match e {
                FormatError::InvalidArchive(_) => "invalid_archive",
                FormatError::EmptyArchive => "empty_archive",
                FormatError::UnexpectedEntry { .. } => "unexpected_entry",
            },
            Error::Extract { .. } => "extract_failed",
            Error::ToolLaunch { .. } => "tool_launch_failed",
            Error::ToolFailed { .. } => "tool_failed",
            Error::Compress { .. } => "compress_failed",
            Error::Io(_) => "io_error",
            Error::Cancelled(_) => "cancelled",
            Error::Task { .. } => "task_failed",
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_errors_have_distinct_messages_and_codes() {
        let empty = Error::from(FormatError::EmptyArchive);
        let unexpected = Error::from(FormatError::UnexpectedEntry {
            expected: "dist/combined.json",
            found: "README.md".to_string(),
        });

        assert_ne!(empty.to_string(), unexpected.to_string());
        assert_ne!(empty.error_code(), unexpected.error_code());
        assert_eq!(empty.exit_code(), 5);
        assert_eq!(unexpected.exit_code(), 5);
        assert!(unexpected.to_string().contains("README.md"));
    }

    #[test]
    fn every_class_maps_to_its_own_exit_code() {
        let cases = [
            (Error::config("release", "must not be empty"), 2),
            (
                Error::MissingExecutable {
                    tool: "mapshaper".to_string(),
                    reason: "not in PATH".to_string(),
                },
                3,
            ),
            (
                Error::from(TransferError::Status {
                    url: "http://localhost/x".to_string(),
                    status: 404,
                }),
                4,
            ),
            (Error::from(FormatError::EmptyArchive), 5),
            (
                Error::ToolLaunch {
                    tool: "mapshaper".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                },
                6,
            ),
            (Error::Io(std::io::Error::other("disk full")), 7),
            (Error::Cancelled(Stage::Download), 130),
        ];

        for (error, code) in cases {
            assert_eq!(error.exit_code(), code, "exit code for {error}");
        }
    }

    #[test]
    fn stage_names_the_failing_step() {
        assert_eq!(
            Error::from(FormatError::EmptyArchive).stage(),
            Stage::Extract
        );
        assert_eq!(
            Error::from(TransferError::LengthMismatch {
                expected: 10,
                received: 4
            })
            .stage(),
            Stage::Download
        );
        assert_eq!(
            Error::Compress {
                path: PathBuf::from("reduced.json"),
                source: std::io::Error::other("boom"),
            }
            .stage()
            .to_string(),
            "encode"
        );
    }

    #[test]
    fn cancellation_and_task_failures_keep_their_stage() {
        let cancelled = Error::Cancelled(Stage::Simplify);
        assert_eq!(cancelled.stage(), Stage::Simplify);
        assert_eq!(cancelled.to_string(), "cancelled during simplify");
        assert_eq!(cancelled.exit_code(), 130);
    }

    #[tokio::test]
    async fn join_errors_are_attributed_to_the_spawning_stage() {
        let join_error = tokio::task::spawn_blocking::<_, ()>(|| panic!("boom"))
            .await
            .unwrap_err();

        let err = Error::task(Stage::Encode)(join_error);

        assert_eq!(err.stage(), Stage::Encode);
        assert_eq!(err.exit_code(), 7);
        assert!(err.to_string().starts_with("encode task failed"));
    }
}
