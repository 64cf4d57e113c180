//! Error types for playship operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for playship operations
pub type Result<T> = std::result::Result<T, PublishError>;

/// Main error type for all playship operations
#[derive(Error, Debug)]
pub enum PublishError {
    /// Google Play publishing API errors
    #[error("Google Play error: {0}")]
    Api(#[from] ApiError),

    /// Local APK inspection errors
    #[error("APK error: {0}")]
    Apk(#[from] ApkError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors from the Google Play publishing API
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API rejected the supplied credentials
    #[error("credentials were rejected: {reason}")]
    Credentials {
        /// Reason reported by the server
        reason: String,
    },

    /// A request timed out before the server responded
    #[error("request timed out during {operation}")]
    Timeout {
        /// Operation that timed out
        operation: String,
    },

    /// The API returned a non-2xx response
    #[error("API call failed with HTTP {status}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Human-readable error messages from the response body
        messages: Vec<String>,
    },

    /// The HTTP transport failed before a response was received
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A local file scheduled for upload could not be read
    #[error("failed to read '{path}' for upload: {source}", path = .path.display())]
    File {
        /// Path to the file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Whether this error is the "no such resource" signal (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }

    /// Render the server-provided error messages, one per line.
    pub fn message_lines(&self) -> String {
        match self {
            ApiError::Api { messages, .. } if !messages.is_empty() => {
                let mut out = String::new();
                for message in messages {
                    out.push_str("- ");
                    out.push_str(message);
                    out.push('\n');
                }
                out
            }
            other => format!("- {}\n", other),
        }
    }
}

/// Local APK inspection errors
#[derive(Error, Debug)]
pub enum ApkError {
    /// The file could not be read
    #[error("failed to read '{path}': {source}", path = .path.display())]
    Io {
        /// Path to the APK
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid ZIP archive
    #[error("'{path}' is not a valid APK archive: {source}", path = .path.display())]
    NotAnArchive {
        /// Path to the APK
        path: PathBuf,
        /// Underlying ZIP error
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive has no AndroidManifest.xml entry
    #[error("'{path}' has no AndroidManifest.xml", path = .path.display())]
    MissingManifest {
        /// Path to the APK
        path: PathBuf,
    },

    /// The binary manifest could not be parsed
    #[error("failed to parse manifest of '{path}': {reason}", path = .path.display())]
    Manifest {
        /// Path to the APK
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// The APKs in one upload carry different application ids
    #[error("'{path}' has application ID '{found}', but this upload is for '{expected}'", path = .path.display())]
    ApplicationIdMismatch {
        /// Path to the offending APK
        path: PathBuf,
        /// Application ID of the upload
        expected: String,
        /// Application ID found in the APK
        found: String,
    },
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

impl PublishError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PublishError::Api(ApiError::Credentials { .. }) => vec![
                "Check that the access token in PLAY_API_TOKEN (or --token) is current".to_string(),
                "Verify the service account has release permission for this application".to_string(),
            ],
            PublishError::Api(ApiError::Api { status: 404, .. }) => vec![
                "Check the application ID: the app must already exist in the Play Console".to_string(),
            ],
            PublishError::Api(ApiError::Timeout { .. }) => vec![
                "The Google Play API is prone to transient timeouts; re-run the upload".to_string(),
            ],
            PublishError::Apk(ApkError::ApplicationIdMismatch { .. }) => vec![
                "All APKs in one upload must belong to the same application".to_string(),
                "Split the upload into one invocation per application".to_string(),
            ],
            PublishError::Apk(_) => vec![
                "Verify the file is a signed release APK produced by your build".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable by retrying
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PublishError::Api(ApiError::Credentials { .. })
                | PublishError::Api(ApiError::File { .. })
                | PublishError::Apk(_)
                | PublishError::Cli(_)
        )
    }
}
