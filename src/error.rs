//! Defines the errors that end a deployment, and the process exit
//! code each of them maps to.

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Problems with the configuration given to the deployment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("input incomplete, missing or empty: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("couldn't read settings from the environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid file name {name:?}: {reason}")]
    InvalidFileName { name: String, reason: &'static str },

    #[error("no unique identifier left for the current millisecond")]
    IdExhausted,
}

/// A structurally malformed request to the compute service.
#[derive(Debug, Error)]
#[error("{field} {reason}")]
pub struct InvalidRequest {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidRequest {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        InvalidRequest {
            field,
            reason: reason.into(),
        }
    }
}

/// The stage at which a deployment failed.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to derive a versioned file name")]
    InvalidFileName(#[source] ConfigError),

    #[error("Failed to open file {path:?}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to upload file as {key:?} to bucket {bucket:?}")]
    UploadFailed {
        bucket: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Refused to send a malformed function code update")]
    InvalidUpdateRequest(#[source] InvalidRequest),

    #[error("Failed to update code of function {function_name:?}")]
    UpdateFailed {
        function_name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DeployError {
    /// The numeric process exit status for this error.
    pub fn code(&self) -> u8 {
        match self {
            DeployError::Config(_) => 2,
            DeployError::InvalidFileName(_) => 3,
            DeployError::FileOpen { .. } => 4,
            DeployError::UploadFailed { .. } => 5,
            DeployError::InvalidUpdateRequest(_) => 6,
            DeployError::UpdateFailed { .. } => 7,
        }
    }

    /// The process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}
