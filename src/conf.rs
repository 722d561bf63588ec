//! Defines configuration as read from the environment.

use crate::error::ConfigError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use tracing::Level;

/// Default `log_level` value.
fn default_log_level() -> String {
    String::from("info")
}

/// Read a boolean flag, treating an empty value as unset.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        Ok(false)
    } else {
        value.parse().map_err(D::Error::custom)
    }
}

/// The deployment is configured entirely through environment
/// variables. The seven required ones are kept as plain strings here
/// so that missing and empty values can be reported together by
/// [`Settings::request`].
#[derive(Deserialize)]
pub struct Settings {
    /// Path of the local file to deploy.
    #[serde(default)]
    pub file_path: String,

    #[serde(default)]
    pub aws_access_key_id: String,

    #[serde(default)]
    pub aws_secret_access_key: String,

    #[serde(default)]
    pub aws_region: String,

    /// Bucket that receives the uploaded file.
    #[serde(default)]
    pub bucket_address: String,

    /// Base name the versioned object key is derived from, e.g.
    /// `build.zip`. May carry a key prefix such as `releases/build.zip`.
    #[serde(default)]
    pub file_name: String,

    /// Name or ARN of the function whose code gets updated.
    #[serde(default)]
    pub lambda_func: String,

    /// Temporary session token, passed along with the credentials.
    #[serde(default)]
    pub aws_session_token: Option<String>,

    /// Overrides the service endpoint, for use against local
    /// emulators.
    #[serde(default)]
    pub aws_endpoint_url: Option<String>,

    /// Maximum level of the emitted log lines.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prefix each status line with a success or failure marker.
    #[serde(default, deserialize_with = "flag")]
    pub status_markers: bool,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env()?)
    }

    /// Read settings from arbitrary key/value pairs, named as the
    /// environment variables would be.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// The configured log level.
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level.parse().map_err(|_| ConfigError::Invalid {
            var: "LOG_LEVEL",
            reason: format!(
                "{:?} is not one of trace, debug, info, warn or error",
                self.log_level
            ),
        })
    }

    pub fn session_token(&self) -> Option<&str> {
        self.aws_session_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.aws_endpoint_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Validate the required values as a group, producing the
    /// deployment request only if none of them is empty.
    pub fn request(&self) -> Result<DeploymentRequest, ConfigError> {
        let required = [
            ("FILE_PATH", &self.file_path),
            ("AWS_ACCESS_KEY_ID", &self.aws_access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &self.aws_secret_access_key),
            ("AWS_REGION", &self.aws_region),
            ("BUCKET_ADDRESS", &self.bucket_address),
            ("FILE_NAME", &self.file_name),
            ("LAMBDA_FUNC", &self.lambda_func),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(var, _)| *var)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Incomplete { missing });
        }
        Ok(DeploymentRequest {
            file_path: PathBuf::from(&self.file_path),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            region: self.aws_region.clone(),
            bucket: self.bucket_address.clone(),
            file_name: self.file_name.clone(),
            function_name: self.lambda_func.clone(),
        })
    }
}

/// A validated deployment request: every field is non-empty.
#[derive(Clone)]
pub struct DeploymentRequest {
    pub file_path: PathBuf,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub file_name: String,
    pub function_name: String,
}

impl fmt::Debug for DeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentRequest")
            .field("file_path", &self.file_path)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("file_name", &self.file_name)
            .field("function_name", &self.function_name)
            .finish()
    }
}

/// Load the deployment request from the process environment.
pub fn load() -> Result<DeploymentRequest, ConfigError> {
    Settings::from_env()?.request()
}

/// Load the deployment request from the given key/value pairs.
pub fn load_from<I>(vars: I) -> Result<DeploymentRequest, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    Settings::from_vars(vars)?.request()
}
