//! Defines the capabilities a deployment needs from the outside
//! world: somewhere to store the artifact, and a function service to
//! point at it.

use crate::error::InvalidRequest;
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs::File;

/// Function names, partial ARNs and full ARNs, optionally qualified
/// with a version or alias.
static FUNCTION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(arn:(aws[a-zA-Z\-]*)?:lambda:)?([a-z]{2}(-gov)?-[a-z]+-\d{1}:)?(\d{12}:)?(function:)?([a-zA-Z0-9_.\-]+)(:(\$LATEST|[a-zA-Z0-9_\-]+))?$",
    )
    .expect("function name pattern is valid")
});

static BUCKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z.\-_]+$").expect("bucket pattern is valid"));

const MAX_FUNCTION_NAME_LEN: usize = 140;
const MIN_BUCKET_LEN: usize = 3;
const MAX_BUCKET_LEN: usize = 63;
const MAX_KEY_LEN: usize = 1024;

/// A request to replace a function's code with an object in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCodeRequest {
    pub function_name: String,
    pub bucket: String,
    pub key: String,
}

impl UpdateCodeRequest {
    /// Check the request against the naming rules of the function
    /// service, without contacting it.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if self.function_name.is_empty() {
            return Err(InvalidRequest::new("function name", "is empty"));
        }
        if self.function_name.len() > MAX_FUNCTION_NAME_LEN {
            return Err(InvalidRequest::new(
                "function name",
                format!("is longer than {} characters", MAX_FUNCTION_NAME_LEN),
            ));
        }
        if !FUNCTION_NAME_RE.is_match(&self.function_name) {
            return Err(InvalidRequest::new(
                "function name",
                format!("{:?} is neither a function name nor an ARN", self.function_name),
            ));
        }

        if self.bucket.is_empty() {
            return Err(InvalidRequest::new("bucket", "is empty"));
        }
        if !(MIN_BUCKET_LEN..=MAX_BUCKET_LEN).contains(&self.bucket.len()) {
            return Err(InvalidRequest::new(
                "bucket",
                format!(
                    "must be between {} and {} characters long",
                    MIN_BUCKET_LEN, MAX_BUCKET_LEN
                ),
            ));
        }
        if !BUCKET_RE.is_match(&self.bucket) || self.bucket.ends_with('.') {
            return Err(InvalidRequest::new(
                "bucket",
                format!("{:?} is not a valid bucket name", self.bucket),
            ));
        }

        if self.key.is_empty() {
            return Err(InvalidRequest::new("key", "is empty"));
        }
        if self.key.len() > MAX_KEY_LEN {
            return Err(InvalidRequest::new(
                "key",
                format!("is longer than {} bytes", MAX_KEY_LEN),
            ));
        }
        Ok(())
    }
}

/// Object storage.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store the contents of `body` under `key` in `bucket`. The file
    /// is consumed, and closed once the upload is over.
    async fn upload(&self, bucket: &str, key: &str, body: File) -> Result<()>;
}

/// Serverless function control plane.
#[async_trait]
pub trait Compute: Send + Sync {
    /// Local structural check run before [`Compute::update_code`].
    fn validate(&self, request: &UpdateCodeRequest) -> Result<(), InvalidRequest> {
        request.validate()
    }

    /// Point the function at the object named in the request.
    async fn update_code(&self, request: &UpdateCodeRequest) -> Result<()>;
}
