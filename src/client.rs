//! Defines the S3 and Lambda clients that carry out a deployment.

use crate::conf::DeploymentRequest;
use crate::service::{Compute, Storage, UpdateCodeRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{from_env, SdkConfig};
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use tokio::fs::File;
use tracing::info;

/// Name under which the passed-through credentials are reported by
/// the SDK.
const CREDENTIALS_SOURCE: &str = "deployment-request";

/// Prepend a scheme to endpoints given as a bare host.
pub fn normalize_endpoint_url(endpoint_url: &str) -> String {
    if endpoint_url.starts_with("http://") || endpoint_url.starts_with("https://") {
        String::from(endpoint_url)
    } else {
        format!("https://{}", endpoint_url)
    }
}

/// Build the shared service configuration from the region and
/// credentials in the request.
pub async fn aws_config(
    request: &DeploymentRequest,
    session_token: Option<&str>,
    endpoint_url: Option<&str>,
) -> SdkConfig {
    let credentials = Credentials::new(
        &request.access_key_id,
        &request.secret_access_key,
        session_token.map(String::from),
        None,
        CREDENTIALS_SOURCE,
    );
    let loader = from_env()
        .region(Region::new(request.region.clone()))
        .credentials_provider(credentials);
    if let Some(endpoint_url) = endpoint_url {
        loader.endpoint_url(normalize_endpoint_url(endpoint_url))
    } else {
        loader
    }
    .load()
    .await
}

/// Object storage backed by S3.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
}

impl S3Storage {
    /// Path-style addressing is needed when the endpoint was
    /// overridden, since emulators rarely serve bucket subdomains.
    pub fn new(config: &SdkConfig, path_style: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(path_style)
            .build();
        S3Storage {
            client: aws_sdk_s3::Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(&self, bucket: &str, key: &str, body: File) -> Result<()> {
        let body = ByteStream::read_from()
            .file(body)
            .build()
            .await
            .with_context(|| format!("Failed to read the contents of {:?} for upload", key))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to upload remote object {:?} in bucket {:?}",
                    key, bucket
                )
            })?;
        Ok(())
    }
}

/// Function control plane backed by Lambda.
pub struct LambdaCompute {
    client: aws_sdk_lambda::Client,
}

impl LambdaCompute {
    pub fn new(config: &SdkConfig) -> Self {
        LambdaCompute {
            client: aws_sdk_lambda::Client::new(config),
        }
    }
}

#[async_trait]
impl Compute for LambdaCompute {
    async fn update_code(&self, request: &UpdateCodeRequest) -> Result<()> {
        let output = self
            .client
            .update_function_code()
            .function_name(&request.function_name)
            .s3_bucket(&request.bucket)
            .s3_key(&request.key)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to point function {:?} at object {:?} in bucket {:?}",
                    request.function_name, request.key, request.bucket
                )
            })?;
        info!(
            revision = output.revision_id().unwrap_or_default(),
            code_sha256 = output.code_sha256().unwrap_or_default(),
            "Function code replaced"
        );
        Ok(())
    }
}
