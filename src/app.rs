//! Defines the deployment sequence: upload the artifact under a
//! versioned key, then point the function at it.

use crate::conf::DeploymentRequest;
use crate::error::DeployError;
use crate::naming::versioned_name;
use crate::report::Report;
use crate::service::{Compute, Storage, UpdateCodeRequest};
use tokio::fs::File;
use tracing::{debug, instrument};

/// The outcome of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub function_name: String,
    pub bucket: String,
    /// The versioned key the function now runs from.
    pub key: String,
}

/// Run one deployment. Each stage only starts once the previous one
/// succeeded; nothing is retried, and an uploaded object is left in
/// place if the function update fails.
#[instrument(skip_all, fields(bucket = %request.bucket, function = %request.function_name))]
pub async fn deploy<S, C>(
    request: &DeploymentRequest,
    storage: &S,
    compute: &C,
    report: &Report,
) -> Result<Deployment, DeployError>
where
    S: Storage + ?Sized,
    C: Compute + ?Sized,
{
    let file = File::open(&request.file_path)
        .await
        .map_err(|source| DeployError::FileOpen {
            path: request.file_path.clone(),
            source,
        })?;

    // The file is dropped, and so closed, on the early return.
    let key = versioned_name(&request.file_name).map_err(DeployError::InvalidFileName)?;
    debug!(%key, "Derived versioned key");

    storage
        .upload(&request.bucket, &key, file)
        .await
        .map_err(|source| DeployError::UploadFailed {
            bucket: request.bucket.clone(),
            key: key.clone(),
            source,
        })?;
    report.success(&format!(
        "File uploaded to S3 as {:?} in bucket {:?}",
        key, request.bucket
    ));

    let update = UpdateCodeRequest {
        function_name: request.function_name.clone(),
        bucket: request.bucket.clone(),
        key,
    };
    compute
        .validate(&update)
        .map_err(DeployError::InvalidUpdateRequest)?;
    compute
        .update_code(&update)
        .await
        .map_err(|source| DeployError::UpdateFailed {
            function_name: update.function_name.clone(),
            source,
        })?;
    report.success(&format!(
        "Successfully updated Lambda function {:?}",
        update.function_name
    ));

    Ok(Deployment {
        function_name: update.function_name,
        bucket: update.bucket,
        key: update.key,
    })
}
