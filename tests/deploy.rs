use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use s3_lambda_deploy::app::deploy;
use s3_lambda_deploy::conf::{load_from, DeploymentRequest};
use s3_lambda_deploy::error::{ConfigError, DeployError};
use s3_lambda_deploy::report::Report;
use s3_lambda_deploy::service::{Compute, Storage, UpdateCodeRequest};
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const CONTENTS: &[u8] = b"PK\x03\x04 not really a zip";

/// Storage that keeps every upload in memory.
#[derive(Default)]
struct RecordingStorage {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    fail: bool,
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn upload(&self, bucket: &str, key: &str, mut body: File) -> Result<()> {
        let mut contents = Vec::new();
        body.read_to_end(&mut contents).await?;
        self.uploads
            .lock()
            .unwrap()
            .push((String::from(bucket), String::from(key), contents));
        if self.fail {
            Err(anyhow!("bucket is unreachable"))
        } else {
            Ok(())
        }
    }
}

/// Compute service that keeps every update request in memory.
#[derive(Default)]
struct RecordingCompute {
    updates: Mutex<Vec<UpdateCodeRequest>>,
    fail: bool,
}

#[async_trait]
impl Compute for RecordingCompute {
    async fn update_code(&self, request: &UpdateCodeRequest) -> Result<()> {
        self.updates.lock().unwrap().push(request.clone());
        if self.fail {
            Err(anyhow!("function is being updated"))
        } else {
            Ok(())
        }
    }
}

fn artifact() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONTENTS).unwrap();
    file
}

fn vars(file_path: &str, overrides: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut vars: Vec<(String, String)> = [
        ("FILE_PATH", file_path),
        ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
        ("AWS_REGION", "eu-west-1"),
        ("BUCKET_ADDRESS", "artifacts"),
        ("FILE_NAME", "build.zip"),
        ("LAMBDA_FUNC", "my-function"),
    ]
    .iter()
    .map(|(k, v)| (String::from(*k), String::from(*v)))
    .collect();
    for (key, value) in overrides {
        for var in vars.iter_mut().filter(|(k, _)| k.as_str() == *key) {
            var.1 = String::from(*value);
        }
    }
    vars
}

fn request(file: &NamedTempFile, overrides: &[(&str, &str)]) -> DeploymentRequest {
    load_from(vars(file.path().to_str().unwrap(), overrides)).unwrap()
}

#[tokio::test]
async fn uploads_then_updates_with_the_same_key() {
    let file = artifact();
    let storage = RecordingStorage::default();
    let compute = RecordingCompute::default();

    let deployment = deploy(&request(&file, &[]), &storage, &compute, &Report::default())
        .await
        .unwrap();

    let key_re = Regex::new(r"^build-[0-9A-HJKMNP-TV-Z]{26}\.zip$").unwrap();
    assert!(key_re.is_match(&deployment.key), "{}", deployment.key);
    assert_eq!(deployment.bucket, "artifacts");
    assert_eq!(deployment.function_name, "my-function");

    let uploads = storage.uploads.lock().unwrap();
    assert_eq!(
        *uploads,
        vec![(
            String::from("artifacts"),
            deployment.key.clone(),
            CONTENTS.to_vec()
        )]
    );
    let updates = compute.updates.lock().unwrap();
    assert_eq!(
        *updates,
        vec![UpdateCodeRequest {
            function_name: String::from("my-function"),
            bucket: String::from("artifacts"),
            key: deployment.key.clone(),
        }]
    );
}

#[tokio::test]
async fn every_run_gets_a_new_key() {
    let file = artifact();
    let storage = RecordingStorage::default();
    let compute = RecordingCompute::default();
    let request = request(&file, &[]);

    let first = deploy(&request, &storage, &compute, &Report::default())
        .await
        .unwrap();
    let second = deploy(&request, &storage, &compute, &Report::default())
        .await
        .unwrap();

    assert_ne!(first.key, second.key);
    assert_eq!(storage.uploads.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_file_stops_before_any_call() {
    let file = artifact();
    let mut request = request(&file, &[]);
    request.file_path = file.path().with_extension("missing");
    let storage = RecordingStorage::default();
    let compute = RecordingCompute::default();

    let result = deploy(&request, &storage, &compute, &Report::default()).await;

    assert!(matches!(result, Err(DeployError::FileOpen { .. })));
    assert!(storage.uploads.lock().unwrap().is_empty());
    assert!(compute.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn bad_file_name_stops_before_upload() {
    let file = artifact();
    let storage = RecordingStorage::default();
    let compute = RecordingCompute::default();

    let result = deploy(
        &request(&file, &[("FILE_NAME", "build")]),
        &storage,
        &compute,
        &Report::default(),
    )
    .await;

    assert!(matches!(result, Err(DeployError::InvalidFileName(_))));
    assert!(storage.uploads.lock().unwrap().is_empty());
    assert!(compute.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_upload_skips_the_update() {
    let file = artifact();
    let storage = RecordingStorage {
        fail: true,
        ..Default::default()
    };
    let compute = RecordingCompute::default();

    let result = deploy(&request(&file, &[]), &storage, &compute, &Report::default()).await;

    match result {
        Err(DeployError::UploadFailed { bucket, key, .. }) => {
            assert_eq!(bucket, "artifacts");
            assert!(key.starts_with("build-"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(storage.uploads.lock().unwrap().len(), 1);
    assert!(compute.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_update_is_not_sent() {
    let file = artifact();
    let storage = RecordingStorage::default();
    let compute = RecordingCompute::default();

    let result = deploy(
        &request(&file, &[("LAMBDA_FUNC", "not a function")]),
        &storage,
        &compute,
        &Report::default(),
    )
    .await;

    assert!(matches!(result, Err(DeployError::InvalidUpdateRequest(_))));
    // The artifact stays uploaded.
    assert_eq!(storage.uploads.lock().unwrap().len(), 1);
    assert!(compute.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_update_leaves_the_upload_in_place() {
    let file = artifact();
    let storage = RecordingStorage::default();
    let compute = RecordingCompute {
        fail: true,
        ..Default::default()
    };

    let result = deploy(&request(&file, &[]), &storage, &compute, &Report::new(true)).await;

    let err = result.unwrap_err();
    assert_eq!(err.code(), 7);
    match err {
        DeployError::UpdateFailed { function_name, .. } => {
            assert_eq!(function_name, "my-function")
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(storage.uploads.lock().unwrap().len(), 1);
    assert_eq!(compute.updates.lock().unwrap().len(), 1);
}

#[test]
fn empty_file_name_is_caught_before_deploying() {
    let file = artifact();
    let result = load_from(vars(file.path().to_str().unwrap(), &[("FILE_NAME", "")]));
    match result {
        Err(ConfigError::Incomplete { missing }) => assert_eq!(missing, vec!["FILE_NAME"]),
        other => panic!("unexpected {:?}", other),
    }
}
