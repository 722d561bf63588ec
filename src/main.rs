use s3_lambda_deploy::app::{self, Deployment};
use s3_lambda_deploy::client::{self, LambdaCompute, S3Storage};
use s3_lambda_deploy::conf::{self, Settings};
use s3_lambda_deploy::error::{ConfigError, DeployError};
use s3_lambda_deploy::report::Report;
use std::process::ExitCode;
use tracing::{info, Level};

/// Load the request, build the service clients, and deploy.
async fn run(
    settings: Result<Settings, ConfigError>,
    report: &Report,
) -> Result<Deployment, DeployError> {
    let settings = settings?;
    settings.log_level()?;
    let request = conf::load()?;
    let config = client::aws_config(
        &request,
        settings.session_token(),
        settings.endpoint_url(),
    )
    .await;
    let storage = S3Storage::new(&config, settings.endpoint_url().is_some());
    let compute = LambdaCompute::new(&config);
    app::deploy(&request, &storage, &compute, report).await
}

/// Upload the file named by `FILE_PATH` to S3 and update the code of
/// the Lambda function named by `LAMBDA_FUNC` to the uploaded object.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = Settings::from_env();
    let level = settings
        .as_ref()
        .ok()
        .and_then(|s| s.log_level().ok())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
    let report = Report::new(settings.as_ref().map_or(false, |s| s.status_markers));

    match run(settings, &report).await {
        Ok(deployment) => {
            info!(key = %deployment.key, "Deployment finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report.failure(&e);
            e.exit_code()
        }
    }
}
