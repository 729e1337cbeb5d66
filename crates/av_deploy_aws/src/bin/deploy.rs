use std::process::ExitCode;

use av_deploy_aws::adapters::lambda::LambdaFunctionUpdater;
use av_deploy_aws::adapters::sts::StsRoleAssumer;
use av_deploy_aws::build::CommandArchiveBuilder;
use av_deploy_aws::cli::DeployArgs;
use av_deploy_core::deploy::run_deploy;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let (config, base) = DeployArgs::parse().into_parts();

    let outcome = run_deploy(
        &config,
        &base,
        &CommandArchiveBuilder::default(),
        &StsRoleAssumer,
        &LambdaFunctionUpdater,
    );

    match outcome {
        Ok(report) => {
            info!(
                function = %report.function,
                function_arn = report.function_arn.as_deref().unwrap_or("unknown"),
                code_sha256 = %report.code_sha256,
                version = report.version.as_deref().unwrap_or("$LATEST"),
                last_modified = report.last_modified.as_deref().unwrap_or("unknown"),
                session = %report.session_name,
                assumed_role_arn = report.assumed_role_arn.as_deref().unwrap_or("unknown"),
                archive_bytes = report.archive_bytes,
                "deploy finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(step = err.step(), "deploy failed: {err}");
            ExitCode::FAILURE
        }
    }
}
