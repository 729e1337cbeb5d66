use tracing::{info, warn};

use crate::archive::BuiltArchive;
use crate::config::DeployConfig;
use crate::credentials::{extract_credentials, AssumedRole, BaseCredentials, TemporaryCredentials};
use crate::error::DeployError;

/// Produces the archive at `config.archive_path`.
pub trait ArchiveBuilder {
    fn build(&self, config: &DeployConfig) -> Result<(), DeployError>;
}

pub trait RoleAssumer {
    fn assume_role(
        &self,
        base: &BaseCredentials,
        request: &AssumeRoleRequest,
    ) -> Result<AssumedRole, DeployError>;
}

pub trait FunctionUpdater {
    fn update_function_code(
        &self,
        credentials: &TemporaryCredentials,
        request: &UpdateCodeRequest<'_>,
    ) -> Result<UpdatedFunction, DeployError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub region: String,
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCodeRequest<'a> {
    pub function_name: String,
    pub region: String,
    pub zip_file: &'a [u8],
    pub publish: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatedFunction {
    pub function_arn: Option<String>,
    pub code_sha256: Option<String>,
    pub version: Option<String>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub function: String,
    pub function_arn: Option<String>,
    pub code_sha256: String,
    pub version: Option<String>,
    pub last_modified: Option<String>,
    pub session_name: String,
    pub assumed_role_arn: Option<String>,
    pub archive_bytes: usize,
}

/// Runs build, role assumption and code update in order, stopping at the first failure.
///
/// The build always runs first; only the build settings are checked before it.
pub fn run_deploy(
    config: &DeployConfig,
    base: &BaseCredentials,
    builder: &dyn ArchiveBuilder,
    assumer: &dyn RoleAssumer,
    updater: &dyn FunctionUpdater,
) -> Result<DeployReport, DeployError> {
    config.validate_build()?;

    info!(command = %config.build_command, "building archive");
    builder.build(config)?;
    let archive = BuiltArchive::read(&config.archive_path)?;
    let local_sha256 = archive.sha256_base64();
    info!(
        path = %archive.path.display(),
        bytes = archive.len(),
        sha256 = %local_sha256,
        "archive ready"
    );

    config.validate_target()?;
    base.validate()?;
    let function = config.function_target();
    let session_name = config.session_name();

    let request = AssumeRoleRequest {
        role_arn: config.role_arn.clone(),
        session_name: session_name.clone(),
        region: config.region.clone(),
        duration_seconds: config.session_duration_seconds,
    };
    info!(role_arn = %request.role_arn, session = %session_name, "assuming deploy role");
    let assumed = assumer.assume_role(base, &request)?;
    let credentials = extract_credentials(&assumed)?;
    info!(
        access_key_id = %credentials.access_key_id,
        expiration = credentials.expiration.as_deref().unwrap_or("unknown"),
        "obtained temporary credentials"
    );

    let update = UpdateCodeRequest {
        function_name: function.clone(),
        region: config.region.clone(),
        zip_file: &archive.bytes,
        publish: config.publish,
    };
    info!(
        function = %function,
        region = %config.region,
        publish = config.publish,
        "updating function code"
    );
    let updated = updater.update_function_code(&credentials, &update)?;

    match updated.code_sha256.as_deref() {
        Some(reported) if reported != local_sha256 => {
            return Err(DeployError::DigestMismatch {
                local: local_sha256,
                reported: reported.to_string(),
            });
        }
        Some(_) => {}
        None => warn!(function = %function, "update response carried no code digest"),
    }

    info!(
        function = %function,
        version = updated.version.as_deref().unwrap_or("$LATEST"),
        "function code updated"
    );

    Ok(DeployReport {
        function,
        function_arn: updated.function_arn,
        code_sha256: local_sha256,
        version: updated.version,
        last_modified: updated.last_modified,
        session_name,
        assumed_role_arn: assumed.role_arn().map(str::to_string),
        archive_bytes: archive.len(),
    })
}
