use std::path::PathBuf;

use crate::error::DeployError;
use crate::session::role_session_name;

pub const DEFAULT_FUNCTION_NAME: &str = "bucket-antivirus-function";
pub const DEFAULT_ARCHIVE_PATH: &str = "build/lambda.zip";
pub const DEFAULT_BUILD_COMMAND: &str = "make archive";

/// Everything the deploy run needs apart from credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub branch_ref: String,
    pub region: String,
    pub role_arn: String,
    pub account_id: Option<String>,
    pub function_name: String,
    pub archive_path: PathBuf,
    pub build_command: String,
    pub publish: bool,
    pub session_duration_seconds: Option<i32>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            branch_ref: String::new(),
            region: String::new(),
            role_arn: String::new(),
            account_id: None,
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            publish: false,
            session_duration_seconds: None,
        }
    }
}

impl DeployConfig {
    pub fn validate(&self) -> Result<(), DeployError> {
        self.validate_build()?;
        self.validate_target()
    }

    /// Checks the build step depends on; everything else waits until the archive exists.
    pub fn validate_build(&self) -> Result<(), DeployError> {
        if self.build_argv().is_empty() {
            return Err(DeployError::Config(
                "DEPLOY_BUILD_COMMAND must not be empty".to_string(),
            ));
        }
        if self.archive_path.as_os_str().is_empty() {
            return Err(DeployError::Config(
                "DEPLOY_ARCHIVE_PATH must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Region, role and function checks, run after the build.
    pub fn validate_target(&self) -> Result<(), DeployError> {
        if self.region.trim().is_empty() {
            return Err(DeployError::Config(
                "AWS_DEFAULT_REGION must be configured".to_string(),
            ));
        }
        if self.role_arn.trim().is_empty() {
            return Err(DeployError::Config(
                "DEPLOY_ROLE_ARN must be configured".to_string(),
            ));
        }
        if !self.role_arn.starts_with("arn:") {
            return Err(DeployError::Config(format!(
                "DEPLOY_ROLE_ARN must be an ARN, got `{}`",
                self.role_arn
            )));
        }
        if self.function_name.trim().is_empty() {
            return Err(DeployError::Config(
                "LAMBDA_FUNCTION_NAME must not be empty".to_string(),
            ));
        }
        if let Some(account_id) = &self.account_id {
            if account_id.len() != 12 || !account_id.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(DeployError::Config(format!(
                    "AWS_ACCOUNT_ID must be a 12 digit account number, got `{account_id}`"
                )));
            }
        }
        if let Some(seconds) = self.session_duration_seconds {
            if !(900..=43_200).contains(&seconds) {
                return Err(DeployError::Config(format!(
                    "DEPLOY_SESSION_DURATION_SECONDS must be between 900 and 43200, got {seconds}"
                )));
            }
        }
        Ok(())
    }

    /// The identifier passed to the code-update call.
    ///
    /// A name plus account id becomes a full function ARN; an ARN is used as-is.
    pub fn function_target(&self) -> String {
        if self.function_name.starts_with("arn:") {
            return self.function_name.clone();
        }
        match &self.account_id {
            Some(account_id) => format!(
                "arn:aws:lambda:{}:{}:function:{}",
                self.region, account_id, self.function_name
            ),
            None => self.function_name.clone(),
        }
    }

    pub fn session_name(&self) -> String {
        role_session_name(&self.branch_ref)
    }

    /// Build command split on whitespace into program and arguments.
    pub fn build_argv(&self) -> Vec<String> {
        self.build_command
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
