use std::path::PathBuf;

use av_deploy_core::config::{
    DeployConfig, DEFAULT_ARCHIVE_PATH, DEFAULT_BUILD_COMMAND, DEFAULT_FUNCTION_NAME,
};
use av_deploy_core::credentials::BaseCredentials;
use clap::builder::FalseyValueParser;
use clap::Parser;

/// Environment-driven deploy settings. CI passes everything through the
/// environment; the flags exist for local runs.
#[derive(Debug, Parser)]
#[command(
    name = "deploy",
    about = "Build the antivirus function archive and replace the deployed function code",
    long_about = "Builds the archive, assumes the deploy role with the base keys (any\n\
                  AWS_SESSION_TOKEN is ignored) and uploads the archive to the function."
)]
pub struct DeployArgs {
    /// Git reference being deployed, used for the role session name
    #[arg(long, env = "GITHUB_REF", default_value = "")]
    pub branch_ref: String,
    /// Region for role assumption and the function update
    #[arg(long, env = "AWS_DEFAULT_REGION")]
    pub region: String,
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: String,
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: String,
    /// Role assumed for the deploy
    #[arg(long, env = "DEPLOY_ROLE_ARN")]
    pub role_arn: String,
    /// Account that owns the function
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    pub account_id: Option<String>,
    #[arg(long, env = "LAMBDA_FUNCTION_NAME", default_value = DEFAULT_FUNCTION_NAME)]
    pub function_name: String,
    /// Archive produced by the build command
    #[arg(long, env = "DEPLOY_ARCHIVE_PATH", default_value = DEFAULT_ARCHIVE_PATH)]
    pub archive_path: PathBuf,
    #[arg(long, env = "DEPLOY_BUILD_COMMAND", default_value = DEFAULT_BUILD_COMMAND)]
    pub build_command: String,
    /// Publish a new function version with the update; `0`, `no`, `false` and `off` disable it
    #[arg(long, env = "DEPLOY_PUBLISH", value_parser = FalseyValueParser::new())]
    pub publish: bool,
    #[arg(long, env = "DEPLOY_SESSION_DURATION_SECONDS")]
    pub session_duration_seconds: Option<i32>,
}

impl DeployArgs {
    pub fn into_parts(self) -> (DeployConfig, BaseCredentials) {
        let config = DeployConfig {
            branch_ref: self.branch_ref,
            region: self.region,
            role_arn: self.role_arn,
            account_id: self
                .account_id
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            function_name: self.function_name,
            archive_path: self.archive_path,
            build_command: self.build_command,
            publish: self.publish,
            session_duration_seconds: self.session_duration_seconds,
        };
        let base = BaseCredentials::new(self.access_key_id, self.secret_access_key);
        (config, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> DeployArgs {
        let mut argv = vec![
            "deploy",
            "--region",
            "us-east-1",
            "--access-key-id",
            "AKIABASE",
            "--secret-access-key",
            "base-secret",
            "--role-arn",
            "arn:aws:iam::123456789012:role/deployer",
        ];
        argv.extend_from_slice(extra);
        DeployArgs::try_parse_from(argv).expect("args parse")
    }

    #[test]
    fn flags_map_into_config_and_base_keys() {
        let args = parse(&[
            "--branch-ref",
            "refs/heads/main",
            "--account-id",
            "123456789012",
            "--function-name",
            "scanner",
            "--archive-path",
            "dist/scanner.zip",
            "--publish",
            "--session-duration-seconds",
            "1800",
        ]);
        let (config, base) = args.into_parts();

        assert_eq!(config.branch_ref, "refs/heads/main");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.account_id.as_deref(), Some("123456789012"));
        assert_eq!(config.function_name, "scanner");
        assert_eq!(config.archive_path, PathBuf::from("dist/scanner.zip"));
        assert!(config.publish);
        assert_eq!(config.session_duration_seconds, Some(1800));
        assert_eq!(base, BaseCredentials::new("AKIABASE", "base-secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_account_id_becomes_none() {
        let (config, _) = parse(&["--account-id", "  "]).into_parts();
        assert_eq!(config.account_id, None);
    }
}
