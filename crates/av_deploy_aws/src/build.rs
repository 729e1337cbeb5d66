use std::path::PathBuf;
use std::process::Command;

use av_deploy_core::config::DeployConfig;
use av_deploy_core::deploy::ArchiveBuilder;
use av_deploy_core::error::DeployError;
use tracing::info;

/// Runs the configured build command (`make archive` by default) with inherited stdio.
#[derive(Debug, Clone, Default)]
pub struct CommandArchiveBuilder {
    pub working_dir: Option<PathBuf>,
}

impl ArchiveBuilder for CommandArchiveBuilder {
    fn build(&self, config: &DeployConfig) -> Result<(), DeployError> {
        let argv = config.build_argv();
        let Some((program, args)) = argv.split_first() else {
            return Err(DeployError::Config(
                "DEPLOY_BUILD_COMMAND must not be empty".to_string(),
            ));
        };

        info!("+ {}", argv.join(" "));
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|source| DeployError::BuildSpawn {
            command: config.build_command.clone(),
            source,
        })?;
        if !status.success() {
            return Err(DeployError::BuildFailed {
                command: config.build_command.clone(),
                code: status.code(),
            });
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn config_with(command: &str) -> DeployConfig {
        DeployConfig {
            build_command: command.to_string(),
            ..DeployConfig::default()
        }
    }

    #[test]
    fn successful_command_is_ok() {
        let builder = CommandArchiveBuilder::default();
        assert!(builder.build(&config_with("true")).is_ok());
    }

    #[test]
    fn failing_command_reports_exit_code() {
        let builder = CommandArchiveBuilder::default();
        let error = builder
            .build(&config_with("false"))
            .expect_err("false exits non-zero");
        assert!(matches!(
            error,
            DeployError::BuildFailed { code: Some(1), .. }
        ));
    }

    #[test]
    fn unknown_program_is_a_spawn_error() {
        let builder = CommandArchiveBuilder::default();
        let error = builder
            .build(&config_with("definitely-not-a-real-build-tool archive"))
            .expect_err("spawn fails");
        assert!(matches!(error, DeployError::BuildSpawn { .. }));
    }

    #[test]
    fn runs_in_working_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let builder = CommandArchiveBuilder {
            working_dir: Some(dir.path().to_path_buf()),
        };
        builder
            .build(&config_with("touch lambda.zip"))
            .expect("touch succeeds");
        assert!(dir.path().join("lambda.zip").exists());
    }
}
