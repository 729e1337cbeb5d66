use std::path::PathBuf;

use thiserror::Error;

/// A deploy step failed. There is no local recovery: the first error ends the run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid deploy configuration: {0}")]
    Config(String),

    #[error("failed to spawn build command `{command}`: {source}")]
    BuildSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build command `{command}` exited with {}", exit_label(.code))]
    BuildFailed { command: String, code: Option<i32> },

    #[error("expected archive at '{}'", .0.display())]
    ArchiveMissing(PathBuf),

    #[error("archive at '{}' is empty", .0.display())]
    ArchiveEmpty(PathBuf),

    #[error("failed to read archive '{}': {source}", .path.display())]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to package archive: {0}")]
    Packaging(String),

    #[error("failed to assume role {role_arn}: {message}")]
    AssumeRole { role_arn: String, message: String },

    #[error("role assumption response is missing `{0}`")]
    MissingCredentialField(&'static str),

    #[error("malformed role assumption response: {0}")]
    MalformedResponse(String),

    #[error("failed to update function code for {function}: {message}")]
    UpdateFunctionCode { function: String, message: String },

    #[error("deployed code digest {reported} does not match local archive digest {local}")]
    DigestMismatch { local: String, reported: String },
}

impl DeployError {
    /// Short name of the step that produced the error, used as a log field.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::BuildSpawn { .. } | Self::BuildFailed { .. } => "build",
            Self::ArchiveMissing(_)
            | Self::ArchiveEmpty(_)
            | Self::ArchiveIo { .. }
            | Self::Packaging(_) => "archive",
            Self::AssumeRole { .. } => "assume_role",
            Self::MissingCredentialField(_) | Self::MalformedResponse(_) => "extract_credentials",
            Self::UpdateFunctionCode { .. } => "update_function_code",
            Self::DigestMismatch { .. } => "verify",
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}
