use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use av_deploy_core::archive::{code_sha256, package_directory};
use av_deploy_core::config::DEFAULT_ARCHIVE_PATH;
use clap::{Parser, Subcommand, ValueEnum};

/// Where CI checks out the function sources before `make archive` runs.
const DEFAULT_SOURCE_DIR: &str = "build/lambda";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the antivirus function deploy workspace",
    long_about = "A unified CLI for packaging the function archive, deploying it,\n\
                  and running CI checks in the deploy workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Zip the function sources into the deployable archive (what `make archive` runs)
    Archive {
        /// Directory holding the function sources and vendored dependencies
        #[arg(long, env = "ARCHIVE_SOURCE_DIR", default_value = DEFAULT_SOURCE_DIR)]
        source: PathBuf,
        /// Archive file to write
        #[arg(long, env = "DEPLOY_ARCHIVE_PATH", default_value = DEFAULT_ARCHIVE_PATH)]
        output: PathBuf,
    },
    /// Build the archive and update the deployed function (environment-driven)
    Deploy,
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy, mirroring the pre-commit hooks
    Lint,
    /// Workspace tests
    Test,
    /// Lint + test
    Check,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_archive(source: &Path, output: &Path) {
    step("Package function archive");
    if !source.is_dir() {
        eprintln!(
            "error: archive source '{}' does not exist; stage the function sources there first \
             (the deploy workflow checks them out) or point ARCHIVE_SOURCE_DIR elsewhere",
            source.display()
        );
        exit(1);
    }
    let summary = match package_directory(source, output) {
        Ok(summary) => summary,
        Err(error) => {
            eprintln!("error: {error}");
            exit(1);
        }
    };

    let bytes = std::fs::read(output).expect("failed to read packaged archive");
    eprintln!(
        "\nPackaged artifact:\n- {} ({} entries, {} bytes, sha256 {})",
        summary.output.display(),
        summary.entries.len(),
        bytes.len(),
        code_sha256(&bytes)
    );
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    step("Test av_deploy_core");
    run_cargo(&["test", "-p", "av_deploy_core"]);

    step("Test av_deploy_aws");
    run_cargo(&["test", "-p", "av_deploy_aws"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Archive { source, output } => {
            package_archive(&source, &output);
        }
        Commands::Deploy => {
            step("Deploy function code");
            run_cargo(&[
                "run",
                "-p",
                "av_deploy_aws",
                "--bin",
                "deploy",
                "--release",
            ]);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOY_WORKFLOW: &str = include_str!("../../.github/workflows/deploy.yml");
    const MAKEFILE: &str = include_str!("../../Makefile");

    #[test]
    fn archive_defaults_to_staged_source_dir() {
        let cli = Cli::try_parse_from(["xtask", "archive"]).expect("parse");
        let Commands::Archive { source, output } = cli.command else {
            panic!("expected archive command");
        };
        if std::env::var_os("ARCHIVE_SOURCE_DIR").is_none() {
            assert_eq!(source, PathBuf::from(DEFAULT_SOURCE_DIR));
        }
        if std::env::var_os("DEPLOY_ARCHIVE_PATH").is_none() {
            assert_eq!(output, PathBuf::from(DEFAULT_ARCHIVE_PATH));
        }
    }

    #[test]
    fn makefile_archives_the_staged_source_dir() {
        assert!(MAKEFILE.contains(&format!("ARCHIVE_SOURCE_DIR ?= {DEFAULT_SOURCE_DIR}")));
        assert!(MAKEFILE.contains("archive --source $(ARCHIVE_SOURCE_DIR)"));
    }

    #[test]
    fn deploy_workflow_stages_sources_before_deploying() {
        let stage = DEPLOY_WORKFLOW
            .find(&format!("path: {DEFAULT_SOURCE_DIR}"))
            .expect("workflow checks out the function sources");
        let deploy = DEPLOY_WORKFLOW
            .find("--bin deploy")
            .expect("workflow runs the deploy binary");
        assert!(stage < deploy);
    }
}
