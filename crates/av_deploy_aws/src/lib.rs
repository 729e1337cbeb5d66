//! AWS-backed collaborators for the deploy sequence in `av_deploy_core`.
//!
//! Owns the SDK clients (STS role assumption, Lambda code update), the build
//! command runner and the environment-driven CLI of the `deploy` binary.

pub mod adapters;
pub mod build;
pub mod cli;
