//! Deploy primitives for the antivirus function.
//!
//! Everything here is free of cloud SDKs: configuration, the credential model,
//! archive packaging and the deploy sequence itself, which talks to the outside
//! world only through the collaborator traits in [`deploy`].
//! The AWS-backed collaborators live in `av_deploy_aws`.

pub mod archive;
pub mod config;
pub mod credentials;
pub mod deploy;
pub mod error;
pub mod session;
