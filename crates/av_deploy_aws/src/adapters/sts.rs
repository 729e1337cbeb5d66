use av_deploy_core::credentials::{AssumedRole, AssumedRoleUser, BaseCredentials, CredentialsBlock};
use av_deploy_core::deploy::{AssumeRoleRequest, RoleAssumer};
use av_deploy_core::error::DeployError;
use aws_sdk_sts::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::operation::assume_role::AssumeRoleOutput;
use aws_sdk_sts::primitives::DateTimeFormat;

const BASE_CREDENTIALS_SOURCE: &str = "deploy-base-keys";

/// Calls STS `AssumeRole` signed with the static base keys only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StsRoleAssumer;

impl StsRoleAssumer {
    fn client(base: &BaseCredentials, region: &str) -> aws_sdk_sts::Client {
        // static provider: no session token, and no fallback to the default chain
        let credentials = Credentials::new(
            base.access_key_id.clone(),
            base.secret_access_key.clone(),
            None,
            None,
            BASE_CREDENTIALS_SOURCE,
        );
        let config = aws_sdk_sts::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .build();
        aws_sdk_sts::Client::from_conf(config)
    }
}

impl RoleAssumer for StsRoleAssumer {
    fn assume_role(
        &self,
        base: &BaseCredentials,
        request: &AssumeRoleRequest,
    ) -> Result<AssumedRole, DeployError> {
        let client = Self::client(base, &request.region);
        let role_arn = request.role_arn.clone();
        let session_name = request.session_name.clone();
        let duration_seconds = request.duration_seconds;

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .assume_role()
                    .role_arn(role_arn)
                    .role_session_name(session_name)
                    .set_duration_seconds(duration_seconds)
                    .send()
                    .await
            })
        })
        .map_err(|error| DeployError::AssumeRole {
            role_arn: request.role_arn.clone(),
            message: DisplayErrorContext(&error).to_string(),
        })?;

        Ok(assumed_role_from_output(&output))
    }
}

pub(crate) fn assumed_role_from_output(output: &AssumeRoleOutput) -> AssumedRole {
    AssumedRole {
        credentials: output.credentials().map(|credentials| CredentialsBlock {
            access_key_id: Some(credentials.access_key_id().to_string()),
            secret_access_key: Some(credentials.secret_access_key().to_string()),
            session_token: Some(credentials.session_token().to_string()),
            expiration: credentials.expiration().fmt(DateTimeFormat::DateTime).ok(),
        }),
        assumed_role_user: output.assumed_role_user().map(|user| AssumedRoleUser {
            arn: Some(user.arn().to_string()),
            assumed_role_id: Some(user.assumed_role_id().to_string()),
        }),
    }
}
