use av_deploy_core::credentials::TemporaryCredentials;
use av_deploy_core::deploy::{FunctionUpdater, UpdateCodeRequest, UpdatedFunction};
use av_deploy_core::error::DeployError;
use aws_sdk_lambda::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::update_function_code::UpdateFunctionCodeOutput;
use aws_sdk_lambda::primitives::Blob;

const ASSUMED_CREDENTIALS_SOURCE: &str = "deploy-assumed-role";

/// Calls Lambda `UpdateFunctionCode` with the assumed-role credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaFunctionUpdater;

impl LambdaFunctionUpdater {
    fn client(credentials: &TemporaryCredentials, region: &str) -> aws_sdk_lambda::Client {
        let provider = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            None,
            ASSUMED_CREDENTIALS_SOURCE,
        );
        let config = aws_sdk_lambda::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(provider)
            .build();
        aws_sdk_lambda::Client::from_conf(config)
    }
}

impl FunctionUpdater for LambdaFunctionUpdater {
    fn update_function_code(
        &self,
        credentials: &TemporaryCredentials,
        request: &UpdateCodeRequest<'_>,
    ) -> Result<UpdatedFunction, DeployError> {
        let client = Self::client(credentials, &request.region);
        let function_name = request.function_name.clone();
        let zip_file = Blob::new(request.zip_file.to_vec());
        let publish = request.publish;

        let output = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .update_function_code()
                    .function_name(function_name)
                    .zip_file(zip_file)
                    .publish(publish)
                    .send()
                    .await
            })
        })
        .map_err(|error| DeployError::UpdateFunctionCode {
            function: request.function_name.clone(),
            message: DisplayErrorContext(&error).to_string(),
        })?;

        Ok(updated_function_from_output(&output))
    }
}

pub(crate) fn updated_function_from_output(output: &UpdateFunctionCodeOutput) -> UpdatedFunction {
    UpdatedFunction {
        function_arn: output.function_arn().map(str::to_string),
        code_sha256: output.code_sha256().map(str::to_string),
        version: output.version().map(str::to_string),
        last_modified: output.last_modified().map(str::to_string),
    }
}
