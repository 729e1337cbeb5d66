use std::fmt;

use serde::Deserialize;

use crate::error::DeployError;

const REDACTED: &str = "<redacted>";

/// Long-lived keys used only to call the role-assumption API.
///
/// Holds no session token; any token in the environment is dropped before
/// role assumption.
#[derive(Clone, PartialEq, Eq)]
pub struct BaseCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl BaseCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.access_key_id.trim().is_empty() {
            return Err(DeployError::Config(
                "AWS_ACCESS_KEY_ID must be configured".to_string(),
            ));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(DeployError::Config(
                "AWS_SECRET_ACCESS_KEY must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for BaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .finish()
    }
}

/// The credential triple handed out by role assumption.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<String>,
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .field("session_token", &REDACTED)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Role-assumption response, shaped like the provider's JSON output.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedRole {
    #[serde(default)]
    pub credentials: Option<CredentialsBlock>,
    #[serde(default)]
    pub assumed_role_user: Option<AssumedRoleUser>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialsBlock {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedRoleUser {
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub assumed_role_id: Option<String>,
}

impl AssumedRole {
    pub fn from_json(text: &str) -> Result<Self, DeployError> {
        serde_json::from_str(text)
            .map_err(|error| DeployError::MalformedResponse(error.to_string()))
    }

    pub fn role_arn(&self) -> Option<&str> {
        self.assumed_role_user
            .as_ref()
            .and_then(|user| user.arn.as_deref())
    }
}

/// Pulls the credential triple out of a role-assumption response.
///
/// Values are copied verbatim; a field that is absent or empty is an error
/// naming that field.
pub fn extract_credentials(response: &AssumedRole) -> Result<TemporaryCredentials, DeployError> {
    let block = response
        .credentials
        .as_ref()
        .ok_or(DeployError::MissingCredentialField("Credentials"))?;

    Ok(TemporaryCredentials {
        access_key_id: required_field(&block.access_key_id, "AccessKeyId")?,
        secret_access_key: required_field(&block.secret_access_key, "SecretAccessKey")?,
        session_token: required_field(&block.session_token, "SessionToken")?,
        expiration: block.expiration.clone(),
    })
}

fn required_field(value: &Option<String>, name: &'static str) -> Result<String, DeployError> {
    match value {
        Some(text) if !text.is_empty() => Ok(text.clone()),
        _ => Err(DeployError::MissingCredentialField(name)),
    }
}
