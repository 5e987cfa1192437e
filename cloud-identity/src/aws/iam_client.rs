//! AWS IAM client wrapper for role and inline policy operations

use async_trait::async_trait;
use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_iam::Client as IamClient;
use log::{debug, warn};

use crate::error::ProviderError;

/// Fields of a `CreateRole` request. Unset options are omitted from the
/// request so IAM applies its own defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    pub role_name: String,
    pub assume_role_policy_document: String,
    pub description: String,
    pub path: Option<String>,
    pub max_session_duration: Option<i32>,
    pub permissions_boundary: Option<String>,
}

/// The IAM calls the AWS provider needs. Implemented by [`AwsIamClient`];
/// tests substitute their own implementation.
#[async_trait]
pub trait IamApi: Send + Sync {
    /// Returns the ARN of the new role.
    async fn create_role(&self, input: CreateRoleInput) -> Result<String, ProviderError>;

    /// Returns the ARN of the named role.
    async fn get_role(&self, role_name: &str) -> Result<String, ProviderError>;

    async fn delete_role(&self, role_name: &str) -> Result<(), ProviderError>;

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), ProviderError>;

    /// Returns the policy document exactly as IAM sent it (URL-encoded JSON).
    async fn get_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<String, ProviderError>;

    async fn list_role_policies(&self, role_name: &str) -> Result<Vec<String>, ProviderError>;

    async fn delete_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<(), ProviderError>;
}

pub struct AwsIamClient {
    client: IamClient,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }
}

/// Split an SDK failure into the signal the error mapper understands.
fn sdk_failure<E, R>(operation: &str, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(context) => ProviderError::Service {
            code: context.err().code().map(str::to_string),
            message: context
                .err()
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{operation} failed: {}", DisplayErrorContext(&err))),
        },
        SdkError::ConstructionFailure(_) => ProviderError::Client(format!(
            "Failed to build {operation} request: {}",
            DisplayErrorContext(&err)
        )),
        _ => ProviderError::Transport(format!("{operation} failed: {}", DisplayErrorContext(&err))),
    }
}

fn missing_role(operation: &str, role_name: &str) -> ProviderError {
    warn!("{operation} response for role '{role_name}' did not include a role");
    ProviderError::Internal(format!(
        "{operation} response for role '{role_name}' did not include a role"
    ))
}

#[async_trait]
impl IamApi for AwsIamClient {
    async fn create_role(&self, input: CreateRoleInput) -> Result<String, ProviderError> {
        debug!("CreateRole '{}'", input.role_name);
        let role_name = input.role_name.clone();
        let response = self
            .client
            .create_role()
            .role_name(input.role_name)
            .assume_role_policy_document(input.assume_role_policy_document)
            .description(input.description)
            .set_path(input.path)
            .set_max_session_duration(input.max_session_duration)
            .set_permissions_boundary(input.permissions_boundary)
            .send()
            .await
            .map_err(|e| sdk_failure("CreateRole", e))?;

        response
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| missing_role("CreateRole", &role_name))
    }

    async fn get_role(&self, role_name: &str) -> Result<String, ProviderError> {
        debug!("GetRole '{role_name}'");
        let response = self
            .client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| sdk_failure("GetRole", e))?;

        response
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| missing_role("GetRole", role_name))
    }

    async fn delete_role(&self, role_name: &str) -> Result<(), ProviderError> {
        debug!("DeleteRole '{role_name}'");
        self.client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| sdk_failure("DeleteRole", e))?;
        Ok(())
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), ProviderError> {
        debug!("PutRolePolicy '{policy_name}' on role '{role_name}'");
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(policy_document)
            .send()
            .await
            .map_err(|e| sdk_failure("PutRolePolicy", e))?;
        Ok(())
    }

    async fn get_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<String, ProviderError> {
        debug!("GetRolePolicy '{policy_name}' on role '{role_name}'");
        let response = self
            .client
            .get_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| sdk_failure("GetRolePolicy", e))?;
        Ok(response.policy_document)
    }

    async fn list_role_policies(&self, role_name: &str) -> Result<Vec<String>, ProviderError> {
        let mut policy_names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            debug!("ListRolePolicies '{role_name}' (marker: {marker:?})");
            let response = self
                .client
                .list_role_policies()
                .role_name(role_name)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| sdk_failure("ListRolePolicies", e))?;

            let truncated = response.is_truncated();
            marker = response.marker().map(str::to_string);
            policy_names.extend(response.policy_names);

            if !truncated || marker.is_none() {
                break;
            }
        }
        Ok(policy_names)
    }

    async fn delete_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<(), ProviderError> {
        debug!("DeleteRolePolicy '{policy_name}' on role '{role_name}'");
        self.client
            .delete_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| sdk_failure("DeleteRolePolicy", e))?;
        Ok(())
    }
}
