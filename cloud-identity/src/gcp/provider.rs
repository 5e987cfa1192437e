use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::rest_client::{CreateServiceAccountInput, RestServiceAccountClient, ServiceAccountApi};
use super::trust::build_token_creator_policy;
use super::{error_codes, ACCESS_TOKEN_ENV, DEFAULT_ENDPOINT, PROVIDER_ID};
use crate::driver::{CreateIdentityRequest, IdentityProvider};
use crate::error::{ErrorCodeTable, IdentityError, IdentityResult, ProviderError};

/// Construction settings for [`GcpIam`].
#[derive(Clone, Default)]
pub struct GcpIamConfig {
    /// IAM API endpoint; defaults to [`DEFAULT_ENDPOINT`].
    pub endpoint: Option<String>,
    /// OAuth access token. When unset, [`ACCESS_TOKEN_ENV`] is read once.
    pub access_token: Option<String>,
    /// Pre-built client. When set, no HTTP client is constructed.
    pub client: Option<Arc<dyn ServiceAccountApi>>,
}

impl GcpIamConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_client(mut self, client: Arc<dyn ServiceAccountApi>) -> Self {
        self.client = Some(client);
        self
    }
}

/// GCP implementation of the identity driver. Identities are service
/// accounts in the project named by `tenant_id`; handles are their resource
/// names.
pub struct GcpIam {
    client: Arc<dyn ServiceAccountApi>,
}

impl GcpIam {
    pub fn from_config(config: GcpIamConfig) -> IdentityResult<Self> {
        if let Some(client) = config.client {
            return Ok(Self { client });
        }

        let endpoint = config
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let access_token = config
            .access_token
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok());
        info!("Building GCP IAM client for endpoint '{endpoint}'");
        if access_token.is_none() {
            warn!(
                "No access token configured and {ACCESS_TOKEN_ENV} is unset; \
                 IAM requests will be sent unauthenticated"
            );
        }

        let http = reqwest::Client::builder().build().map_err(|e| {
            IdentityError::InvalidArgument(format!("Failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            client: Arc::new(RestServiceAccountClient::new(http, &endpoint, access_token)),
        })
    }

    pub fn with_client(client: Arc<dyn ServiceAccountApi>) -> Self {
        Self { client }
    }

    /// Delete an account whose trust binding could not be applied, so a
    /// retried create starts from scratch instead of finding an account
    /// without its binding.
    async fn roll_back_create(&self, resource_name: &str, cause: &ProviderError) {
        warn!("Failed to apply trust to '{resource_name}', deleting it: {cause}");
        if let Err(e) = self.client.delete_service_account(resource_name).await {
            warn!("Failed to delete '{resource_name}' after trust failure: {e}");
        }
    }
}

/// `{name}@{project}.iam.gserviceaccount.com`, unless `name` is already an
/// email address.
pub fn service_account_email(name: &str, project_id: &str) -> String {
    if name.contains('@') {
        name.to_string()
    } else {
        format!("{name}@{project_id}.iam.gserviceaccount.com")
    }
}

/// `projects/{project}/serviceAccounts/{email}`. Fails when either part would
/// not stay inside its own path segment.
pub fn service_account_resource(name: &str, project_id: &str) -> Result<String, ProviderError> {
    check_path_segment("service account name", name)?;
    check_path_segment("project id", project_id)?;
    Ok(format!(
        "projects/{project_id}/serviceAccounts/{}",
        service_account_email(name, project_id)
    ))
}

fn check_path_segment(what: &str, value: &str) -> Result<(), ProviderError> {
    let invalid = value.trim().is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '?', '#', '%']);
    if invalid {
        return Err(ProviderError::IllegalArgument(format!(
            "invalid {what} '{value}'"
        )));
    }
    Ok(())
}

#[async_trait]
impl IdentityProvider for GcpIam {
    fn provider_id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn error_codes(&self) -> &'static ErrorCodeTable {
        error_codes()
    }

    async fn do_create_identity(
        &self,
        request: &CreateIdentityRequest<'_>,
    ) -> Result<String, ProviderError> {
        // Validate everything before creating anything.
        service_account_resource(request.name, request.tenant_id)?;
        let policy = build_token_creator_policy(request.trust_config)?;
        if request.options.is_some() {
            debug!(
                "Ignoring create options for service account '{}': not applicable on GCP",
                request.name
            );
        }

        let input = CreateServiceAccountInput {
            account_id: request.name.to_string(),
            display_name: request.name.to_string(),
            description: request.description.to_string(),
        };
        let account = self
            .client
            .create_service_account(request.tenant_id, &input)
            .await?;

        if let Some(policy) = policy {
            if let Err(failure) = self.client.set_iam_policy(&account.name, &policy).await {
                self.roll_back_create(&account.name, &failure).await;
                return Err(failure);
            }
        }
        Ok(account.name)
    }

    async fn do_get_identity(
        &self,
        name: &str,
        tenant_id: &str,
        _region: &str,
    ) -> Result<String, ProviderError> {
        let account = self
            .client
            .get_service_account(&service_account_resource(name, tenant_id)?)
            .await?;
        Ok(account.name)
    }

    async fn do_delete_identity(
        &self,
        name: &str,
        tenant_id: &str,
        _region: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .delete_service_account(&service_account_resource(name, tenant_id)?)
            .await
    }
}
