use std::sync::Arc;

use async_trait::async_trait;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use log::{debug, info};

use super::iam_client::{AwsIamClient, CreateRoleInput, IamApi};
use super::{error_codes, DEFAULT_REGION, PROVIDER_ID};
use crate::driver::{CreateIdentityRequest, IdentityProvider};
use crate::error::{ErrorCodeTable, ProviderError};
use crate::synthesis::build_trust_policy;
use crate::types::{CreateOptions, PolicyDocument};

/// Construction settings for [`AwsIam`]. Every field is optional.
#[derive(Clone, Default)]
pub struct AwsIamConfig {
    /// Region for the IAM client; defaults to [`DEFAULT_REGION`].
    pub region: Option<String>,
    /// IAM endpoint override, e.g. a local emulator.
    pub endpoint: Option<String>,
    /// Replaces the default credential provider chain.
    pub credentials: Option<SharedCredentialsProvider>,
    /// Pre-built client. When set, no SDK client is constructed.
    pub client: Option<Arc<dyn IamApi>>,
}

impl AwsIamConfig {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(mut self, credentials: SharedCredentialsProvider) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_static_credentials(
        self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            None,
            "cloud-identity-static",
        );
        self.with_credentials(SharedCredentialsProvider::new(credentials))
    }

    pub fn with_client(mut self, client: Arc<dyn IamApi>) -> Self {
        self.client = Some(client);
        self
    }
}

/// AWS implementation of the identity driver. Identities are IAM roles and
/// handles are role ARNs.
pub struct AwsIam {
    client: Arc<dyn IamApi>,
    region: String,
}

impl AwsIam {
    /// Resolve region, credentials and endpoint once and build the client.
    pub async fn from_config(config: AwsIamConfig) -> Self {
        let region = config
            .region
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let client = match config.client {
            Some(client) => client,
            None => {
                let sdk_client =
                    build_sdk_client(&region, config.endpoint, config.credentials).await;
                Arc::new(AwsIamClient::new(sdk_client)) as Arc<dyn IamApi>
            }
        };

        Self { client, region }
    }

    /// Driver over an existing client, in the default region.
    pub fn with_client(client: Arc<dyn IamApi>) -> Self {
        Self {
            client,
            region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

async fn build_sdk_client(
    region: &str,
    endpoint: Option<String>,
    credentials: Option<SharedCredentialsProvider>,
) -> aws_sdk_iam::Client {
    info!("Building IAM client for region '{region}'");
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));
    if let Some(credentials) = credentials {
        loader = loader.credentials_provider(credentials);
    }
    if let Some(endpoint) = endpoint {
        debug!("Using IAM endpoint override '{endpoint}'");
        loader = loader.endpoint_url(endpoint);
    }
    let config = loader.load().await;
    aws_sdk_iam::Client::new(&config)
}

fn create_role_input(request: &CreateIdentityRequest<'_>, document: String) -> CreateRoleInput {
    let options = request.options;
    CreateRoleInput {
        role_name: request.name.to_string(),
        assume_role_policy_document: document,
        description: request.description.to_string(),
        path: options.and_then(CreateOptions::path).map(str::to_string),
        max_session_duration: options.and_then(CreateOptions::max_session_duration),
        permissions_boundary: options
            .and_then(CreateOptions::permission_boundary)
            .map(str::to_string),
    }
}

/// IAM returns inline policy documents URL-encoded.
fn decode_policy_document(raw: &str) -> Result<PolicyDocument, ProviderError> {
    let decoded = percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .map_err(|e| {
            ProviderError::Internal(format!("Failed to URL decode policy document: {e}"))
        })?;
    serde_json::from_str(&decoded).map_err(|e| {
        ProviderError::Internal(format!("Failed to parse policy document JSON: {e}"))
    })
}

#[async_trait]
impl IdentityProvider for AwsIam {
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
        let document = build_trust_policy(request.tenant_id, request.trust_config).to_json()?;
        debug!(
            "Creating role '{}' in account {} with trust policy {}",
            request.name, request.tenant_id, document
        );
        self.client
            .create_role(create_role_input(request, document))
            .await
    }

    // IAM role names are unique per account and the client is already scoped
    // to one account, so tenant_id and region are not needed here.
    async fn do_get_identity(
        &self,
        name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<String, ProviderError> {
        self.client.get_role(name).await
    }

    async fn do_delete_identity(
        &self,
        name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<(), ProviderError> {
        self.client.delete_role(name).await
    }

    async fn do_attach_inline_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<(), ProviderError> {
        let document = serde_json::to_string(policy)?;
        self.client
            .put_role_policy(identity_name, policy_name, &document)
            .await
    }

    async fn do_get_inline_policy_details(
        &self,
        identity_name: &str,
        policy_name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<PolicyDocument, ProviderError> {
        let raw = self
            .client
            .get_role_policy(identity_name, policy_name)
            .await?;
        decode_policy_document(&raw)
    }

    async fn do_get_attached_policies(
        &self,
        identity_name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.client.list_role_policies(identity_name).await
    }

    async fn do_remove_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .delete_role_policy(identity_name, policy_name)
            .await
    }
}
