//! Public entry point holding one provider driver.

use std::sync::Arc;

use crate::aws::{AwsIam, AwsIamConfig};
use crate::driver::{IdentityDriver, IdentityProvider};
use crate::error::IdentityResult;
use crate::gcp::{GcpIam, GcpIamConfig};
use crate::types::{CreateOptions, PolicyDocument, TrustConfiguration};

/// Which provider to build, and how.
#[derive(Clone)]
pub enum ProviderConfig {
    Aws(AwsIamConfig),
    Gcp(GcpIamConfig),
}

/// Identity operations against a single provider. Cheap to clone and safe to
/// share across tasks.
#[derive(Clone)]
pub struct IdentityClient {
    driver: Arc<dyn IdentityProvider>,
}

impl IdentityClient {
    pub fn new(driver: Arc<dyn IdentityProvider>) -> Self {
        Self { driver }
    }

    pub async fn from_config(config: ProviderConfig) -> IdentityResult<Self> {
        let driver: Arc<dyn IdentityProvider> = match config {
            ProviderConfig::Aws(config) => Arc::new(AwsIam::from_config(config).await),
            ProviderConfig::Gcp(config) => Arc::new(GcpIam::from_config(config)?),
        };
        Ok(Self::new(driver))
    }

    pub fn provider_id(&self) -> &'static str {
        self.driver.provider_id()
    }

    /// Create an identity, or return the handle of the existing identity with
    /// the same name.
    pub async fn create_identity(
        &self,
        name: &str,
        description: Option<&str>,
        tenant_id: &str,
        region: &str,
        trust_config: Option<&TrustConfiguration>,
        options: Option<&CreateOptions>,
    ) -> IdentityResult<String> {
        self.driver
            .create_identity(name, description, tenant_id, region, trust_config, options)
            .await
    }

    pub async fn get_identity(
        &self,
        name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<String> {
        self.driver.get_identity(name, tenant_id, region).await
    }

    pub async fn delete_identity(
        &self,
        name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()> {
        self.driver.delete_identity(name, tenant_id, region).await
    }

    pub async fn attach_inline_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()> {
        self.driver
            .attach_inline_policy(identity_name, policy_name, policy, tenant_id, region)
            .await
    }

    pub async fn get_inline_policy_details(
        &self,
        identity_name: &str,
        policy_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<PolicyDocument> {
        self.driver
            .get_inline_policy_details(identity_name, policy_name, tenant_id, region)
            .await
    }

    pub async fn get_attached_policies(
        &self,
        identity_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<Vec<String>> {
        self.driver
            .get_attached_policies(identity_name, tenant_id, region)
            .await
    }

    pub async fn remove_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()> {
        self.driver
            .remove_policy(identity_name, policy_name, tenant_id, region)
            .await
    }
}
