//! Identity driver contract.
//!
//! Providers implement [`IdentityProvider`]: the raw, per-cloud primitives
//! (`do_*`) plus their error-code table. Callers use [`IdentityDriver`], which
//! is implemented once for every provider and owns the cross-provider
//! semantics: idempotent creation, description defaulting, and mapping every
//! failure onto the canonical [`IdentityError`] set.

use async_trait::async_trait;
use log::debug;

use crate::error::{
    classify, normalize, ErrorCodeTable, ErrorKind, IdentityError, IdentityResult,
    ProviderError,
};
use crate::types::{CreateOptions, PolicyDocument, TrustConfiguration};

/// Arguments of a single create call, after defaults were applied.
#[derive(Debug, Clone, Copy)]
pub struct CreateIdentityRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub tenant_id: &'a str,
    pub region: &'a str,
    pub trust_config: Option<&'a TrustConfiguration>,
    pub options: Option<&'a CreateOptions>,
}

/// Per-provider primitives. Each call maps to one request against the
/// provider's control plane.
///
/// `tenant_id` and `region` are passed to every primitive even when a provider
/// does not need them, so all providers share one signature.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider identifier, e.g. `aws`.
    fn provider_id(&self) -> &'static str;

    /// Service error code → canonical kind table for this provider.
    fn error_codes(&self) -> &'static ErrorCodeTable;

    fn error_kind(&self, failure: &ProviderError) -> ErrorKind {
        classify(failure, self.error_codes())
    }

    fn map_error(&self, failure: ProviderError) -> IdentityError {
        normalize(failure, self.error_codes())
    }

    /// Create the identity and return its provider-native handle. Must report
    /// an existing identity with a code the error table maps to
    /// [`ErrorKind::AlreadyExists`].
    async fn do_create_identity(
        &self,
        request: &CreateIdentityRequest<'_>,
    ) -> Result<String, ProviderError>;

    async fn do_get_identity(
        &self,
        name: &str,
        tenant_id: &str,
        region: &str,
    ) -> Result<String, ProviderError>;

    async fn do_delete_identity(
        &self,
        name: &str,
        tenant_id: &str,
        region: &str,
    ) -> Result<(), ProviderError>;

    async fn do_attach_inline_policy(
        &self,
        _identity_name: &str,
        _policy_name: &str,
        _policy: &PolicyDocument,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<(), ProviderError> {
        Err(IdentityError::unsupported("attach_inline_policy").into())
    }

    async fn do_get_inline_policy_details(
        &self,
        _identity_name: &str,
        _policy_name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<PolicyDocument, ProviderError> {
        Err(IdentityError::unsupported("get_inline_policy_details").into())
    }

    async fn do_get_attached_policies(
        &self,
        _identity_name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<Vec<String>, ProviderError> {
        Err(IdentityError::unsupported("get_attached_policies").into())
    }

    async fn do_remove_policy(
        &self,
        _identity_name: &str,
        _policy_name: &str,
        _tenant_id: &str,
        _region: &str,
    ) -> Result<(), ProviderError> {
        Err(IdentityError::unsupported("remove_policy").into())
    }
}

/// Provider-neutral identity lifecycle.
#[async_trait]
pub trait IdentityDriver: IdentityProvider {
    /// Create an identity, or return the existing one with the same name.
    ///
    /// When the provider reports that the identity already exists, the
    /// identity is looked up by name and its handle returned instead of an
    /// error, so repeated or concurrent calls all observe the same handle.
    async fn create_identity(
        &self,
        name: &str,
        description: Option<&str>,
        tenant_id: &str,
        region: &str,
        trust_config: Option<&TrustConfiguration>,
        options: Option<&CreateOptions>,
    ) -> IdentityResult<String>;

    async fn get_identity(&self, name: &str, tenant_id: &str, region: &str)
        -> IdentityResult<String>;

    /// Delete an identity. Attached policies are not detached first; the
    /// provider's dependency error is returned as-is.
    async fn delete_identity(&self, name: &str, tenant_id: &str, region: &str)
        -> IdentityResult<()>;

    async fn attach_inline_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()>;

    async fn get_inline_policy_details(
        &self,
        identity_name: &str,
        policy_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<PolicyDocument>;

    async fn get_attached_policies(
        &self,
        identity_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<Vec<String>>;

    async fn remove_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()>;
}

#[async_trait]
impl<P: IdentityProvider + ?Sized> IdentityDriver for P {
    async fn create_identity(
        &self,
        name: &str,
        description: Option<&str>,
        tenant_id: &str,
        region: &str,
        trust_config: Option<&TrustConfiguration>,
        options: Option<&CreateOptions>,
    ) -> IdentityResult<String> {
        let request = CreateIdentityRequest {
            name,
            description: description.unwrap_or_default(),
            tenant_id,
            region,
            trust_config,
            options,
        };

        match self.do_create_identity(&request).await {
            Ok(handle) => Ok(handle),
            Err(failure) if self.error_kind(&failure) == ErrorKind::AlreadyExists => {
                debug!(
                    "[{}] identity '{}' already exists, fetching existing handle: {}",
                    self.provider_id(),
                    name,
                    failure
                );
                self.get_identity(name, tenant_id, region).await
            }
            Err(failure) => Err(self.map_error(failure)),
        }
    }

    async fn get_identity(
        &self,
        name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<String> {
        self.do_get_identity(name, tenant_id, region)
            .await
            .map_err(|e| self.map_error(e))
    }

    async fn delete_identity(
        &self,
        name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()> {
        self.do_delete_identity(name, tenant_id, region)
            .await
            .map_err(|e| self.map_error(e))
    }

    async fn attach_inline_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()> {
        self.do_attach_inline_policy(identity_name, policy_name, policy, tenant_id, region)
            .await
            .map_err(|e| self.map_error(e))
    }

    async fn get_inline_policy_details(
        &self,
        identity_name: &str,
        policy_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<PolicyDocument> {
        self.do_get_inline_policy_details(identity_name, policy_name, tenant_id, region)
            .await
            .map_err(|e| self.map_error(e))
    }

    async fn get_attached_policies(
        &self,
        identity_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<Vec<String>> {
        self.do_get_attached_policies(identity_name, tenant_id, region)
            .await
            .map_err(|e| self.map_error(e))
    }

    async fn remove_policy(
        &self,
        identity_name: &str,
        policy_name: &str,
        tenant_id: &str,
        region: &str,
    ) -> IdentityResult<()> {
        self.do_remove_policy(identity_name, policy_name, tenant_id, region)
            .await
            .map_err(|e| self.map_error(e))
    }
}
