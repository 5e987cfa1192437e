//! Assume-role trust policy synthesis.
//!
//! Compiles a [`TrustConfiguration`] into the document attached to a role as
//! its `AssumeRolePolicyDocument`. The output depends only on the tenant id
//! and the configuration, and field order is fixed by the struct layout.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::{Conditions, Effect, OneOrMany, TrustConfiguration, POLICY_VERSION};

pub const ASSUME_ROLE_ACTION: &str = "sts:AssumeRole";

const ARN_PREFIX: &str = "arn:";
const SERVICE_PRINCIPAL_SUFFIX: &str = ".amazonaws.com";

/// Principal block a trusted principal lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalBucket {
    /// `Principal.AWS`: ARNs, account roots and opaque identifiers.
    Aws,
    /// `Principal.Service`: first-party service principals.
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPrincipal {
    #[serde(rename = "AWS", default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<OneOrMany>,
    #[serde(rename = "Service", default, skip_serializing_if = "Option::is_none")]
    pub service: Option<OneOrMany>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrustStatement {
    pub effect: Effect,
    pub action: String,
    pub principal: TrustPrincipal,
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub condition: Conditions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrustPolicyDocument {
    pub version: String,
    pub statement: Vec<TrustStatement>,
}

impl TrustPolicyDocument {
    /// Compact JSON, as sent to IAM.
    pub fn to_json(&self) -> Result<String, ProviderError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// `arn:aws:iam::<account>:root`
pub fn account_root_arn(account_id: &str) -> String {
    format!("arn:aws:iam::{account_id}:root")
}

/// Exactly twelve ASCII digits.
pub fn is_account_id(value: &str) -> bool {
    value.len() == 12 && value.chars().all(|c| c.is_ascii_digit())
}

/// Classify one trusted principal. Blank input yields `None`.
///
/// Rules are tested in order: ARN, bare account id (rewritten to the account
/// root), service principal suffix, then anything else as an AWS principal.
pub fn classify_principal(principal: &str) -> Option<(PrincipalBucket, String)> {
    if principal.trim().is_empty() {
        return None;
    }
    let classified = if principal.starts_with(ARN_PREFIX) {
        (PrincipalBucket::Aws, principal.to_string())
    } else if is_account_id(principal) {
        (PrincipalBucket::Aws, account_root_arn(principal))
    } else if principal.ends_with(SERVICE_PRINCIPAL_SUFFIX) {
        (PrincipalBucket::Service, principal.to_string())
    } else {
        (PrincipalBucket::Aws, principal.to_string())
    };
    Some(classified)
}

/// Build the assume-role trust policy for a role in `tenant_id`.
///
/// With no usable principals the role trusts its own account root, so a role
/// is never created without a trust principal.
pub fn build_trust_policy(
    tenant_id: &str,
    trust: Option<&TrustConfiguration>,
) -> TrustPolicyDocument {
    let mut aws_principals = Vec::new();
    let mut service_principals = Vec::new();

    for principal in trust.map(TrustConfiguration::trusted_principals).unwrap_or_default() {
        match classify_principal(principal) {
            Some((PrincipalBucket::Aws, value)) => aws_principals.push(value),
            Some((PrincipalBucket::Service, value)) => service_principals.push(value),
            None => {}
        }
    }

    if aws_principals.is_empty() && service_principals.is_empty() {
        aws_principals.push(account_root_arn(tenant_id));
    }

    let condition = trust
        .map(|t| t.conditions().clone())
        .unwrap_or_default();

    TrustPolicyDocument {
        version: POLICY_VERSION.to_string(),
        statement: vec![TrustStatement {
            effect: Effect::Allow,
            action: ASSUME_ROLE_ACTION.to_string(),
            principal: TrustPrincipal {
                aws: OneOrMany::from_vec(aws_principals),
                service: OneOrMany::from_vec(service_principals),
            },
            condition,
        }],
    }
}
