//! Service-account trust as an IAM policy binding.
//!
//! On GCP, "who may assume this identity" is whoever holds the token creator
//! role on the service account itself.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::TrustConfiguration;

pub const TOKEN_CREATOR_ROLE: &str = "roles/iam.serviceAccountTokenCreator";

const MEMBER_PREFIXES: [&str; 6] = [
    "user:",
    "group:",
    "serviceAccount:",
    "domain:",
    "principal://",
    "principalSet://",
];
const SERVICE_ACCOUNT_SUFFIX: &str = ".gserviceaccount.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Turn a trusted principal into an IAM member string. Blank input yields
/// `None`.
pub fn classify_member(principal: &str) -> Option<String> {
    if principal.trim().is_empty() {
        return None;
    }
    let member = if MEMBER_PREFIXES.iter().any(|p| principal.starts_with(p)) {
        principal.to_string()
    } else if principal.ends_with(SERVICE_ACCOUNT_SUFFIX) {
        format!("serviceAccount:{principal}")
    } else if principal.contains('@') {
        format!("user:{principal}")
    } else {
        principal.to_string()
    };
    Some(member)
}

/// Policy granting the token creator role to every trusted principal, or
/// `None` when there is nobody to grant it to.
///
/// Operator/key conditions have no equivalent in IAM bindings (which take CEL
/// expressions), so a configuration carrying them is rejected.
pub fn build_token_creator_policy(
    trust: Option<&TrustConfiguration>,
) -> Result<Option<IamPolicy>, ProviderError> {
    let Some(trust) = trust else {
        return Ok(None);
    };
    if trust.has_conditions() {
        return Err(ProviderError::IllegalArgument(
            "trust conditions are not supported for GCP service accounts".to_string(),
        ));
    }

    let members: Vec<String> = trust
        .trusted_principals()
        .iter()
        .filter_map(|p| classify_member(p))
        .collect();
    if members.is_empty() {
        return Ok(None);
    }

    Ok(Some(IamPolicy {
        version: None,
        bindings: vec![Binding {
            role: TOKEN_CREATOR_ROLE.to_string(),
            members,
        }],
        etag: None,
    }))
}
