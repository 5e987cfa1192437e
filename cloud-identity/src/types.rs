//! Provider-neutral value types shared by every identity provider.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// IAM policy language version used for every generated document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// A JSON value that is either a single string or an ordered list of strings.
///
/// IAM treats `"x"` and `["x"]` as equivalent, but the scalar form is what the
/// provider echoes back for single entries, so documents keep the distinction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Scalar for exactly one entry, list for two or more, `None` when empty.
    pub fn from_vec(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(OneOrMany::One),
            _ => Some(OneOrMany::Many(values)),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            OneOrMany::One(value) => vec![value.as_str()],
            OneOrMany::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

/// Condition block: operator (e.g. `StringEquals`) → condition key → value.
pub type Conditions = BTreeMap<String, BTreeMap<String, OneOrMany>>;

/// Who may assume an identity, plus optional conditions on that trust.
///
/// Principals keep their insertion order so generated documents are
/// deterministic. An empty configuration is valid and distinct from an absent
/// one only at the call site; both compile to the provider's default trust.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustConfiguration {
    trusted_principals: Vec<String>,
    conditions: Conditions,
}

impl TrustConfiguration {
    pub fn builder() -> TrustConfigurationBuilder {
        TrustConfigurationBuilder::default()
    }

    pub fn trusted_principals(&self) -> &[String] {
        &self.trusted_principals
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrustConfigurationBuilder {
    trusted_principals: Vec<String>,
    conditions: Conditions,
}

impl TrustConfigurationBuilder {
    /// Add a principal: an ARN, a 12-digit account id, a service principal
    /// such as `ec2.amazonaws.com`, or a provider-specific member string.
    pub fn add_trusted_principal(mut self, principal: impl Into<String>) -> Self {
        self.trusted_principals.push(principal.into());
        self
    }

    pub fn add_trusted_principals<I, S>(mut self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_principals
            .extend(principals.into_iter().map(Into::into));
        self
    }

    /// Add a single-valued condition. A repeated operator/key pair replaces
    /// the earlier value.
    pub fn add_condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.conditions
            .entry(operator.into())
            .or_default()
            .insert(key.into(), OneOrMany::One(value.into()));
        self
    }

    pub fn add_condition_values<I, S>(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.conditions
            .entry(operator.into())
            .or_default()
            .insert(key.into(), OneOrMany::Many(values));
        self
    }

    pub fn build(self) -> TrustConfiguration {
        TrustConfiguration {
            trusted_principals: self.trusted_principals,
            conditions: self.conditions,
        }
    }
}

/// Optional settings for identity creation. `None` means "provider default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    path: Option<String>,
    max_session_duration: Option<i32>,
    permission_boundary: Option<String>,
}

impl CreateOptions {
    pub fn builder() -> CreateOptionsBuilder {
        CreateOptionsBuilder::default()
    }

    /// Path or namespace, e.g. `/service-roles/`. Blank paths read as unset.
    pub fn path(&self) -> Option<&str> {
        non_blank(self.path.as_deref())
    }

    /// Maximum session duration in seconds. The provider enforces 900..=43200.
    pub fn max_session_duration(&self) -> Option<i32> {
        self.max_session_duration
    }

    /// Permission boundary policy reference. Blank values read as unset.
    pub fn permission_boundary(&self) -> Option<&str> {
        non_blank(self.permission_boundary.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateOptionsBuilder {
    path: Option<String>,
    max_session_duration: Option<i32>,
    permission_boundary: Option<String>,
}

impl CreateOptionsBuilder {
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn max_session_duration(mut self, seconds: i32) -> Self {
        self.max_session_duration = Some(seconds);
        self
    }

    pub fn permission_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.permission_boundary = Some(boundary.into());
        self
    }

    pub fn build(self) -> CreateOptions {
        CreateOptions {
            path: self.path,
            max_session_duration: self.max_session_duration,
            permission_boundary: self.permission_boundary,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Access policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    pub action: OneOrMany,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub condition: Conditions,
}

impl Statement {
    pub fn allow(actions: Vec<String>, resources: Vec<String>) -> Self {
        Self::with_effect(Effect::Allow, actions, resources)
    }

    pub fn deny(actions: Vec<String>, resources: Vec<String>) -> Self {
        Self::with_effect(Effect::Deny, actions, resources)
    }

    fn with_effect(effect: Effect, actions: Vec<String>, resources: Vec<String>) -> Self {
        Self {
            sid: None,
            effect,
            action: OneOrMany::from_vec(actions).unwrap_or(OneOrMany::Many(Vec::new())),
            resource: OneOrMany::from_vec(resources),
            condition: Conditions::new(),
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }
}

/// Access policy attached to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statements,
        }
    }
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
