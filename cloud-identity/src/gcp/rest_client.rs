//! GCP IAM REST client for service account operations

use async_trait::async_trait;
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::trust::IamPolicy;
use crate::error::ProviderError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// `projects/{project}/serviceAccounts/{email}`
    pub name: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceAccountInput {
    pub account_id: String,
    pub display_name: String,
    pub description: String,
}

/// The IAM Admin calls the GCP provider needs. Resource names have the form
/// `projects/{project}/serviceAccounts/{email}`.
#[async_trait]
pub trait ServiceAccountApi: Send + Sync {
    async fn create_service_account(
        &self,
        project_id: &str,
        input: &CreateServiceAccountInput,
    ) -> Result<ServiceAccount, ProviderError>;

    async fn get_service_account(&self, resource_name: &str)
        -> Result<ServiceAccount, ProviderError>;

    async fn delete_service_account(&self, resource_name: &str) -> Result<(), ProviderError>;

    async fn set_iam_policy(
        &self,
        resource_name: &str,
        policy: &IamPolicy,
    ) -> Result<IamPolicy, ProviderError>;
}

/// Characters escaped inside one path segment. `@` stays literal so resource
/// names keep the form the API documents.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateServiceAccountBody<'a> {
    account_id: &'a str,
    service_account: ServiceAccountFields<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAccountFields<'a> {
    display_name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct SetIamPolicyBody<'a> {
    policy: &'a IamPolicy,
}

pub struct RestServiceAccountClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl RestServiceAccountClient {
    pub fn new(http: reqwest::Client, endpoint: &str, access_token: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Every `/`-separated segment of `path` is escaped on its own.
    fn url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect();
        format!("{}/v1/{}", self.endpoint, encoded.join("/"))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| http_failure(operation, &e))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("{operation} failed with HTTP {status} and an unreadable body: {e}");
                String::new()
            }
        };
        debug!("{operation} failed with HTTP {status}: {body}");
        Err(service_failure(operation, status, &body))
    }

    async fn send_json<T>(&self, operation: &str, request: RequestBuilder) -> Result<T, ProviderError>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| http_failure(operation, &e))
    }
}

fn http_failure(operation: &str, e: &reqwest::Error) -> ProviderError {
    if e.is_builder() {
        ProviderError::Client(format!("Failed to build {operation} request: {e}"))
    } else if e.is_decode() {
        ProviderError::Internal(format!("Failed to decode {operation} response: {e}"))
    } else {
        ProviderError::Transport(format!("{operation} failed: {e}"))
    }
}

/// Canonical status name for an HTTP status, used when the error body does
/// not carry one.
fn status_code_name(status: StatusCode) -> Option<&'static str> {
    let name = match status {
        StatusCode::BAD_REQUEST => "INVALID_ARGUMENT",
        StatusCode::UNAUTHORIZED => "UNAUTHENTICATED",
        StatusCode::FORBIDDEN => "PERMISSION_DENIED",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::CONFLICT => "ALREADY_EXISTS",
        StatusCode::PRECONDITION_FAILED => "FAILED_PRECONDITION",
        StatusCode::TOO_MANY_REQUESTS => "RESOURCE_EXHAUSTED",
        StatusCode::NOT_IMPLEMENTED => "UNIMPLEMENTED",
        StatusCode::SERVICE_UNAVAILABLE => "UNAVAILABLE",
        StatusCode::GATEWAY_TIMEOUT => "DEADLINE_EXCEEDED",
        _ => return None,
    };
    Some(name)
}

fn service_failure(operation: &str, status: StatusCode, body: &str) -> ProviderError {
    match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) => ProviderError::Service {
            code: parsed
                .error
                .status
                .or_else(|| status_code_name(status).map(str::to_string)),
            message: parsed.error.message,
        },
        Err(_) => ProviderError::Service {
            code: status_code_name(status).map(str::to_string),
            message: format!("{operation} failed with HTTP {status}"),
        },
    }
}

#[async_trait]
impl ServiceAccountApi for RestServiceAccountClient {
    async fn create_service_account(
        &self,
        project_id: &str,
        input: &CreateServiceAccountInput,
    ) -> Result<ServiceAccount, ProviderError> {
        debug!("CreateServiceAccount '{}' in project {project_id}", input.account_id);
        let body = CreateServiceAccountBody {
            account_id: &input.account_id,
            service_account: ServiceAccountFields {
                display_name: &input.display_name,
                description: &input.description,
            },
        };
        let request = self
            .http
            .post(self.url(&format!("projects/{project_id}/serviceAccounts")))
            .json(&body);
        self.send_json("CreateServiceAccount", request).await
    }

    async fn get_service_account(
        &self,
        resource_name: &str,
    ) -> Result<ServiceAccount, ProviderError> {
        debug!("GetServiceAccount '{resource_name}'");
        let request = self.http.get(self.url(resource_name));
        self.send_json("GetServiceAccount", request).await
    }

    async fn delete_service_account(&self, resource_name: &str) -> Result<(), ProviderError> {
        debug!("DeleteServiceAccount '{resource_name}'");
        let request = self.http.delete(self.url(resource_name));
        self.send("DeleteServiceAccount", request).await?;
        Ok(())
    }

    async fn set_iam_policy(
        &self,
        resource_name: &str,
        policy: &IamPolicy,
    ) -> Result<IamPolicy, ProviderError> {
        debug!("SetIamPolicy on '{resource_name}'");
        let request = self
            .http
            .post(format!("{}:setIamPolicy", self.url(resource_name)))
            .json(&SetIamPolicyBody { policy });
        self.send_json("SetIamPolicy", request).await
    }
}
