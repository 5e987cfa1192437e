use cloud_identity::gcp::GcpIamConfig;
use cloud_identity::{
    ErrorKind, IdentityClient, PolicyDocument, ProviderConfig, TrustConfiguration,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "my-project";
const REGION: &str = "global";
const TOKEN: &str = "test-token";
const ACCOUNTS_PATH: &str = "/v1/projects/my-project/serviceAccounts";
const ACCOUNT_PATH: &str =
    "/v1/projects/my-project/serviceAccounts/test-sa@my-project.iam.gserviceaccount.com";
const ACCOUNT_NAME: &str =
    "projects/my-project/serviceAccounts/test-sa@my-project.iam.gserviceaccount.com";

async fn setup() -> (MockServer, IdentityClient) {
    let mock_server = MockServer::start().await;
    let config = GcpIamConfig::default()
        .with_endpoint(mock_server.uri())
        .with_access_token(TOKEN);
    let client = IdentityClient::from_config(ProviderConfig::Gcp(config))
        .await
        .expect("client should build");
    (mock_server, client)
}

fn service_account_body() -> serde_json::Value {
    json!({
        "name": ACCOUNT_NAME,
        "projectId": PROJECT,
        "uniqueId": "104512345678901234567",
        "email": "test-sa@my-project.iam.gserviceaccount.com",
        "displayName": "test-sa"
    })
}

fn google_error(code: u16, status: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_json(json!({
        "error": {"code": code, "message": message, "status": status}
    }))
}

#[test_log::test(tokio::test)]
async fn test_create_service_account() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(ACCOUNTS_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "accountId": "test-sa",
            "serviceAccount": {"displayName": "test-sa", "description": "Deploys things"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_account_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let name = client
        .create_identity("test-sa", Some("Deploys things"), PROJECT, REGION, None, None)
        .await
        .expect("create should succeed");
    assert_eq!(name, ACCOUNT_NAME);
}

#[test_log::test(tokio::test)]
async fn test_create_existing_account_falls_back_to_get() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(ACCOUNTS_PATH))
        .respond_with(google_error(
            409,
            "ALREADY_EXISTS",
            "Service account test-sa already exists within project projects/my-project.",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(ACCOUNT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_account_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let name = client
        .create_identity("test-sa", None, PROJECT, REGION, None, None)
        .await
        .expect("create should fall back to get");
    assert_eq!(name, ACCOUNT_NAME);
}

#[test_log::test(tokio::test)]
async fn test_create_with_trust_grants_token_creator() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(ACCOUNTS_PATH))
        .and(body_partial_json(json!({"accountId": "test-sa"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_account_body()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{ACCOUNT_PATH}:setIamPolicy")))
        .and(body_json(json!({
            "policy": {
                "bindings": [{
                    "role": "roles/iam.serviceAccountTokenCreator",
                    "members": [
                        "serviceAccount:deployer@other-project.iam.gserviceaccount.com",
                        "user:alice@example.com"
                    ]
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": 1,
            "etag": "BwXhqDh2a1E=",
            "bindings": [{
                "role": "roles/iam.serviceAccountTokenCreator",
                "members": [
                    "serviceAccount:deployer@other-project.iam.gserviceaccount.com",
                    "user:alice@example.com"
                ]
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let trust = TrustConfiguration::builder()
        .add_trusted_principal("deployer@other-project.iam.gserviceaccount.com")
        .add_trusted_principal("alice@example.com")
        .build();
    let name = client
        .create_identity("test-sa", None, PROJECT, REGION, Some(&trust), None)
        .await
        .expect("create should succeed");
    assert_eq!(name, ACCOUNT_NAME);
}

#[test_log::test(tokio::test)]
async fn test_trust_conditions_are_rejected_before_any_request() {
    let (mock_server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_account_body()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let trust = TrustConfiguration::builder()
        .add_trusted_principal("alice@example.com")
        .add_condition("StringEquals", "sts:ExternalId", "external-123")
        .build();
    let err = client
        .create_identity("test-sa", None, PROJECT, REGION, Some(&trust), None)
        .await
        .expect_err("conditions are not supported");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test_log::test(tokio::test)]
async fn test_get_missing_account_is_not_found() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(ACCOUNT_PATH))
        .respond_with(google_error(
            404,
            "NOT_FOUND",
            "Unknown service account",
        ))
        .mount(&mock_server)
        .await;

    let err = client
        .get_identity("test-sa", PROJECT, REGION)
        .await
        .expect_err("account does not exist");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Unknown service account");
}

#[test_log::test(tokio::test)]
async fn test_delete_service_account() {
    let (mock_server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(ACCOUNT_PATH))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    client
        .delete_identity("test-sa", PROJECT, REGION)
        .await
        .expect("delete should succeed");
}

#[test_log::test(tokio::test)]
async fn test_status_without_error_body_uses_http_status() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(ACCOUNT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(ACCOUNT_PATH))
        .respond_with(google_error(
            403,
            "PERMISSION_DENIED",
            "Permission 'iam.serviceAccounts.delete' denied",
        ))
        .mount(&mock_server)
        .await;

    let err = client
        .get_identity("test-sa", PROJECT, REGION)
        .await
        .expect_err("service unavailable");
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    let err = client
        .delete_identity("test-sa", PROJECT, REGION)
        .await
        .expect_err("permission denied");
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test_log::test(tokio::test)]
async fn test_policy_operations_are_unsupported() {
    let (_mock_server, client) = setup().await;

    let err = client
        .attach_inline_policy("test-sa", "p", &PolicyDocument::default(), PROJECT, REGION)
        .await
        .expect_err("unsupported");
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let err = client
        .get_inline_policy_details("test-sa", "p", PROJECT, REGION)
        .await
        .expect_err("unsupported");
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let err = client
        .get_attached_policies("test-sa", PROJECT, REGION)
        .await
        .expect_err("unsupported");
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let err = client
        .remove_policy("test-sa", "p", PROJECT, REGION)
        .await
        .expect_err("unsupported");
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}

#[test_log::test(tokio::test)]
async fn test_names_escaping_the_project_are_rejected_before_any_request() {
    let (mock_server, client) = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let escaping = "../../../projects/other/serviceAccounts/victim@other.iam.gserviceaccount.com";
    let err = client
        .delete_identity(escaping, PROJECT, REGION)
        .await
        .expect_err("name leaves the project");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .get_identity("test-sa?alt=json", PROJECT, REGION)
        .await
        .expect_err("query in name");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .create_identity("test-sa#x", None, PROJECT, REGION, None, None)
        .await
        .expect_err("fragment in name");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .get_identity("test-sa", "../other", REGION)
        .await
        .expect_err("project id leaves its segment");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test_log::test(tokio::test)]
async fn test_failed_trust_binding_removes_account_so_retry_applies_it() {
    let (mock_server, client) = setup().await;
    let set_policy_path = format!("{ACCOUNT_PATH}:setIamPolicy");

    Mock::given(method("POST"))
        .and(path(ACCOUNTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(service_account_body()))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(set_policy_path.as_str()))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(set_policy_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bindings": []})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(ACCOUNT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let trust = TrustConfiguration::builder()
        .add_trusted_principal("alice@example.com")
        .build();

    let err = client
        .create_identity("test-sa", None, PROJECT, REGION, Some(&trust), None)
        .await
        .expect_err("binding failed");
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    let name = client
        .create_identity("test-sa", None, PROJECT, REGION, Some(&trust), None)
        .await
        .expect("retry should create and bind");
    assert_eq!(name, ACCOUNT_NAME);
}
