//! GCP IAM provider: service accounts as identities, token creator bindings
//! as trust.

mod provider;
pub(crate) mod rest_client;
pub mod trust;

use std::sync::OnceLock;

use crate::error::{ErrorCodeTable, ErrorKind};

pub use provider::{service_account_email, service_account_resource, GcpIam, GcpIamConfig};
pub use rest_client::{
    CreateServiceAccountInput, RestServiceAccountClient, ServiceAccount, ServiceAccountApi,
};
pub use trust::{Binding, IamPolicy};

pub const PROVIDER_ID: &str = "gcp";

pub const DEFAULT_ENDPOINT: &str = "https://iam.googleapis.com";

/// Environment variable holding an OAuth access token for the IAM API.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Canonical status names reported by Google APIs and their canonical kinds.
pub fn error_codes() -> &'static ErrorCodeTable {
    static TABLE: OnceLock<ErrorCodeTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        ErrorCodeTable::new(&[
            ("ALREADY_EXISTS", ErrorKind::AlreadyExists),
            ("NOT_FOUND", ErrorKind::NotFound),
            ("INVALID_ARGUMENT", ErrorKind::InvalidArgument),
            ("OUT_OF_RANGE", ErrorKind::InvalidArgument),
            ("PERMISSION_DENIED", ErrorKind::PermissionDenied),
            ("UNAUTHENTICATED", ErrorKind::PermissionDenied),
            ("FAILED_PRECONDITION", ErrorKind::FailedPrecondition),
            ("ABORTED", ErrorKind::FailedPrecondition),
            ("RESOURCE_EXHAUSTED", ErrorKind::ResourceExhausted),
            ("UNAVAILABLE", ErrorKind::Unavailable),
            ("DEADLINE_EXCEEDED", ErrorKind::Unavailable),
            ("UNIMPLEMENTED", ErrorKind::UnsupportedOperation),
        ])
    })
}
