//! AWS IAM provider: roles as identities, assume-role policies as trust.

pub(crate) mod iam_client;
mod provider;

use std::sync::OnceLock;

use crate::error::{ErrorCodeTable, ErrorKind};

pub use iam_client::{AwsIamClient, CreateRoleInput, IamApi};
pub use provider::{AwsIam, AwsIamConfig};

pub const PROVIDER_ID: &str = "aws";

/// IAM is a global service; the SDK resolves this pseudo-region to the
/// global endpoint.
pub const DEFAULT_REGION: &str = "aws-global";

/// IAM service error codes and their canonical kinds.
pub fn error_codes() -> &'static ErrorCodeTable {
    static TABLE: OnceLock<ErrorCodeTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        ErrorCodeTable::new(&[
            ("NoSuchEntity", ErrorKind::NotFound),
            ("EntityAlreadyExists", ErrorKind::AlreadyExists),
            ("InvalidInput", ErrorKind::InvalidArgument),
            ("MalformedPolicyDocument", ErrorKind::InvalidArgument),
            ("ValidationError", ErrorKind::InvalidArgument),
            ("InvalidParameterValue", ErrorKind::InvalidArgument),
            ("PasswordPolicyViolation", ErrorKind::InvalidArgument),
            ("DeleteConflict", ErrorKind::FailedPrecondition),
            ("UnmodifiableEntity", ErrorKind::FailedPrecondition),
            ("ConcurrentModification", ErrorKind::FailedPrecondition),
            ("LimitExceeded", ErrorKind::ResourceExhausted),
            ("Throttling", ErrorKind::ResourceExhausted),
            ("AccessDenied", ErrorKind::PermissionDenied),
            ("AccessDeniedException", ErrorKind::PermissionDenied),
            ("InvalidClientTokenId", ErrorKind::PermissionDenied),
            ("ExpiredToken", ErrorKind::PermissionDenied),
            ("ServiceFailure", ErrorKind::Unavailable),
            ("ServiceUnavailable", ErrorKind::Unavailable),
        ])
    })
}
