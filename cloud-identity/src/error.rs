//! Canonical error taxonomy and the mapping from provider failures onto it.
//!
//! Callers only ever see [`IdentityError`]. Provider adapters report failures
//! as [`ProviderError`], which is translated by [`normalize`] using the
//! provider's [`ErrorCodeTable`].

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Provider-independent failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    AlreadyExists,
    NotFound,
    PermissionDenied,
    FailedPrecondition,
    ResourceExhausted,
    Unavailable,
    UnsupportedOperation,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotFound => "not found",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::FailedPrecondition => "failed precondition",
            ErrorKind::ResourceExhausted => "resource exhausted",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::UnsupportedOperation => "unsupported operation",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Error returned by every identity operation. Each variant carries the
/// provider's original message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Identity already exists: {0}")]
    AlreadyExists(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

impl IdentityError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::InvalidArgument => IdentityError::InvalidArgument(message),
            ErrorKind::AlreadyExists => IdentityError::AlreadyExists(message),
            ErrorKind::NotFound => IdentityError::NotFound(message),
            ErrorKind::PermissionDenied => IdentityError::PermissionDenied(message),
            ErrorKind::FailedPrecondition => IdentityError::FailedPrecondition(message),
            ErrorKind::ResourceExhausted => IdentityError::ResourceExhausted(message),
            ErrorKind::Unavailable => IdentityError::Unavailable(message),
            ErrorKind::UnsupportedOperation => IdentityError::UnsupportedOperation(message),
            ErrorKind::Unknown => IdentityError::Unknown(message),
        }
    }

    pub fn unsupported(operation: &str) -> Self {
        IdentityError::UnsupportedOperation(format!(
            "{operation} is not supported by this provider"
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            IdentityError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            IdentityError::NotFound(_) => ErrorKind::NotFound,
            IdentityError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            IdentityError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            IdentityError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            IdentityError::Unavailable(_) => ErrorKind::Unavailable,
            IdentityError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            IdentityError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            IdentityError::InvalidArgument(message)
            | IdentityError::AlreadyExists(message)
            | IdentityError::NotFound(message)
            | IdentityError::PermissionDenied(message)
            | IdentityError::FailedPrecondition(message)
            | IdentityError::ResourceExhausted(message)
            | IdentityError::Unavailable(message)
            | IdentityError::UnsupportedOperation(message)
            | IdentityError::Unknown(message) => message,
        }
    }
}

/// Raw failure signal reported by a provider client adapter.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Already canonical; passed through unchanged.
    #[error(transparent)]
    Canonical(#[from] IdentityError),
    /// Server-side rejection carrying a machine-readable error code.
    #[error("{}: {message}", .code.as_deref().unwrap_or("<no code>"))]
    Service {
        code: Option<String>,
        message: String,
    },
    /// The request could not be built; nothing was sent.
    #[error("Client error: {0}")]
    Client(String),
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
    /// The request was sent but no usable response came back.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Service {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Internal(format!("Failed to serialize policy document: {e}"))
    }
}

/// Read-only map from a provider's service error codes to canonical kinds.
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeTable {
    entries: HashMap<&'static str, ErrorKind>,
}

impl ErrorCodeTable {
    pub fn new(entries: &[(&'static str, ErrorKind)]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    /// Unrecognized codes map to [`ErrorKind::Unknown`].
    pub fn lookup(&self, code: &str) -> ErrorKind {
        self.entries
            .get(code)
            .copied()
            .unwrap_or(ErrorKind::Unknown)
    }
}

/// Classify a provider failure. Total: every input yields exactly one kind.
pub fn classify(failure: &ProviderError, table: &ErrorCodeTable) -> ErrorKind {
    match failure {
        ProviderError::Canonical(e) => e.kind(),
        ProviderError::Service {
            code: Some(code), ..
        } => table.lookup(code),
        ProviderError::Service { code: None, .. } => ErrorKind::Unknown,
        ProviderError::Client(_) | ProviderError::IllegalArgument(_) => {
            ErrorKind::InvalidArgument
        }
        ProviderError::Transport(_) | ProviderError::Internal(_) => ErrorKind::Unknown,
    }
}

/// Translate a provider failure into the canonical error handed to callers.
pub fn normalize(failure: ProviderError, table: &ErrorCodeTable) -> IdentityError {
    let kind = classify(&failure, table);
    match failure {
        ProviderError::Canonical(e) => e,
        ProviderError::Service { message, .. } => IdentityError::new(kind, message),
        other => IdentityError::new(kind, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ErrorCodeTable {
        ErrorCodeTable::new(&[
            ("NoSuchEntity", ErrorKind::NotFound),
            ("DeleteConflict", ErrorKind::FailedPrecondition),
        ])
    }

    #[test]
    fn test_canonical_error_passes_through() {
        let failure = ProviderError::Canonical(IdentityError::NotFound("gone".into()));
        assert_eq!(
            normalize(failure, &table()),
            IdentityError::NotFound("gone".into())
        );
    }

    #[test]
    fn test_service_code_lookup() {
        let failure = ProviderError::service("NoSuchEntity", "The role cannot be found");
        let err = normalize(failure, &table());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "The role cannot be found");
    }

    #[test]
    fn test_unrecognized_service_code_is_unknown() {
        let failure = ProviderError::service("SomethingNew", "boom");
        assert_eq!(classify(&failure, &table()), ErrorKind::Unknown);

        let failure = ProviderError::Service {
            code: None,
            message: "no details".into(),
        };
        assert_eq!(classify(&failure, &table()), ErrorKind::Unknown);
    }

    #[test]
    fn test_client_side_failures_are_invalid_argument() {
        let failure = ProviderError::Client("missing role name".into());
        assert_eq!(classify(&failure, &table()), ErrorKind::InvalidArgument);

        let failure = ProviderError::IllegalArgument("bad path".into());
        let err = normalize(failure, &table());
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("bad path"));
    }

    #[test]
    fn test_runtime_failures_are_unknown() {
        let failure = ProviderError::Transport("connection reset".into());
        assert_eq!(classify(&failure, &table()), ErrorKind::Unknown);

        let failure = ProviderError::Internal("serialization".into());
        assert_eq!(classify(&failure, &table()), ErrorKind::Unknown);
    }

    #[test]
    fn test_new_round_trips_kind() {
        for kind in [
            ErrorKind::InvalidArgument,
            ErrorKind::AlreadyExists,
            ErrorKind::NotFound,
            ErrorKind::PermissionDenied,
            ErrorKind::FailedPrecondition,
            ErrorKind::ResourceExhausted,
            ErrorKind::Unavailable,
            ErrorKind::UnsupportedOperation,
            ErrorKind::Unknown,
        ] {
            assert_eq!(IdentityError::new(kind, "m").kind(), kind);
        }
    }
}
