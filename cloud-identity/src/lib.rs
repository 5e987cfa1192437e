//! This crate provides provider-neutral management of cloud identities:
//! - Trust policy synthesis from a provider-neutral [`TrustConfiguration`]
//! - Idempotent identity creation (create, or fetch the existing identity)
//! - Canonical error kinds for every provider failure
//! - AWS IAM roles and GCP service accounts behind one [`IdentityDriver`]
//!

pub mod aws;
mod client;
mod driver;
mod error;
pub mod gcp;
pub mod synthesis;
mod types;

pub use client::{IdentityClient, ProviderConfig};
pub use driver::{CreateIdentityRequest, IdentityDriver, IdentityProvider};
pub use error::{
    classify, normalize, ErrorCodeTable, ErrorKind, IdentityError, IdentityResult,
    ProviderError,
};
pub use types::{
    Conditions, CreateOptions, CreateOptionsBuilder, Effect, OneOrMany, PolicyDocument,
    Statement, TrustConfiguration, TrustConfigurationBuilder, POLICY_VERSION,
};
