//! Policy synthesis (deterministic JSON generation)

pub mod trust_policy;

pub use trust_policy::{
    account_root_arn, build_trust_policy, classify_principal, PrincipalBucket,
    TrustPolicyDocument,
};
