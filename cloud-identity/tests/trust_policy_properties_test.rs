use cloud_identity::synthesis::{
    account_root_arn, build_trust_policy, classify_principal, PrincipalBucket,
};
use cloud_identity::{aws, classify, ErrorKind, OneOrMany, ProviderError, TrustConfiguration};
use proptest::prelude::*;

fn principal() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{12}",
        "arn:aws:iam::[0-9]{12}:role/[A-Za-z0-9]{1,16}",
        "[a-z]{2,12}\\.amazonaws\\.com",
        "[A-Za-z0-9]{1,20}",
        Just(String::new()),
        Just("   ".to_string()),
    ]
}

fn count(values: Option<&OneOrMany>) -> usize {
    values.map_or(0, |v| v.values().len())
}

proptest! {
    #[test]
    fn trust_policy_is_deterministic(
        tenant in "[0-9]{12}",
        principals in prop::collection::vec(principal(), 0..6),
    ) {
        let trust = TrustConfiguration::builder()
            .add_trusted_principals(principals.clone())
            .build();
        let first = build_trust_policy(&tenant, Some(&trust)).to_json().expect("serializes");
        let again = TrustConfiguration::builder()
            .add_trusted_principals(principals)
            .build();
        let second = build_trust_policy(&tenant, Some(&again)).to_json().expect("serializes");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_usable_principal_lands_in_one_bucket(
        tenant in "[0-9]{12}",
        principals in prop::collection::vec(principal(), 0..6),
    ) {
        let usable = principals.iter().filter(|p| !p.trim().is_empty()).count();
        let trust = TrustConfiguration::builder()
            .add_trusted_principals(principals)
            .build();
        let document = build_trust_policy(&tenant, Some(&trust));
        let statement = &document.statement[0];
        let placed = count(statement.principal.aws.as_ref())
            + count(statement.principal.service.as_ref());

        if usable == 0 {
            let root = OneOrMany::One(account_root_arn(&tenant));
            prop_assert_eq!(statement.principal.aws.as_ref(), Some(&root));
            prop_assert!(statement.principal.service.is_none());
        } else {
            prop_assert_eq!(placed, usable);
        }
    }

    #[test]
    fn account_ids_become_account_roots(account in "[0-9]{12}") {
        prop_assert_eq!(
            classify_principal(&account),
            Some((PrincipalBucket::Aws, format!("arn:aws:iam::{account}:root")))
        );
    }

    #[test]
    fn arns_are_never_rewritten(suffix in "[a-z0-9:/.-]{0,40}") {
        let arn = format!("arn:{suffix}");
        prop_assert_eq!(classify_principal(&arn), Some((PrincipalBucket::Aws, arn.clone())));
    }

    #[test]
    fn unrecognized_service_codes_are_unknown(code in "[A-Za-z]{1,24}Xyz") {
        let failure = ProviderError::service(code, "boom");
        prop_assert_eq!(classify(&failure, aws::error_codes()), ErrorKind::Unknown);
    }
}
