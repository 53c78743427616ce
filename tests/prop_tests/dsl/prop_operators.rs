use proptest::prelude::*;
use restdsl::dao::to_filter;
use restdsl::dsl::{QueryParams, parse_request};
use restdsl::errors::ErrorKind;
use restdsl::schema::DocumentFieldMapper;
use restdsl::{Result, ServiceQuery, ServiceQueryParams};

use super::profile;

fn parse(segment: &str) -> Result<ServiceQuery> {
    parse_request(
        &DocumentFieldMapper,
        &profile(),
        segment,
        &QueryParams::parse(""),
        &ServiceQueryParams::default_params(),
    )
}

const OPS: [(&str, &str); 5] = [("gt", ">"), ("gte", ">="), ("lt", "<"), ("lte", "<="), ("ne", "<>")];

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_suffix_and_infix_translate_alike(idx in 0usize..5, v in -10_000i64..10_000) {
        let (suffix, infix) = OPS[idx];
        let a = parse(&format!("-;rating__{suffix}={v}")).unwrap();
        let b = parse(&format!("-;rating{infix}{v}")).unwrap();
        prop_assert_eq!(&a, &b);
        let root = profile();
        let fa = to_filter(&DocumentFieldMapper, &root, "_id", &a).unwrap();
        let fb = to_filter(&DocumentFieldMapper, &root, "_id", &b).unwrap();
        prop_assert_eq!(fa, fb);
    }

    #[test]
    fn prop_unknown_suffixes_are_params_errors(suffix in "[a-z]{1,5}", v in 0i64..100) {
        prop_assume!(!OPS.iter().any(|(s, _)| *s == suffix));
        let err = parse(&format!("-;rating__{suffix}={v}")).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::ParamsError);
    }
}
