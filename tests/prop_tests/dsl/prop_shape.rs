use proptest::prelude::*;
use restdsl::dsl::{QueryParams, parse_request};
use restdsl::schema::DocumentFieldMapper;
use restdsl::{ServiceQuery, ServiceQueryParams};

use super::profile;

fn parse(segment: &str, query: &str) -> ServiceQuery {
    parse_request(
        &DocumentFieldMapper,
        &profile(),
        segment,
        &QueryParams::parse(query),
        &ServiceQueryParams::default_params(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_shape_ignores_literal_values(
        a in -1000i64..1000, b in -1000i64..1000,
        s in "[a-z]{1,6}", t in "[a-z]{1,6}",
        l1 in 1i64..500, l2 in 1i64..500,
        id1 in 0i64..100, id2 in 0i64..100,
    ) {
        let x = parse(&format!("{id1};rating<{a};status={s}"), &format!("limit={l1}&order=-rating"));
        let y = parse(&format!("{id2};status={t},$null;rating__lt={b}"), &format!("limit={l2}&order=-rating"));
        prop_assert_eq!(x.query_shape(), y.query_shape());
    }

    #[test]
    fn prop_structure_changes_the_shape(a in -1000i64..1000, s in "[a-z]{1,6}") {
        let base = parse(&format!("-;rating={a};status={s}"), "");
        let variants = [
            parse(&format!("1;rating={a};status={s}"), ""),
            parse(&format!("-;rating__gt={a};status={s}"), ""),
            parse(&format!("-;rating={a}"), ""),
            parse(&format!("-;rating={a};status={s}"), "order=rating"),
            parse(&format!("-;rating={a};status={s}"), "groupBy=status"),
            parse(&format!("-;rating={a};status={s}"), "syncMatch=status"),
            parse(&format!("-;rating={a};status={s}"), "limit=10"),
        ];
        for v in &variants {
            prop_assert_ne!(v.query_shape(), base.query_shape());
        }
        let same = parse(&format!("-;rating={a};status={s}"), "offset=3&fields=rating&countTotalItems=false");
        prop_assert_eq!(same.query_shape(), base.query_shape());
    }
}
