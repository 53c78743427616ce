use proptest::prelude::*;
use restdsl::dsl::{QueryParams, parse_request, parse_url};
use restdsl::schema::DocumentFieldMapper;
use restdsl::{ParsedField, ServiceQuery, ServiceQueryParams};

use super::profile;

fn status_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        // delimiters of the url form; `,` and `;` are covered by builder-made queries
        "[a-z?&=%#<>]{1,8}",
        Just("$null".to_string()),
        Just("$exists".to_string()),
    ]
}

fn segment() -> impl Strategy<Value = String> {
    (
        proptest::collection::vec(0i64..1000, 0..3),
        proptest::option::of(-1000i64..1000),
        proptest::collection::vec(status_value(), 0..3),
        proptest::option::of(0i64..4_000_000_000_000),
    )
        .prop_map(|(ids, rating, statuses, since)| {
            let mut s = if ids.is_empty() {
                "-".to_string()
            } else {
                ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
            };
            if let Some(r) = rating {
                s.push_str(&format!(";rating>={r}"));
            }
            if !statuses.is_empty() {
                s.push_str(&format!(";status={}", statuses.join(",")));
            }
            if let Some(ms) = since {
                s.push_str(&format!(";since__lt={ms}"));
            }
            s
        })
}

fn query_string() -> impl Strategy<Value = String> {
    (
        proptest::option::of(0i64..20_000),
        proptest::option::of(0i64..100),
        proptest::option::of(prop_oneof![Just("rating"), Just("-rating"), Just("-since")]),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(limit, offset, order, validation, totals)| {
            let mut parts = Vec::new();
            if let Some(l) = limit {
                parts.push(format!("limit={l}"));
            }
            if let Some(o) = offset {
                parts.push(format!("offset={o}"));
            }
            if let Some(o) = order {
                parts.push(format!("order={o}"));
            }
            parts.push(format!("indexValidation={validation}"));
            parts.push(format!("countTotalItems={totals}"));
            parts.join("&")
        })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 128,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_canonical_url_is_a_fixed_point(segment in segment(), query in query_string()) {
        let root = profile();
        let params = ServiceQueryParams::default_params();
        let first = parse_request(&DocumentFieldMapper, &root, &segment, &QueryParams::parse(&query), &params).unwrap();
        let url = first.to_url_part().to_string();
        let second = parse_url(&DocumentFieldMapper, &root, &url, &params).unwrap();
        prop_assert_eq!(second.to_url_part(), url.as_str());
        prop_assert_eq!(&second, &first);
        prop_assert_eq!(second.ids(), first.ids());
    }

    #[test]
    fn prop_escaped_values_reparse_to_the_same_query(
        values in proptest::collection::vec("[a-z?&;,=%#<>-]{1,8}", 1..4),
        ids in proptest::collection::vec(-1000i64..1000, 0..3),
    ) {
        let root = profile();
        let params = ServiceQueryParams::default_params();
        let mut builder = ServiceQuery::builder().with_query_params(params.clone()).order("-rating");
        if !ids.is_empty() {
            builder = builder.ids(ids.clone());
        }
        for v in &values {
            builder = builder.with_criterion("status", v.as_str());
        }
        let built = builder.build().unwrap();
        let again = parse_url(&DocumentFieldMapper, &root, built.to_url_part(), &params).unwrap();
        prop_assert_eq!(again.to_url_part(), built.to_url_part());
        prop_assert_eq!(again.criteria().get(&ParsedField::new("status")).map(|v| v.len()), built.criteria().get(&ParsedField::new("status")).map(|v| v.len()));
        prop_assert_eq!(again.ids(), built.ids());
    }
}
