use restdsl::dsl::{QueryParams, parse_request_for, parse_url, patch_context};
use restdsl::errors::ErrorKind;
use restdsl::schema::{DocumentFieldMapper, descriptor_of};
use restdsl::{CriterionValue, DaoConfig, Operator, ParsedField, ServiceQueryParams};

use crate::integration_tests::_support::Account;

fn with_defaults() -> ServiceQueryParams {
    DaoConfig::from_toml_str("[default_criteria]\nstatus = [\"active\"]")
        .unwrap()
        .query_params_for::<Account>()
        .unwrap()
}

#[test]
fn default_criteria_fill_missing_keys() {
    let q = parse_request_for::<Account>("-;rating=1", "", &with_defaults()).unwrap();
    assert_eq!(
        q.criteria().get(&ParsedField::new("status")).unwrap(),
        [CriterionValue::from("active")]
    );
    let own = parse_request_for::<Account>("-;status=idle", "", &with_defaults()).unwrap();
    assert_eq!(own.criteria().get(&ParsedField::new("status")).unwrap(), [CriterionValue::from("idle")]);
}

#[test]
fn sole_any_removes_a_defaulted_key() {
    let q = parse_request_for::<Account>("-;status=$any", "", &with_defaults()).unwrap();
    assert!(!q.criteria().contains_key(&ParsedField::new("status")));

    let mixed = parse_request_for::<Account>("-;status=idle,$any", "", &with_defaults()).unwrap();
    assert_eq!(mixed.criteria().get(&ParsedField::new("status")).unwrap().len(), 2);

    let undefaulted = parse_request_for::<Account>("-;nickname=$any", "", &with_defaults()).unwrap();
    assert!(!undefaulted.criteria().contains_key(&ParsedField::new("nickname")));
}

#[test]
fn limits_are_clamped_and_zero_means_count_only() {
    let params = ServiceQueryParams::default_params();
    let q = parse_request_for::<Account>("-", "limit=50000", &params).unwrap();
    assert_eq!(q.limit(), restdsl::dsl::MAX_LIMIT);
    let q = parse_request_for::<Account>("-", "limit=0", &params).unwrap();
    assert!(q.is_count_only());
    let q = parse_request_for::<Account>("-", "", &params).unwrap();
    assert_eq!(q.limit(), 100);
    assert!(!q.query_shape().ends_with("LIMIT"));

    let err = parse_request_for::<Account>("-", "limit=-1", &params).unwrap_err();
    assert_eq!(err.to_string(), "Query error: Limit cannot be negative");
    let err = parse_request_for::<Account>("-", "offset=-1", &params).unwrap_err();
    assert_eq!(err.to_string(), "Query error: Offset cannot be less than 0");
}

#[test]
fn canonical_url_parses_back() {
    let params = ServiceQueryParams::default_params();
    let q = parse_request_for::<Account>(
        "3,1;rating>=5;status=idle,active;nickname=$null",
        "limit=7&offset=2&order=-rating&syncMatch=mentions&countTotalItems=false",
        &params,
    )
    .unwrap();
    let again = parse_url(&DocumentFieldMapper, &descriptor_of::<Account>(), q.to_url_part(), &params).unwrap();
    assert_eq!(q, again);
    assert_eq!(again.to_url_part(), q.to_url_part());
    assert!(q.to_url_part().contains(";rating__gte=5"));
    assert!(q.to_url_part().contains(";status=active,idle"));
    assert_eq!(serde_json::to_value(&q).unwrap(), serde_json::json!(q.to_url_part()));
}

#[test]
fn operator_spellings_agree() {
    let params = ServiceQueryParams::default_params();
    let suffix = parse_request_for::<Account>("-;rating__lte=9", "", &params).unwrap();
    let infix = parse_request_for::<Account>("-;rating<=9", "", &params).unwrap();
    assert_eq!(suffix, infix);
    assert!(suffix.criteria().contains_key(&ParsedField::with_op("rating", Operator::Lte)));

    let err = parse_request_for::<Account>("-;rating__xyz=5", "", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParamsError);
    let err = parse_request_for::<Account>("-;rating__gt>5", "", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParamsError);
}

#[test]
fn unset_fields_for_patches() {
    let ctx = patch_context(&QueryParams::parse("unsetFields=nickname,,status"));
    assert_eq!(ctx.unset_fields().iter().cloned().collect::<Vec<_>>(), vec!["nickname", "status"]);
    assert!(patch_context(&QueryParams::parse("")).unset_fields().is_empty());
}
