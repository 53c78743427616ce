use restdsl::ServiceDao;
use restdsl::dsl::{ServiceQueryParams, parse_request_for};
use restdsl::utils::devlog::{capture, take};

use crate::integration_tests::_support::{Account, seeded_accounts};

#[test]
fn count_only_issues_a_count_and_no_find() {
    let dao = seeded_accounts(5);
    let _g = capture();
    let q = parse_request_for::<Account>("-;rating__gte=1", "limit=0", &ServiceQueryParams::default_params()).unwrap();
    dao.get(&q).unwrap();
    let lines = take();
    assert!(lines.iter().any(|l| l.contains("\"op\":\"count\"") && l.contains("\"result_count\":4")));
    assert!(!lines.iter().any(|l| l.contains("\"op\":\"find\"")));
}

#[test]
fn short_pages_skip_the_count() {
    let dao = seeded_accounts(5);
    let _g = capture();
    let q = parse_request_for::<Account>("-", "limit=10", &ServiceQueryParams::default_params()).unwrap();
    assert_eq!(dao.get(&q).unwrap().total_items(), Some(5));
    let lines = take();
    assert!(lines.iter().any(|l| l.contains("\"op\":\"find\"")));
    assert!(!lines.iter().any(|l| l.contains("\"op\":\"count\"")));
}
