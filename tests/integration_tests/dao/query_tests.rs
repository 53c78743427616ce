use restdsl::dsl::{ServiceQuery, ServiceQueryParams, parse_request_for};
use restdsl::errors::ErrorKind;
use restdsl::metrics::LogStatsReporter;
use restdsl::schema::{DocumentFieldMapper, GenericFieldMapper, entity_info};
use restdsl::{CriterionValue, ServiceDao};
use std::sync::Arc;

use crate::integration_tests::_support::{Account, dao, ids, seeded_accounts};

fn parse(segment: &str, query: &str) -> ServiceQuery {
    parse_request_for::<Account>(segment, query, &ServiceQueryParams::default_params()).unwrap()
}

#[test]
fn unindexed_criteria_are_rejected_unless_validation_is_off() {
    let dao = seeded_accounts(50);
    let hit = dao.get(&parse("-;rating=42", "")).unwrap();
    assert_eq!(ids(hit.into_items()), vec![42]);

    let err = dao.get(&parse("-;nickname=foo", "")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryError);
    assert!(err.to_string().contains("[nickname]"), "{err}");
    assert!(err.to_string().contains("indexValidation=false"));

    let bypass = dao.get(&parse("-;nickname=foo", "indexValidation=false")).unwrap();
    assert!(bypass.is_empty());
}

#[test]
fn count_only_query_still_counts() {
    let dao = seeded_accounts(10);
    let res = dao.get(&parse("-;rating__gte=5", "limit=0")).unwrap();
    assert!(res.is_empty());
    assert_eq!(res.total_items(), Some(5));
}

#[test]
fn page_in_the_middle_reports_the_full_total() {
    let dao = seeded_accounts(10);
    let res = dao.get(&parse("-", "limit=3&offset=2")).unwrap();
    assert_eq!(res.total_items(), Some(10));
    assert_eq!(ids(res.into_items()), vec![2, 3, 4]);
}

#[test]
fn totals_for_tail_pages_and_when_disabled() {
    let dao = seeded_accounts(10);
    let tail = dao.get(&parse("-", "limit=4&offset=8")).unwrap();
    assert_eq!(tail.total_items(), Some(10));
    assert_eq!(ids(tail.into_items()), vec![8, 9]);

    let beyond = dao.get(&parse("-", "limit=4&offset=20")).unwrap();
    assert_eq!(beyond.total_items(), Some(10));

    let none = dao.get(&parse("-", "countTotalItems=false")).unwrap();
    assert_eq!(none.total_items(), None);
}

#[test]
fn ids_order_and_projection() {
    let dao = seeded_accounts(10);
    let res = dao.get(&parse("7,3,5", "order=-rating")).unwrap();
    assert_eq!(ids(res.into_items()), vec![7, 5, 3]);

    let one = dao.get_one(&parse("4", "fields=rating")).unwrap().unwrap();
    assert_eq!(one.id, Some(4));
    assert_eq!(one.rating, Some(4));

    let excluded = dao.get_one(&parse("4", "fields=*,-rating")).unwrap().unwrap();
    assert_eq!(excluded.rating, None);

    let err = dao.get(&parse("4", "fields=rating,-status")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryError);
}

#[test]
fn reserved_values() {
    let dao = dao::<Account>();
    for a in [
        Account::new(1, 1).nickname("ann"),
        Account::new(2, 2),
        Account::new(3, 3).nickname("bob"),
    ] {
        restdsl::PersistentServiceDao::save(&dao, a).unwrap();
    }
    let get = |segment: &str| ids(dao.get(&parse(segment, "")).unwrap().into_items());

    assert_eq!(get("-;rating__gte=0;nickname=$null"), vec![2]);
    assert_eq!(get("-;rating__gte=0;nickname=$exists"), vec![1, 3]);
    assert_eq!(get("-;rating__gte=0;nickname=$null,bob"), vec![2, 3]);
    assert_eq!(get("-;rating__gte=0;nickname=$any"), vec![1, 2, 3]);
    assert_eq!(get("-;rating__gte=0;nickname=ann,$any"), vec![1, 2, 3]);
    assert_eq!(get("-;rating<>1,3"), vec![2]);
    assert_eq!(get("-;rating__ne=2"), vec![1, 3]);

    let err = parse_request_for::<Account>("-;rating__gte=$null", "", &ServiceQueryParams::default_params())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryError);
}

#[test]
fn any_without_defaults_stays_in_criteria() {
    let q = parse("-;rating=$any", "");
    assert_eq!(
        q.criteria().get(&restdsl::ParsedField::new("rating")).unwrap(),
        [CriterionValue::Any]
    );
}

#[test]
fn sync_match_requires_one_element() {
    let dao = dao::<Account>();
    restdsl::PersistentServiceDao::save(&dao, Account::new(1, 1).mention("a", 1).mention("b", 9)).unwrap();
    restdsl::PersistentServiceDao::save(&dao, Account::new(2, 2).mention("a", 9)).unwrap();

    let segment = "-;rating__gte=0;mentions.name=a;mentions.score__gte=5";
    let loose = dao.get(&parse(segment, "")).unwrap();
    assert_eq!(ids(loose.into_items()), vec![1, 2]);
    let synced = dao.get(&parse(segment, "syncMatch=mentions")).unwrap();
    assert_eq!(ids(synced.into_items()), vec![2]);

    let bad = ServiceQuery::builder()
        .with_criterion("nickname.first", "x")
        .sync_match(["nickname"])
        .index_validation(false)
        .build()
        .unwrap();
    assert_eq!(dao.get(&bad).unwrap_err().kind(), ErrorKind::QueryError);
}

#[test]
fn describe_reports_safety_and_url() {
    let dao = seeded_accounts(1);
    let info = dao.describe(&parse("-;nickname=x", "indexValidation=false"));
    assert!(!info.is_safe_query());
    assert!(info.url_part().contains("nickname=x"));
    assert!(dao.describe(&parse("1;nickname=x", "")).is_safe_query());
    assert_eq!(dao.count(&parse("-;rating__lt=1", "")).unwrap(), 1);
}

#[test]
fn query_shapes_are_timed() {
    let reporter = Arc::new(LogStatsReporter::new(u64::MAX));
    let dao = seeded_accounts(3).with_stats_reporter(reporter.clone());
    dao.get(&parse("-;rating=1", "")).unwrap();
    dao.get(&parse("-;rating=2", "")).unwrap();
    dao.count(&parse("-;rating=2", "")).unwrap();
    let key = format!("queries.shapes.accounts.{}", parse("-;rating=1", "").query_shape());
    assert_eq!(reporter.timing_stats(&key).unwrap().count, 3);
}

#[test]
fn id_storage_name_follows_the_mapper() {
    let generic = entity_info::<Account>(&GenericFieldMapper).unwrap();
    assert_eq!(generic.id_storage_name, "id");
    let document = entity_info::<Account>(&DocumentFieldMapper).unwrap();
    assert_eq!(document.id_storage_name, "_id");
    assert_eq!(dao::<Account>().entity_info().id_storage_name, "_id");
    assert_eq!(entity_info::<Account>(&GenericFieldMapper).unwrap(), generic);
}
