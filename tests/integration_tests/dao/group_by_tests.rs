use restdsl::dsl::{ServiceQuery, ServiceQueryParams, parse_request_for};
use restdsl::errors::ErrorKind;
use restdsl::{DaoConfig, DocumentServiceDao, PersistentServiceDao, ServiceDao};

use crate::integration_tests::_support::{Account, engine, ids};

fn parse(segment: &str, query: &str) -> ServiceQuery {
    parse_request_for::<Account>(segment, query, &ServiceQueryParams::default_params()).unwrap()
}

fn seeded(allow: bool) -> DocumentServiceDao<Account> {
    let dao = DocumentServiceDao::<Account>::new(engine()).unwrap().allow_group_by(allow);
    for i in 1..=3 {
        dao.save(Account::new(i, i).status("active")).unwrap();
    }
    for i in 4..=5 {
        dao.save(Account::new(i, i).status("idle")).unwrap();
    }
    dao.save(Account::new(6, 6)).unwrap();
    dao
}

#[test]
fn group_by_is_gated_per_dao() {
    let dao = seeded(false);
    let err = dao.get(&parse("-;status=active,idle", "groupBy=status")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryError);
    assert!(err.to_string().contains("GroupBy is not allowed"), "{err}");
}

#[test]
fn group_by_field_must_be_in_criteria() {
    let dao = seeded(true);
    let err = dao.get(&parse("-;status=active", "groupBy=rating")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryError);
}

#[test]
fn one_group_per_supplied_value_with_own_totals() {
    let dao = seeded(true);
    let res = dao.get(&parse("-;status=active,idle,$null", "groupBy=status&limit=2")).unwrap();
    let groups = res.as_multimap().unwrap();
    assert_eq!(groups.items.keys().cloned().collect::<Vec<_>>(), vec!["$null", "active", "idle"]);

    let active = &groups.items["active"];
    assert_eq!(active.total_items, Some(3));
    assert_eq!(ids(active.items.clone()), vec![1, 2]);
    assert_eq!(groups.items["idle"].total_items, Some(2));
    assert_eq!(ids(groups.items["$null"].items.clone()), vec![6]);
    assert_eq!(groups.total_items, Some(6));
}

#[test]
fn values_without_matches_still_get_a_group() {
    let dao = seeded(true);
    let res = dao.get(&parse("-;status=gone,idle", "groupBy=status&countTotalItems=false")).unwrap();
    let groups = res.as_multimap().unwrap();
    assert!(groups.items["gone"].items.is_empty());
    assert_eq!(groups.items["gone"].total_items, None);
    assert_eq!(groups.total_items, None);
}

#[test]
fn config_enables_group_by() {
    let cfg = DaoConfig::from_toml_str("allow_group_by = true\nslow_query_ms = 1000").unwrap();
    let dao = DocumentServiceDao::<Account>::from_config(engine(), &cfg).unwrap();
    dao.save(Account::new(1, 1).status("active")).unwrap();
    let res = dao.get(&parse("-;status=active", "groupBy=status")).unwrap();
    assert_eq!(res.as_multimap().unwrap().items["active"].items.len(), 1);
}
