use restdsl::errors::{ErrorKind, Result};
use restdsl::preconditions::ensure_not_set;
use restdsl::resource::EntityValidator;
use restdsl::{DaoConfig, ServiceModel, ServiceResource};
use std::sync::Arc;

use crate::integration_tests::_support::{Account, dao, ids};

fn resource() -> ServiceResource<Account> {
    let resource = ServiceResource::new(ServiceModel::new(Arc::new(dao::<Account>())));
    for i in 1..=4 {
        resource.create(Account::new(i, i * 10).status("active")).unwrap();
    }
    resource
}

#[test]
fn get_and_info_parse_requests() {
    let r = resource();
    let res = r.get("-;rating__gte=20", "limit=2&order=-rating").unwrap();
    assert_eq!(res.total_items(), Some(3));
    assert_eq!(ids(res.into_items()), vec![4, 3]);

    let info = r.info("2,3", "fields=rating").unwrap();
    assert!(info.is_safe_query());
    assert!(info.url_part().starts_with("2,3?"));
    assert_eq!(r.get("-;nickname=x", "").unwrap_err().kind(), ErrorKind::QueryError);
}

#[test]
fn resource_defaults_apply() {
    let params = DaoConfig::from_toml_str("default_limit = 1").unwrap().query_params_for::<Account>().unwrap();
    let r = resource().with_query_params(params);
    let res = r.get("-;status=active", "").unwrap();
    assert_eq!(res.into_items().len(), 1);
}

#[test]
fn update_takes_the_id_from_the_path() {
    let r = resource();
    let saved = r.update("7", Account { rating: Some(70), ..Account::default() }).unwrap();
    assert_eq!(saved.id, Some(7));
    let same = r.update("7", Account::new(7, 71)).unwrap();
    assert_eq!(same.rating, Some(71));

    let err = r.update("7", Account::new(8, 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EntityError);
    assert!(err.to_string().contains("Id either should not be provided or be equal to the one in the entity"));

    let err = r.update("", Account::default()).unwrap_err();
    assert_eq!(err.to_string(), "Params error: Key cannot be null");
    assert_eq!(r.update("seven", Account::default()).unwrap_err().kind(), ErrorKind::ParamsError);
}

#[test]
fn patch_reads_unset_fields_from_the_query() {
    let r = resource();
    let patch = Account { id: Some(2), rating: Some(99), ..Account::default() };
    let patched = r.patch(&patch, "unsetFields=status").unwrap().unwrap();
    assert_eq!(patched.rating, Some(99));
    assert_eq!(patched.status, None);

    let err = r.patch(&Account::default(), "").unwrap_err();
    assert_eq!(err.to_string(), "Entity error: Id must be provided when patching an entity, but was null");
}

#[test]
fn delete_parses_and_gates() {
    let r = resource();
    assert_eq!(r.delete("-", "").unwrap_err().kind(), ErrorKind::QueryError);
    assert_eq!(r.delete("-;rating__lt=30", "").unwrap(), 2);
    assert_eq!(r.delete("4", "").unwrap(), 1);
    assert_eq!(ids(r.get("-", "").unwrap().into_items()), vec![3]);
}

struct NoStatusOnCreate;

impl EntityValidator<Account> for NoStatusOnCreate {
    fn validate_post(&self, entity: &Account) -> Result<()> {
        ensure_not_set(entity.status.as_ref(), "status")
    }
}

#[test]
fn validators_run_before_creates() {
    let r = resource().with_validator(Arc::new(NoStatusOnCreate));
    let err = r.create(Account::new(9, 1).status("x")).unwrap_err();
    assert_eq!(err.to_string(), "Entity error: Field status must not be set, but got \"x\"");
    assert!(r.create(Account::new(9, 1)).is_ok());
}
