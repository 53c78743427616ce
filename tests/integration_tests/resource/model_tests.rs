use restdsl::dsl::PatchContext;
use restdsl::errors::ErrorKind;
use restdsl::{BaseServiceModel, ServiceModel, ServiceQuery};
use std::sync::Arc;

use crate::integration_tests::_support::{Account, dao, seeded_accounts};

fn model() -> ServiceModel<Account> {
    let dao = dao::<Account>();
    let model = ServiceModel::new(Arc::new(dao));
    model.save(Account::new(1, 5).nickname("ann").status("active")).unwrap();
    model
}

#[test]
fn patch_writes_only_changed_fields() {
    let model = model();
    let patch = Account { id: Some(1), rating: Some(9), ..Account::default() };
    let patched = model.patch(&patch, &PatchContext::default()).unwrap().unwrap();
    assert_eq!(patched, Account::new(1, 9).nickname("ann").status("active"));
}

#[test]
fn patch_unsets_requested_fields() {
    let model = model();
    let patch = Account { id: Some(1), ..Account::default() };
    let ctx = PatchContext::with_unset_fields(["nickname"]);
    let patched = model.patch(&patch, &ctx).unwrap().unwrap();
    assert_eq!(patched.nickname, None);
    assert_eq!(patched.rating, Some(5));
}

#[test]
fn patch_and_unset_of_one_field_conflict() {
    let model = model();
    let patch = Account { id: Some(1), nickname: Some("bob".into()), ..Account::default() };
    let err = model.patch(&patch, &PatchContext::with_unset_fields(["nickname"])).unwrap_err();
    assert_eq!(err.to_string(), "Params error: Patched field 'nickname' is also requested to be unset");
}

#[test]
fn unchanged_and_unknown_targets() {
    let model = model();
    let same = Account { id: Some(1), rating: Some(5), ..Account::default() };
    let stored = model.patch(&same, &PatchContext::default()).unwrap().unwrap();
    assert_eq!(stored.nickname.as_deref(), Some("ann"));

    let unknown = Account { id: Some(42), rating: Some(1), ..Account::default() };
    assert!(model.patch(&unknown, &PatchContext::default()).unwrap().is_none());

    let err = model.patch(&Account::default(), &PatchContext::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EntityError);
}

#[test]
fn base_model_reads_and_deletes_by_id() {
    let model = BaseServiceModel::new(Arc::new(seeded_accounts(3)));
    assert_eq!(model.get_by_id(2_i64).unwrap().unwrap().rating, Some(2));
    assert_eq!(model.delete_by_id(2_i64).unwrap(), 1);
    assert!(model.get_by_id(2_i64).unwrap().is_none());
    assert_eq!(model.get(&ServiceQuery::all().unwrap()).unwrap().into_items().len(), 2);
    assert!(model.describe(&ServiceQuery::by_id(1_i64).unwrap()).is_safe_query());
}
