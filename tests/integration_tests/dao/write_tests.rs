use bson::Bson;
use restdsl::dao::EntityLifecycleListener;
use restdsl::errors::{DslError, ErrorKind, Result};
use restdsl::query::UpdateDoc;
use restdsl::{BaseServiceDao, PersistentServiceDao, ServiceDao, ServiceQuery};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::integration_tests::_support::{Account, Handle, Note, dao, ids, seeded_accounts};

#[test]
fn save_upserts_by_id() {
    let dao = dao::<Account>();
    dao.save(Account::new(1, 5).nickname("ann")).unwrap();
    dao.save(Account::new(1, 7)).unwrap();
    let stored = dao.get_one(&ServiceQuery::by_id(1_i64).unwrap()).unwrap().unwrap();
    assert_eq!(stored.rating, Some(7));
    assert_eq!(stored.nickname, None);
    assert_eq!(dao.count(&ServiceQuery::all().unwrap()).unwrap(), 1);
}

#[test]
fn unique_index_collisions_are_duplicate_keys() {
    let dao = dao::<Handle>();
    dao.save(Handle { id: Some("a".into()), login: "neo".into() }).unwrap();
    let err = dao.save(Handle { id: Some("b".into()), login: "neo".into() }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    dao.save(Handle { id: Some("a".into()), login: "neo".into() }).unwrap();
}

#[test]
fn ids_are_generated_only_for_object_ids() {
    let notes = dao::<Note>();
    let saved = notes.save(Note { id: None, text: "hi".into() }).unwrap();
    let id = saved.id.unwrap();
    let found = notes.get_one(&ServiceQuery::by_id(id).unwrap()).unwrap().unwrap();
    assert_eq!(found.text, "hi");

    let handles = dao::<Handle>();
    let err = handles.save(Handle { id: None, login: "x".into() }).unwrap_err();
    assert_eq!(err.to_string(), "Entity error: Id must be provided for entities of Handle");
}

#[test]
fn patch_sets_and_unsets_by_logical_name() {
    let dao = dao::<Account>();
    dao.save(Account::new(1, 5).nickname("ann").status("active")).unwrap();
    let changes = BTreeMap::from([
        ("rating".to_string(), Bson::Int64(9)),
        ("nickname".to_string(), Bson::Null),
    ]);
    let patched = dao.patch(&ServiceQuery::by_id(1_i64).unwrap(), &changes).unwrap().unwrap();
    assert_eq!(patched.rating, Some(9));
    assert_eq!(patched.nickname, None);
    assert_eq!(patched.status.as_deref(), Some("active"));

    let missing = dao.patch(&ServiceQuery::by_id(2_i64).unwrap(), &changes).unwrap();
    assert!(missing.is_none());
}

#[test]
fn delete_needs_ids_or_criteria() {
    let dao = seeded_accounts(6);
    let err = dao.delete(&ServiceQuery::all().unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "Query error: Deletion query should either provide ids or criteria");

    let by_rating = ServiceQuery::by_criteria("rating__lt", 3_i64).unwrap();
    assert_eq!(dao.delete(&by_rating).unwrap(), 3);
    assert_eq!(dao.delete_by_id(&Bson::Int64(4)).unwrap(), 1);
    assert_eq!(dao.delete_by_id(&Bson::Int64(4)).unwrap(), 0);
    let left = dao.get(&ServiceQuery::all().unwrap()).unwrap();
    assert_eq!(ids(left.into_items()), vec![3, 5]);
}

struct Guard;

impl EntityLifecycleListener<Account> for Guard {
    fn pre_persist(&self, entity: &mut Account) -> Result<()> {
        if entity.status.is_none() {
            entity.status = Some("new".into());
        }
        Ok(())
    }

    fn pre_update(&self, _query: &ServiceQuery, update: &mut UpdateDoc) -> Result<()> {
        update.set.push(("status".into(), Bson::String("touched".into())));
        Ok(())
    }

    fn pre_delete(&self, query: &ServiceQuery) -> Result<()> {
        match query.ids() {
            Some(_) => Ok(()),
            None => Err(DslError::query("Only deletion by id is allowed")),
        }
    }
}

#[test]
fn lifecycle_hooks_run_before_writes() {
    let dao = dao::<Account>().with_listener(Arc::new(Guard));
    let saved = dao.save(Account::new(1, 1)).unwrap();
    assert_eq!(saved.status.as_deref(), Some("new"));

    let changes = BTreeMap::from([("rating".to_string(), Bson::Int64(2))]);
    let patched = dao.patch(&ServiceQuery::by_id(1_i64).unwrap(), &changes).unwrap().unwrap();
    assert_eq!(patched.status.as_deref(), Some("touched"));

    let err = dao.delete(&ServiceQuery::by_criteria("rating", 2_i64).unwrap()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QueryError);
    assert_eq!(dao.delete(&ServiceQuery::by_id(1_i64).unwrap()).unwrap(), 1);
}
