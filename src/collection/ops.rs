use bson::{Bson, Document as BsonDocument};

use super::core::Collection;
use crate::errors::{DslError, Result};
use crate::index::{IndexKeyKind, key_from_bson};
use crate::logger::AUDIT_TARGET;
use crate::query::{Filter, UpdateDoc, apply_update, eval_filter};

fn audit(op: &str, collection: &str, id: &Bson) {
    let line = serde_json::json!({ "op": op, "collection": collection, "id": id.to_string() });
    log::info!(target: AUDIT_TARGET, "{line}");
}

fn id_of(doc: &BsonDocument) -> Result<(Bson, IndexKeyKind)> {
    match doc.get("_id") {
        Some(Bson::Null) | None => Err(DslError::entity("Document has no _id")),
        Some(id) => Ok((id.clone(), key_from_bson(id))),
    }
}

impl Collection {
    /// Insert a new document; its `_id` must be set and unused.
    ///
    /// # Errors
    /// ENTITY_ERROR without `_id`; DUPLICATE_KEY on any unique collision.
    pub fn insert(&self, doc: BsonDocument) -> Result<Bson> {
        let (id, key) = id_of(&doc)?;
        let mut guard = self.store.write();
        let store = &mut *guard;
        if store.ids.contains_key(&key) {
            return Err(DslError::DuplicateKey(format!(
                "index '_id_' already contains key {id}"
            )));
        }
        store.indexes.check(&doc, &key)?;
        store.indexes.insert(&doc, &key);
        let seq = store.next_seq;
        store.next_seq += 1;
        store.ids.insert(key, seq);
        store.docs.insert(seq, doc);
        drop(guard);
        audit("insert", self.name_str(), &id);
        Ok(id)
    }

    /// Insert, or replace the document with the same `_id` in place.
    /// Returns true when a new document was inserted.
    ///
    /// # Errors
    /// ENTITY_ERROR without `_id`; DUPLICATE_KEY on a unique collision.
    pub fn upsert(&self, doc: BsonDocument) -> Result<bool> {
        let (id, key) = id_of(&doc)?;
        let mut guard = self.store.write();
        let store = &mut *guard;
        store.indexes.check(&doc, &key)?;
        let inserted = if let Some(&seq) = store.ids.get(&key) {
            if let Some(old) = store.docs.get(&seq) {
                store.indexes.remove(old, &key);
            }
            store.indexes.insert(&doc, &key);
            store.docs.insert(seq, doc);
            false
        } else {
            store.indexes.insert(&doc, &key);
            let seq = store.next_seq;
            store.next_seq += 1;
            store.ids.insert(key, seq);
            store.docs.insert(seq, doc);
            true
        };
        drop(guard);
        audit(if inserted { "insert" } else { "replace" }, self.name_str(), &id);
        Ok(inserted)
    }

    #[must_use]
    pub fn get(&self, id: &Bson) -> Option<BsonDocument> {
        let store = self.store.read();
        store.ids.get(&key_from_bson(id)).and_then(|seq| store.docs.get(seq)).cloned()
    }

    /// Apply `upd` to the first document (natural order) matching `filter`.
    /// Returns the document as stored afterwards.
    ///
    /// # Errors
    /// ENTITY_ERROR when the update touches `_id`; DUPLICATE_KEY on collision.
    pub fn update_first(&self, filter: &Filter, upd: &UpdateDoc) -> Result<Option<BsonDocument>> {
        if upd.set.iter().any(|(k, _)| k == "_id") || upd.unset.iter().any(|k| k == "_id") {
            return Err(DslError::entity("The _id field cannot be modified"));
        }
        let mut guard = self.store.write();
        let store = &mut *guard;
        let Some((seq, current)) = store
            .docs
            .iter()
            .find(|(_, d)| eval_filter(d, filter))
            .map(|(s, d)| (*s, d.clone()))
        else {
            return Ok(None);
        };
        let mut updated = current.clone();
        if !apply_update(&mut updated, upd) {
            return Ok(Some(updated));
        }
        let (id, key) = id_of(&current)?;
        store.indexes.check(&updated, &key)?;
        store.indexes.remove(&current, &key);
        store.indexes.insert(&updated, &key);
        store.docs.insert(seq, updated.clone());
        drop(guard);
        audit("update", self.name_str(), &id);
        Ok(Some(updated))
    }

    /// Remove documents matching `filter` (only the first when `just_one`).
    pub fn delete_where(&self, filter: &Filter, just_one: bool) -> usize {
        let mut guard = self.store.write();
        let store = &mut *guard;
        let mut victims: Vec<u64> =
            store.docs.iter().filter(|(_, d)| eval_filter(d, filter)).map(|(s, _)| *s).collect();
        if just_one {
            victims.truncate(1);
        }
        let mut removed = Vec::with_capacity(victims.len());
        for seq in victims {
            if let Some(doc) = store.docs.remove(&seq)
                && let Ok((id, key)) = id_of(&doc)
            {
                store.indexes.remove(&doc, &key);
                store.ids.remove(&key);
                removed.push(id);
            }
        }
        drop(guard);
        for id in &removed {
            audit("delete", self.name_str(), id);
        }
        removed.len()
    }
}
