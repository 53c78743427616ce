use bson::{Bson, Document as BsonDocument};

use crate::collection::Collection;

use super::eval::{apply_projection, compare_docs, eval_filter};
use super::types::{Filter, FindOptions, MAX_LIMIT, MAX_SORT_FIELDS, UpdateDoc};

fn as_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Matching documents in natural order, then sorted, paged and projected.
#[must_use]
pub fn find_docs(col: &Collection, filter: &Filter, opts: &FindOptions) -> Vec<BsonDocument> {
    let bench_start = std::time::Instant::now();
    let mut docs: Vec<BsonDocument> =
        col.documents().into_iter().filter(|d| eval_filter(d, filter)).collect();

    if let Some(sort) = &opts.sort {
        if sort.len() > MAX_SORT_FIELDS {
            log::warn!("sort spec too long: {}", sort.len());
        }
        docs.sort_by(|a, b| compare_docs(a, b, sort));
    }

    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
    let mut docs: Vec<BsonDocument> = docs.into_iter().skip(skip).take(limit).collect();

    if let Some(projection) = &opts.projection {
        for d in &mut docs {
            *d = apply_projection(d, projection);
        }
    }

    crate::dev6!(
        "{{\"bench\":\"query\",\"op\":\"find\",\"collection\":\"{}\",\"duration_ms\":{},\"result_count\":{},\"limit\":{},\"skip\":{}}}",
        col.name_str(),
        bench_start.elapsed().as_millis(),
        as_u64(docs.len()),
        as_u64(opts.limit.unwrap_or(0)),
        as_u64(skip)
    );
    docs
}

#[must_use]
pub fn count_docs(col: &Collection, filter: &Filter) -> usize {
    let start = std::time::Instant::now();
    let n = col.documents().iter().filter(|d| eval_filter(d, filter)).count();
    crate::dev6!(
        "{{\"bench\":\"query\",\"op\":\"count\",\"collection\":\"{}\",\"duration_ms\":{},\"result_count\":{}}}",
        col.name_str(),
        start.elapsed().as_millis(),
        as_u64(n)
    );
    n
}

/// Apply `$set` / `$unset` style changes; dotted paths create sub-documents.
pub fn apply_update(doc: &mut BsonDocument, upd: &UpdateDoc) -> bool {
    fn traverse_to_parent<'a>(
        root: &'a mut BsonDocument,
        path: &str,
    ) -> Option<(&'a mut BsonDocument, String)> {
        match path.split_once('.') {
            None => Some((root, path.to_string())),
            Some((head, rest)) => {
                if !matches!(root.get(head), Some(Bson::Document(_))) {
                    root.insert(head, BsonDocument::new());
                }
                match root.get_mut(head) {
                    Some(Bson::Document(sub)) => traverse_to_parent(sub, rest),
                    _ => None,
                }
            }
        }
    }
    fn set_path(root: &mut BsonDocument, path: &str, value: &Bson) -> bool {
        let Some((parent, last)) = traverse_to_parent(root, path) else {
            return false;
        };
        let old = parent.insert(last, value.clone());
        old.as_ref() != Some(value)
    }
    fn unset_path(root: &mut BsonDocument, path: &str) -> bool {
        match path.split_once('.') {
            None => root.remove(path).is_some(),
            Some((head, rest)) => match root.get_mut(head) {
                Some(Bson::Document(sub)) => unset_path(sub, rest),
                _ => false,
            },
        }
    }

    let mut changed = false;
    for (k, v) in &upd.set {
        if set_path(doc, k, v) {
            changed = true;
        }
    }
    for k in &upd.unset {
        if unset_path(doc, k) {
            changed = true;
        }
    }
    changed
}
