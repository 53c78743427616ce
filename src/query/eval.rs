use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{
    CmpOp, Filter, MAX_PATH_DEPTH, MAX_SORT_FIELDS, Order, Projection, SortSpec,
};

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Not(f) => !eval_filter(doc, f),
        Filter::Exists { path, exists } => !path_values(doc, path).is_empty() == *exists,
        Filter::In { path, values } => matches_any(&path_values(doc, path), values),
        Filter::Nin { path, values } => !matches_any(&path_values(doc, path), values),
        Filter::Cmp { path, op, value } => {
            let found = path_values(doc, path);
            match op {
                CmpOp::Eq => matches_any(&found, std::slice::from_ref(value)),
                CmpOp::Gt => found.iter().any(|v| ordered(v, value) == Some(Ordering::Greater)),
                CmpOp::Gte => found
                    .iter()
                    .any(|v| matches!(ordered(v, value), Some(Ordering::Greater | Ordering::Equal))),
                CmpOp::Lt => found.iter().any(|v| ordered(v, value) == Some(Ordering::Less)),
                CmpOp::Lte => found
                    .iter()
                    .any(|v| matches!(ordered(v, value), Some(Ordering::Less | Ordering::Equal))),
            }
        }
        Filter::ElemMatch { path, filter } => path_values(doc, path).iter().any(|v| match v {
            Bson::Array(items) => items.iter().any(|item| match item {
                Bson::Document(sub) => eval_filter(sub, filter),
                _ => false,
            }),
            _ => false,
        }),
    }
}

/// Equality semantics of a value set: a null member also matches a missing field.
fn matches_any(found: &[&Bson], set: &[Bson]) -> bool {
    set.iter().any(|want| match want {
        Bson::Null => found.is_empty() || found.iter().any(|v| matches!(v, Bson::Null)),
        want => found.iter().any(|v| values_equal(v, want)),
    })
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match numeric_cmp(a, b) {
        Some(ord) => ord == Ordering::Equal,
        None => a == b,
    }
}

/// Range comparison; only defined between values of the same kind.
fn ordered(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let Some(ord) = numeric_cmp(a, b) {
        return Some(ord);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Every value reachable at `path`. Arrays met along the way are traversed
/// element-wise; an array at the end contributes itself and its elements.
fn path_values<'a>(doc: &'a BsonDocument, path: &str) -> Vec<&'a Bson> {
    let mut out = Vec::new();
    if path.is_empty() || path.len() > 1024 || path.split('.').count() > MAX_PATH_DEPTH {
        return out;
    }
    collect_path(doc, path, &mut out);
    out
}

fn collect_path<'a>(doc: &'a BsonDocument, path: &str, out: &mut Vec<&'a Bson>) {
    let (head, rest) = match path.split_once('.') {
        Some((h, r)) => (h, Some(r)),
        None => (path, None),
    };
    let Some(value) = doc.get(head) else {
        return;
    };
    match rest {
        None => {
            out.push(value);
            if let Bson::Array(items) = value {
                out.extend(items.iter());
            }
        }
        Some(rest) => match value {
            Bson::Document(sub) => collect_path(sub, rest, out),
            Bson::Array(items) => {
                for item in items {
                    if let Bson::Document(sub) = item {
                        collect_path(sub, rest, out);
                    }
                }
            }
            _ => {}
        },
    }
}

pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let va = path_values(a, &s.field).into_iter().next();
        let vb = path_values(b, &s.field).into_iter().next();
        let ord = match (va, vb) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if matches!(s.order, Order::Asc) { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

fn as_i64_num(x: &Bson) -> Option<i64> {
    match x {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

/// Integers compare exactly; a double on either side compares as `f64`.
/// `None` unless both sides are numbers.
#[allow(clippy::cast_precision_loss)]
fn numeric_cmp(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_i64_num(a), as_i64_num(b)) {
        return Some(x.cmp(&y));
    }
    let as_f64 = |v: &Bson| match v {
        Bson::Double(f) => Some(*f),
        other => as_i64_num(other).map(|i| i as f64),
    };
    Some(as_f64(a)?.total_cmp(&as_f64(b)?))
}

/// Total order used for sorting: same-kind values compare naturally,
/// different kinds by a fixed type rank.
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    ordered(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::Null => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 1,
        Bson::String(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::ObjectId(_) => 5,
        Bson::Boolean(_) => 6,
        Bson::DateTime(_) => 7,
        _ => 8,
    }
}

pub fn apply_projection(doc: &BsonDocument, projection: &Projection) -> BsonDocument {
    match projection {
        Projection::Include(paths) => {
            let mut out = BsonDocument::new();
            if let Some(id) = doc.get("_id") {
                out.insert("_id", id.clone());
            }
            for p in paths {
                include_path(doc, &mut out, p);
            }
            out
        }
        Projection::Exclude(paths) => {
            let mut out = doc.clone();
            for p in paths {
                remove_path(&mut out, p);
            }
            out
        }
    }
}

fn include_path(src: &BsonDocument, out: &mut BsonDocument, path: &str) {
    match path.split_once('.') {
        None => {
            if let Some(v) = src.get(path) {
                out.insert(path, v.clone());
            }
        }
        Some((head, rest)) => {
            let Some(Bson::Document(sub)) = src.get(head) else {
                return;
            };
            if !matches!(out.get(head), Some(Bson::Document(_))) {
                out.insert(head, BsonDocument::new());
            }
            if let Some(Bson::Document(target)) = out.get_mut(head) {
                include_path(sub, target, rest);
            }
        }
    }
}

fn remove_path(doc: &mut BsonDocument, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(sub)) = doc.get_mut(head) {
                remove_path(sub, rest);
            }
        }
    }
}
