//! Aggregation pipeline stage constructors
//!
//! Each function returns one `{ $stage: ... }` document so pipelines read as
//! a plain `vec![...]`:
//!
//! ```
//! use simple_mongo::{bson::doc, stage};
//!
//! let pipeline = vec![
//!     stage::match_(doc! { "status": "paid" }),
//!     stage::group("$customer", doc! { "total": { "$sum": "$amount" } }),
//!     stage::limit(10),
//! ];
//! assert_eq!(pipeline.len(), 3);
//! ```

use bson::{doc, Bson, Document};

use crate::field;

/// A one-key `{ name: value }` document.
pub fn stage(name: &str, value: impl Into<Bson>) -> Document {
    let mut stage = Document::new();
    stage.insert(name, value.into());
    stage
}

pub fn match_(filter: Document) -> Document {
    stage(field::MATCH, filter)
}

pub fn sort(keys: Document) -> Document {
    stage(field::SORT, keys)
}

pub fn skip(n: i64) -> Document {
    stage(field::SKIP, n)
}

pub fn limit(n: i64) -> Document {
    stage(field::LIMIT, n)
}

pub fn project(fields: Document) -> Document {
    stage(field::PROJECT, fields)
}

pub fn count(output: &str) -> Document {
    stage(field::COUNT, output)
}

pub fn add_fields(fields: Document) -> Document {
    stage(field::ADD_FIELDS, fields)
}

pub fn replace_root(new_root: impl Into<Bson>) -> Document {
    stage(field::REPLACE_ROOT, doc! { "newRoot": new_root.into() })
}

/// `$group` with `_id` set to `id`; accumulator fields are appended after it.
pub fn group(id: impl Into<Bson>, accumulators: Document) -> Document {
    let mut body = Document::new();
    body.insert(field::ID, id.into());
    for (key, value) in accumulators {
        body.insert(key, value);
    }
    stage(field::GROUP, body)
}

pub fn lookup(from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Document {
    stage(
        field::LOOKUP,
        doc! {
            "from": from,
            "localField": local_field,
            "foreignField": foreign_field,
            "as": as_field,
        },
    )
}

/// `$unwind` on a field path; `path` may be given with or without the `$`.
pub fn unwind(path: &str) -> Document {
    stage(field::UNWIND, field_path(path))
}

/// `$unwind` that keeps documents whose array is missing or empty.
pub fn unwind_preserve(path: &str) -> Document {
    stage(
        field::UNWIND,
        doc! {
            "path": field_path(path),
            "preserveNullAndEmptyArrays": true,
        },
    )
}

fn field_path(path: &str) -> String {
    if path.starts_with('$') {
        path.to_owned()
    } else {
        format!("${}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_puts_id_first() {
        let stage = group("$team", doc! { "n": { "$sum": 1 } });
        let body = stage.get_document("$group").unwrap();
        let keys: Vec<_> = body.keys().collect();
        assert_eq!(keys, vec!["_id", "n"]);
    }

    #[test]
    fn unwind_normalises_path() {
        assert_eq!(unwind("tags"), doc! { "$unwind": "$tags" });
        assert_eq!(unwind("$tags"), doc! { "$unwind": "$tags" });
    }

    #[test]
    fn unwind_preserve_shape() {
        assert_eq!(
            unwind_preserve("items"),
            doc! { "$unwind": { "path": "$items", "preserveNullAndEmptyArrays": true } }
        );
    }

    #[test]
    fn lookup_shape() {
        let stage = lookup("users", "user_id", "_id", "user");
        let body = stage.get_document("$lookup").unwrap();
        assert_eq!(body.get_str("from").unwrap(), "users");
        assert_eq!(body.get_str("as").unwrap(), "user");
    }
}
