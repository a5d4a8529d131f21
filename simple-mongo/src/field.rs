//! Operator, stage and well-known field name tokens

/// Primary key field of every document
pub const ID: &str = "_id";

// Comparison query operators
pub const EQ: &str = "$eq";
pub const NE: &str = "$ne";
pub const GT: &str = "$gt";
pub const GTE: &str = "$gte";
pub const LT: &str = "$lt";
pub const LTE: &str = "$lte";
pub const IN: &str = "$in";
pub const NIN: &str = "$nin";

// Logical query operators
pub const AND: &str = "$and";
pub const OR: &str = "$or";
pub const NOR: &str = "$nor";
pub const NOT: &str = "$not";

// Element / evaluation query operators
pub const EXISTS: &str = "$exists";
pub const TYPE: &str = "$type";
pub const EXPR: &str = "$expr";
pub const REGEX: &str = "$regex";
pub const OPTIONS: &str = "$options";
pub const TEXT: &str = "$text";
pub const SEARCH: &str = "$search";
pub const ELEM_MATCH: &str = "$elemMatch";
pub const ALL: &str = "$all";
pub const SIZE: &str = "$size";

// Update operators
pub const SET: &str = "$set";
pub const UNSET: &str = "$unset";
pub const INC: &str = "$inc";
pub const PUSH: &str = "$push";
pub const PULL: &str = "$pull";
pub const ADD_TO_SET: &str = "$addToSet";
pub const SET_ON_INSERT: &str = "$setOnInsert";

// Collection aggregation stages
pub const ADD_FIELDS: &str = "$addFields";
pub const BUCKET: &str = "$bucket";
pub const BUCKET_AUTO: &str = "$bucketAuto";
pub const COUNT: &str = "$count";
pub const FACET: &str = "$facet";
pub const GEO_NEAR: &str = "$geoNear";
pub const GRAPH_LOOKUP: &str = "$graphLookup";
pub const GROUP: &str = "$group";
pub const LIMIT: &str = "$limit";
pub const LOOKUP: &str = "$lookup";
pub const MATCH: &str = "$match";
pub const MERGE: &str = "$merge";
pub const OUT: &str = "$out";
pub const PROJECT: &str = "$project";
pub const REPLACE_ROOT: &str = "$replaceRoot";
pub const REPLACE_WITH: &str = "$replaceWith";
pub const SAMPLE: &str = "$sample";
pub const SKIP: &str = "$skip";
pub const SORT: &str = "$sort";
pub const SORT_BY_COUNT: &str = "$sortByCount";
pub const UNWIND: &str = "$unwind";

// Accumulators
pub const SUM: &str = "$sum";
pub const AVG: &str = "$avg";
pub const MIN: &str = "$min";
pub const MAX: &str = "$max";
pub const FIRST: &str = "$first";
pub const LAST: &str = "$last";

// Sort order
pub const NATURAL: &str = "$natural";

/// Whether `key` is an operator token rather than a field name.
pub fn is_operator(key: &str) -> bool {
    key.starts_with('$')
}
