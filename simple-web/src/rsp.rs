//! Ad-hoc response maps

use serde::Serialize;
use serde_json::{Map, Value};

use crate::result::{json_data, JsonResult};

/// String-keyed JSON object assembled field by field, optionally seeded
/// from any serializable struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RspBuilder {
    data: Map<String, Value>,
}

impl RspBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from `obj`, which must serialize to a JSON object.
    pub fn from_object<T: Serialize>(obj: &T) -> serde_json::Result<Self> {
        Self::from_object_excludes(obj, &[])
    }

    /// Seed from `obj`, dropping the `excludes` keys.
    pub fn from_object_excludes<T: Serialize>(obj: &T, excludes: &[&str]) -> serde_json::Result<Self> {
        let mut data: Map<String, Value> = serde_json::from_value(serde_json::to_value(obj)?)?;
        for key in excludes {
            data.remove(*key);
        }
        Ok(Self { data })
    }

    pub fn put(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Map<String, Value> {
        self.data
    }

    pub fn json_result(self) -> JsonResult {
        json_data(Value::Object(self.data))
    }
}

/// Map every item through `conv`, dropping those it returns `None` for.
pub fn convert_list<T, F>(items: impl IntoIterator<Item = T>, conv: F) -> Vec<Map<String, Value>>
where
    F: FnMut(T) -> Option<Map<String, Value>>,
{
    items.into_iter().filter_map(conv).collect()
}
