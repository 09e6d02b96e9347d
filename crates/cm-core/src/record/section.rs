use serde_json::{Map, Value};

/// Read-only view of the `ext` bucket: provider or record-type specific
/// fields.
///
/// Evaluators treat it as opaque apart from `record_type`, and pass it on to
/// the events they derive from a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extended<'a>(&'a Map<String, Value>);

impl<'a> Extended<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn record_type(&self) -> Option<&'a str> {
        self.get_str("record_type")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new mapping holding every entry of the bucket with `overrides`
    /// applied on top. Keys keep their position; new keys go last.
    pub fn merged<K, V>(&self, overrides: impl IntoIterator<Item = (K, V)>) -> Map<String, Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut out = self.0.clone();
        for (k, v) in overrides {
            out.insert(k.into(), v.into());
        }
        out
    }
}

/// Read-only view of the `raw` bucket: the provider payload as fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Raw<'a>(&'a Map<String, Value>);

impl<'a> Raw<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self(map)
    }

    /// `categories` as a list of strings.
    ///
    /// `None` when the key is absent or not an array. Non-string elements are
    /// ignored.
    pub fn categories(&self) -> Option<Vec<&'a str>> {
        let items = self.0.get("categories")?.as_array()?;
        Some(items.iter().filter_map(Value::as_str).collect())
    }
}
