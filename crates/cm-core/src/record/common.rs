use serde_json::{Map, Value};

/// Read-only view of the `com` bucket: cloud-agnostic fields every producer
/// normalizes.
///
/// Accessors only return strings. A field holding any other JSON type reads
/// as absent, so a producer that mistypes one field makes the record not
/// applicable to evaluators that branch on it, without rejecting the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Common<'a>(&'a Map<String, Value>);

impl<'a> Common<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self(map)
    }

    fn str_field(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// True when both discriminators are present and equal the given values.
    pub fn is(&self, cloud_type: &str, record_type: &str) -> bool {
        self.cloud_type() == Some(cloud_type) && self.record_type() == Some(record_type)
    }

    pub fn cloud_type(&self) -> Option<&'a str> {
        self.str_field("cloud_type")
    }

    pub fn record_type(&self) -> Option<&'a str> {
        self.str_field("record_type")
    }

    pub fn reference(&self) -> Option<&'a str> {
        self.str_field("reference")
    }

    pub fn description(&self) -> Option<&'a str> {
        self.str_field("description")
    }

    pub fn recommendation(&self) -> Option<&'a str> {
        self.str_field("recommendation")
    }
}
