//! The record contract shared by every plugin.
//!
//! A [`Record`] is a JSON object. Three top-level keys carry meaning:
//! `com` (normalized, cloud-agnostic fields), `ext` (provider specific
//! fields) and `raw` (the unmodified provider payload). They are read through
//! borrowed views; the record itself keeps every key in arrival order.
//! Evaluators read records and build new event records; nothing in the
//! pipeline mutates a record it was handed.

mod common;
mod section;

use orion_error::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreReason, CoreResult};

pub use common::Common;
pub use section::{Extended, Raw};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// The fixed `com` fields of a newly detected event.
#[derive(Debug, Clone)]
pub struct EventFields<'a> {
    pub record_type: &'a str,
    pub cloud_type: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub description: String,
    pub recommendation: String,
}

impl Record {
    /// Parse a JSON value into a record. Only objects are accepted; the
    /// contents of the buckets are not checked.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => StructError::from(CoreReason::DataFormat)
                .with_detail(format!("record must be a JSON object, got {}", kind_of(&other)))
                .err(),
        }
    }

    /// Build an event record. `ext` starts from `source_ext` (when given) with
    /// `record_type` overridden; the source mapping is not touched.
    pub fn event(fields: EventFields<'_>, source_ext: Option<Extended<'_>>) -> Self {
        let ext = match source_ext {
            Some(src) => src.merged([("record_type", fields.record_type)]),
            None => Extended::new(&Map::new()).merged([("record_type", fields.record_type)]),
        };

        let mut com = Map::new();
        if let Some(cloud_type) = fields.cloud_type {
            com.insert("cloud_type".into(), cloud_type.into());
        }
        com.insert("record_type".into(), fields.record_type.into());
        if let Some(reference) = fields.reference {
            com.insert("reference".into(), reference.into());
        }
        com.insert("description".into(), fields.description.into());
        com.insert("recommendation".into(), fields.recommendation.into());

        let mut map = Map::new();
        map.insert("ext".into(), Value::Object(ext));
        map.insert("com".into(), Value::Object(com));
        Self(map)
    }

    fn bucket(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get(key).and_then(Value::as_object)
    }

    /// The `com` bucket, when present and an object.
    pub fn com(&self) -> Option<Common<'_>> {
        self.bucket("com").map(Common::new)
    }

    /// The `ext` bucket, when present and an object.
    pub fn ext(&self) -> Option<Extended<'_>> {
        self.bucket("ext").map(Extended::new)
    }

    /// The `raw` bucket, when present and an object.
    pub fn raw(&self) -> Option<Raw<'_>> {
        self.bucket("raw").map(Raw::new)
    }

    /// `com.record_type`, if present.
    pub fn record_type(&self) -> Option<&str> {
        self.com().and_then(|com| com.record_type())
    }

    /// Every top-level value, `null` included, in the order the keys arrived.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
