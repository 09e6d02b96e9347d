//! Event evaluators: plugins that read records and emit derived event records.

mod log_profile_activity;
mod log_profile_missing;

pub use log_profile_activity::AzLogProfileMissingActivityType;
pub use log_profile_missing::AzLogProfileMissing;

use crate::record::Record;

/// A detector fed by the pipeline.
///
/// `eval` is called once per input record and returns the events it
/// detected, in a deterministic order. It never mutates the record and
/// returns nothing for records it does not apply to. `done` is called once
/// after the last `eval`; evaluators that accumulate state across records
/// emit their findings there.
pub trait EventPlugin: Send {
    fn kind(&self) -> &str;
    fn eval(&mut self, record: &Record) -> Vec<Record>;
    fn done(&mut self) -> Vec<Record> {
        Vec::new()
    }
}

/// Human-readable name of a `cloud_type` tag. Unknown tags are returned as is.
pub fn friendly_cloud_name(cloud_type: &str) -> &str {
    match cloud_type {
        "azure" => "Azure",
        "gcp" => "Google Cloud Platform",
        "aws" => "Amazon Web Services",
        other => other,
    }
}
