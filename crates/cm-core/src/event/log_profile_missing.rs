use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::Span;

use super::{EventPlugin, friendly_cloud_name};
use crate::record::{EventFields, Extended, Record};

pub const KIND: &str = "az_log_profile_missing";
pub const EVENT_TYPE: &str = "log_profile_missing_event";

const CLOUD: &str = "azure";

/// Reports Azure subscriptions that produced records but no log profile.
///
/// Subscriptions are keyed by `ext.subscription_id`. Nothing is emitted
/// from `eval`; findings come out of `done`, sorted by subscription id.
pub struct AzLogProfileMissing {
    seen: BTreeSet<String>,
    profiled: BTreeSet<String>,
    span: Span,
}

impl AzLogProfileMissing {
    pub fn new() -> Self {
        Self {
            seen: BTreeSet::new(),
            profiled: BTreeSet::new(),
            span: tracing::info_span!("event", plugin = KIND),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl Default for AzLogProfileMissing {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPlugin for AzLogProfileMissing {
    fn kind(&self) -> &str {
        KIND
    }

    fn eval(&mut self, record: &Record) -> Vec<Record> {
        let _guard = self.span.enter();

        let Some(com) = record.com().filter(|c| c.cloud_type() == Some(CLOUD)) else {
            return Vec::new();
        };
        let Some(sub) = record.ext().and_then(|e| e.get_str("subscription_id")) else {
            cm_trace!(pipe, reference = ?com.reference(), "azure record without subscription id");
            return Vec::new();
        };
        if com.record_type() == Some("log_profile") {
            self.profiled.insert(sub.to_string());
        }
        self.seen.insert(sub.to_string());
        Vec::new()
    }

    fn done(&mut self) -> Vec<Record> {
        let _guard = self.span.enter();
        let seen = std::mem::take(&mut self.seen);
        let profiled = std::mem::take(&mut self.profiled);
        let friendly = friendly_cloud_name(CLOUD);

        let events: Vec<Record> = seen
            .difference(&profiled)
            .map(|sub| {
                let base: Map<String, Value> =
                    [("subscription_id".to_string(), Value::from(sub.as_str()))]
                        .into_iter()
                        .collect();
                Record::event(
                    EventFields {
                        record_type: EVENT_TYPE,
                        cloud_type: Some(CLOUD),
                        reference: Some(sub),
                        description: format!("{friendly} subscription {sub} has no log profile."),
                        recommendation: format!(
                            "Check {friendly} subscription {sub} and create a log profile."
                        ),
                    },
                    Some(Extended::new(&base)),
                )
            })
            .collect();

        cm_debug!(
            pipe,
            subscriptions = seen.len(),
            missing = events.len(),
            "log profile coverage evaluated"
        );
        events
    }
}
