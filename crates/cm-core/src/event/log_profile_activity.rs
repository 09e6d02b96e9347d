use tracing::Span;

use super::{EventPlugin, friendly_cloud_name};
use crate::record::{EventFields, Record};

pub const KIND: &str = "az_log_profile_missing_activity_type";
pub const EVENT_TYPE: &str = "log_profile_missing_activity_type_event";

/// Activity categories every log profile must capture, in emission order.
const REQUIRED_ACTIVITIES: [&str; 3] = ["Write", "Delete", "Action"];

/// Flags Azure log profiles that do not capture every activity category.
///
/// Applies to records with `com.cloud_type == "azure"`,
/// `com.record_type == "log_profile"`, and both `ext` and `raw` present.
/// One event is emitted per category missing from `raw.categories`.
pub struct AzLogProfileMissingActivityType {
    span: Span,
}

impl AzLogProfileMissingActivityType {
    pub fn new() -> Self {
        Self {
            span: tracing::info_span!("event", plugin = KIND),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl Default for AzLogProfileMissingActivityType {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPlugin for AzLogProfileMissingActivityType {
    fn kind(&self) -> &str {
        KIND
    }

    fn eval(&mut self, record: &Record) -> Vec<Record> {
        let _guard = self.span.enter();

        let Some(com) = record.com().filter(|c| c.is("azure", "log_profile")) else {
            return Vec::new();
        };
        let (Some(ext), Some(raw)) = (record.ext(), record.raw()) else {
            cm_debug!(pipe, reference = ?com.reference(), "log profile without ext or raw, skipped");
            return Vec::new();
        };
        let Some(categories) = raw.categories() else {
            cm_debug!(pipe, reference = ?com.reference(), "log profile without categories, skipped");
            return Vec::new();
        };

        let cloud = com.cloud_type().unwrap_or_default();
        let friendly = friendly_cloud_name(cloud);
        let reference = com.reference().unwrap_or_default();

        REQUIRED_ACTIVITIES
            .into_iter()
            .filter(|activity| !categories.contains(activity))
            .map(|activity| {
                cm_debug!(pipe, reference, activity, "log profile misses activity category");
                Record::event(
                    EventFields {
                        record_type: EVENT_TYPE,
                        cloud_type: com.cloud_type(),
                        reference: com.reference(),
                        description: format!(
                            "{friendly} log profile {reference} is not enabled for {activity} activity."
                        ),
                        recommendation: format!(
                            "Check {friendly} log profile {reference} and enable for {activity} activity."
                        ),
                    },
                    Some(ext),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn log_profile(categories: Value) -> Record {
        Record::from_value(json!({
            "com": {
                "cloud_type": "azure",
                "record_type": "log_profile",
                "reference": "/subscriptions/s1/providers/microsoft.insights/logprofiles/default",
            },
            "ext": {
                "record_type": "log_profile",
                "subscription_id": "s1",
            },
            "raw": {"categories": categories},
        }))
        .unwrap()
    }

    #[test]
    fn emits_missing_categories_in_fixed_order() {
        let mut ev = AzLogProfileMissingActivityType::new();
        let events = ev.eval(&log_profile(json!(["Write"])));

        assert_eq!(events.len(), 2);
        for e in &events {
            assert_eq!(e.record_type(), Some(EVENT_TYPE));
            assert_eq!(e.ext().unwrap().record_type(), Some(EVENT_TYPE));
        }
        let descriptions: Vec<_> = events
            .iter()
            .map(|e| e.com().unwrap().description().unwrap().to_string())
            .collect();
        assert!(descriptions[0].ends_with("is not enabled for Delete activity."));
        assert!(descriptions[1].ends_with("is not enabled for Action activity."));
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut ev = AzLogProfileMissingActivityType::new();
        let a = ev.eval(&log_profile(json!(["Action", "Other"])));
        let b = ev.eval(&log_profile(json!(["Other", "Action"])));
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn complete_profile_yields_nothing() {
        let mut ev = AzLogProfileMissingActivityType::new();
        assert!(ev.eval(&log_profile(json!(["Delete", "Action", "Write"]))).is_empty());
    }

    #[test]
    fn empty_categories_yield_all_three() {
        let mut ev = AzLogProfileMissingActivityType::new();
        assert_eq!(ev.eval(&log_profile(json!([]))).len(), 3);
    }

    #[test]
    fn event_text_and_reference() {
        let mut ev = AzLogProfileMissingActivityType::new();
        let events = ev.eval(&log_profile(json!(["Write", "Delete"])));
        let com = events[0].com().unwrap();
        let reference = "/subscriptions/s1/providers/microsoft.insights/logprofiles/default";
        assert_eq!(com.cloud_type(), Some("azure"));
        assert_eq!(com.reference(), Some(reference));
        assert_eq!(
            com.description(),
            Some(format!("Azure log profile {reference} is not enabled for Action activity.").as_str())
        );
        assert_eq!(
            com.recommendation(),
            Some(format!("Check Azure log profile {reference} and enable for Action activity.").as_str())
        );
        assert!(events[0].raw().is_none());
    }

    #[test]
    fn ext_is_propagated_without_mutation() {
        let input = log_profile(json!(["Write"]));
        let before = input.clone();
        let mut ev = AzLogProfileMissingActivityType::new();
        let events = ev.eval(&input);

        assert_eq!(input, before);
        let src = input.ext().unwrap();
        for e in &events {
            let ext = e.ext().unwrap();
            assert_eq!(ext.len(), src.len());
            assert_eq!(ext.get_str("subscription_id"), Some("s1"));
            assert_eq!(ext.record_type(), Some(EVENT_TYPE));
        }
        assert_eq!(src.record_type(), Some("log_profile"));
    }

    #[test]
    fn other_clouds_and_types_not_applicable() {
        let mut ev = AzLogProfileMissingActivityType::new();
        for (cloud, rtype) in [("gcp", "log_profile"), ("azure", "virtual_machine")] {
            let rec = Record::from_value(json!({
                "com": {"cloud_type": cloud, "record_type": rtype},
                "ext": {},
                "raw": {"categories": []},
            }))
            .unwrap();
            assert!(ev.eval(&rec).is_empty());
        }
    }

    #[test]
    fn missing_buckets_not_applicable() {
        let mut ev = AzLogProfileMissingActivityType::new();
        let com = json!({"cloud_type": "azure", "record_type": "log_profile"});
        let cases = [
            json!({}),
            json!({"com": com, "raw": {"categories": []}}),
            json!({"com": com, "ext": {}}),
            json!({"com": com, "ext": null, "raw": {"categories": []}}),
            json!({"com": com, "ext": {}, "raw": {}}),
            json!({"com": com, "ext": {}, "raw": {"categories": "Write"}}),
        ];
        for case in cases {
            let rec = Record::from_value(case).unwrap();
            assert!(ev.eval(&rec).is_empty());
        }
        assert!(ev.done().is_empty());
    }
}
