use std::io::Cursor;

use cm_config::CloudmarkConfig;
use cm_runtime::{Pipeline, RunSummary};
use serde_json::Value;

const INPUT: &str = r#"
{"com": {"cloud_type": "azure", "record_type": "log_profile", "reference": "lp-1"}, "ext": {"record_type": "log_profile", "subscription_id": "sub-1"}, "raw": {"categories": ["Write", "Delete"]}}
{"com": {"cloud_type": "azure", "record_type": "virtual_machine", "reference": "vm-1"}, "ext": {"record_type": "virtual_machine", "subscription_id": "sub-2"}, "raw": {}}
this line is garbage
{"com": {"cloud_type": "gcp", "record_type": "log_profile", "reference": "lp-g"}, "ext": {}, "raw": {"categories": []}}
"#;

fn config(unreachable_mail: bool) -> CloudmarkConfig {
    let mut toml = String::from(
        r#"
[logging]
level = "warn"

[events.activity]
kind = "az_log_profile_missing_activity_type"

[events.coverage]
kind = "az_log_profile_missing"

[alerts.archive]
kind = "file"
path = "out/events.jsonl"
"#,
    );
    if unreachable_mail {
        toml.push_str(
            r#"
[alerts.mail]
kind = "email"
host = "127.0.0.1"
port = 1
security = "plain"
subject = "Cloud findings"
sender = "bot@example.com"
to = ["ops@example.com"]
timeout = "2s"

[pipeline]
alerts = ["mail", "archive"]
"#,
        );
    }
    toml.parse().unwrap()
}

fn read_events(path: &std::path::Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn end_to_end_into_file_sink() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::from_config(&config(false), dir.path()).unwrap();
    let summary = pipeline.run(Cursor::new(INPUT)).unwrap();

    assert_eq!(
        summary,
        RunSummary {
            records: 3,
            events: 2,
            skipped: 1,
        }
    );

    let events = read_events(&dir.path().join("out/events.jsonl"));
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["com"]["record_type"], "log_profile_missing_activity_type_event");
    assert_eq!(events[0]["com"]["reference"], "lp-1");
    assert_eq!(events[0]["ext"]["subscription_id"], "sub-1");
    assert_eq!(
        events[0]["com"]["description"],
        "Azure log profile lp-1 is not enabled for Action activity."
    );
    assert_eq!(events[1]["com"]["record_type"], "log_profile_missing_event");
    assert_eq!(events[1]["com"]["reference"], "sub-2");
}

#[test]
fn failed_email_does_not_stop_other_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::from_config(&config(true), dir.path()).unwrap();
    let summary = pipeline.run(Cursor::new(INPUT)).unwrap();

    assert_eq!(summary.events, 2);
    assert_eq!(read_events(&dir.path().join("out/events.jsonl")).len(), 2);
}
