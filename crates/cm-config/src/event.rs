use serde::Deserialize;

/// One `[events.<name>]` table. The `kind` key picks the evaluator; the
/// built-in evaluators take no parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventConfig {
    /// Azure log profiles not enabled for every activity category.
    AzLogProfileMissingActivityType,
    /// Azure subscriptions that never produced a log profile record.
    AzLogProfileMissing,
}

impl EventConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AzLogProfileMissingActivityType => "az_log_profile_missing_activity_type",
            Self::AzLogProfileMissing => "az_log_profile_missing",
        }
    }
}
