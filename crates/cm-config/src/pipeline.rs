use serde::Deserialize;

/// `[pipeline]`: which configured plugins run, and in which order.
///
/// An omitted list means "every plugin defined in the file, in name order".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub events: Option<Vec<String>>,
    pub alerts: Option<Vec<String>>,
}
