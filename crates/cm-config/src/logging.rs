use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Logging configuration. Every field has a default, so the `[logging]`
/// section may be left out of `cloudmark.toml` entirely.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level filter (`"info"`, `"debug"`, ...).
    pub level: String,
    /// Per-module overrides, e.g. `{ "cm_core::alert" = "debug" }`.
    pub modules: HashMap<String, String>,
    /// Optional log file. Relative paths resolve against the directory that
    /// holds the config file.
    pub file: Option<PathBuf>,
    /// `plain` for humans, `json` for log shippers.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: HashMap::new(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

impl LoggingConfig {
    /// Render the level plus module overrides as an `EnvFilter` directive
    /// string. Overrides are sorted so the output is stable.
    pub fn directives(&self) -> String {
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        let mut out = self.level.clone();
        for (module, level) in modules {
            out.push(',');
            out.push_str(module);
            out.push('=');
            out.push_str(level);
        }
        out
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}
