use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::alert::AlertConfig;
use crate::event::EventConfig;
use crate::logging::LoggingConfig;
use crate::pipeline::PipelineConfig;
use crate::validate;

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CloudmarkConfigRaw {
    #[serde(default)]
    events: BTreeMap<String, EventConfig>,
    #[serde(default)]
    alerts: BTreeMap<String, AlertConfig>,
    #[serde(default)]
    pipeline: PipelineConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// CloudmarkConfig (resolved, validated)
// ---------------------------------------------------------------------------

/// A named evaluator, in pipeline order.
#[derive(Debug, Clone)]
pub struct EventEntry {
    pub name: String,
    pub config: EventConfig,
}

/// A named alert sink, in pipeline order.
#[derive(Debug, Clone)]
pub struct AlertEntry {
    pub name: String,
    pub config: AlertConfig,
}

#[derive(Debug)]
pub struct CloudmarkConfig {
    /// Evaluators that run, in the order records visit them.
    pub events: Vec<EventEntry>,
    /// Alert sinks that receive every event, in delivery order.
    pub alerts: Vec<AlertEntry>,
    pub logging: LoggingConfig,
}

impl CloudmarkConfig {
    /// Read and parse a `cloudmark.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }
}

impl FromStr for CloudmarkConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a resolved, validated [`CloudmarkConfig`].
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: CloudmarkConfigRaw = toml::from_str(toml_str)?;

        validate::validate_names("events", raw.events.keys())?;
        validate::validate_names("alerts", raw.alerts.keys())?;

        let events = select("events", raw.events, raw.pipeline.events)?
            .into_iter()
            .map(|(name, config)| EventEntry { name, config })
            .collect();
        let alerts = select("alerts", raw.alerts, raw.pipeline.alerts)?
            .into_iter()
            .map(|(name, config)| AlertEntry { name, config })
            .collect();

        let config = CloudmarkConfig {
            events,
            alerts,
            logging: raw.logging,
        };

        validate::validate(&config)?;

        Ok(config)
    }
}

/// Pick the plugins named in `[pipeline].<section>` in the listed order, or
/// every defined plugin in name order when the list is absent.
fn select<T: Clone>(
    section: &str,
    defined: BTreeMap<String, T>,
    wanted: Option<Vec<String>>,
) -> anyhow::Result<Vec<(String, T)>> {
    let Some(wanted) = wanted else {
        return Ok(defined.into_iter().collect());
    };
    let mut out = Vec::with_capacity(wanted.len());
    for name in wanted {
        if out.iter().any(|(n, _)| *n == name) {
            anyhow::bail!("pipeline.{section}: {name:?} listed more than once");
        }
        let cfg = defined.get(&name).ok_or_else(|| {
            anyhow::anyhow!("pipeline.{section}: {name:?} is not defined under [{section}]")
        })?;
        out.push((name, cfg.clone()));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
