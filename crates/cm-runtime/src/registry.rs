use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cm_config::{AlertConfig, AlertEntry, CloudmarkConfig, EventConfig, EventEntry};
use cm_core::alert::AlertPlugin;
use cm_core::event::EventPlugin;
use cm_core::{cm_debug, cm_info};
use orion_error::op_context;
use orion_error::prelude::*;
use tracing::Span;

use crate::error::{RuntimeReason, RuntimeResult};
use crate::factory;

// ---------------------------------------------------------------------------
// Factory traits
// ---------------------------------------------------------------------------

/// Per-plugin build context.
#[derive(Debug, Clone, Copy)]
pub struct BuildCtx<'a> {
    /// Name of the `[events.<name>]` / `[alerts.<name>]` table.
    pub name: &'a str,
    /// Directory relative paths in plugin configs resolve against.
    pub base_dir: &'a Path,
}

impl BuildCtx<'_> {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.base_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    pub fn event_span(&self, kind: &str) -> Span {
        tracing::info_span!("event", name = %self.name, plugin = %kind)
    }

    pub fn alert_span(&self, kind: &str) -> Span {
        tracing::info_span!("alert", name = %self.name, plugin = %kind)
    }
}

/// Builds one kind of evaluator.
pub trait EventFactory: Send + Sync {
    fn kind(&self) -> &'static str;
    fn build(&self, config: &EventConfig, ctx: &BuildCtx<'_>)
    -> RuntimeResult<Box<dyn EventPlugin>>;
}

/// Builds one kind of alert sink.
pub trait AlertFactory: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Check a config as far as possible without opening files or sockets.
    fn validate(&self, config: &AlertConfig, ctx: &BuildCtx<'_>) -> RuntimeResult<()>;

    fn build(&self, config: &AlertConfig, ctx: &BuildCtx<'_>)
    -> RuntimeResult<Box<dyn AlertPlugin>>;
}

// ---------------------------------------------------------------------------
// PluginRegistry
// ---------------------------------------------------------------------------

/// Maps the `kind` string of a config table to the factory that builds it.
pub struct PluginRegistry {
    events: HashMap<String, Arc<dyn EventFactory>>,
    alerts: HashMap<String, Arc<dyn AlertFactory>>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            events: HashMap::new(),
            alerts: HashMap::new(),
        }
    }

    /// A registry holding every plugin shipped with cloudmark.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register_event(Arc::new(factory::LogProfileActivityFactory));
        reg.register_event(Arc::new(factory::LogProfileMissingFactory));
        reg.register_alert(Arc::new(factory::EmailAlertFactory));
        reg.register_alert(Arc::new(factory::FileAlertFactory));
        reg
    }

    pub fn register_event(&mut self, factory: Arc<dyn EventFactory>) {
        self.events.insert(factory.kind().to_string(), factory);
    }

    pub fn register_alert(&mut self, factory: Arc<dyn AlertFactory>) {
        self.alerts.insert(factory.kind().to_string(), factory);
    }

    fn event_factory(&self, name: &str, kind: &str) -> RuntimeResult<&Arc<dyn EventFactory>> {
        self.events.get(kind).ok_or_else(|| {
            StructError::from(RuntimeReason::Bootstrap)
                .with_detail(format!("events.{name}: no evaluator registered for kind {kind:?}"))
        })
    }

    fn alert_factory(&self, name: &str, kind: &str) -> RuntimeResult<&Arc<dyn AlertFactory>> {
        self.alerts.get(kind).ok_or_else(|| {
            StructError::from(RuntimeReason::Bootstrap)
                .with_detail(format!("alerts.{name}: no alert sink registered for kind {kind:?}"))
        })
    }

    /// Build evaluators in the given order.
    pub fn build_events(
        &self,
        entries: &[EventEntry],
        base_dir: &Path,
    ) -> RuntimeResult<Vec<Box<dyn EventPlugin>>> {
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let kind = entry.config.kind();
            let ctx = BuildCtx {
                name: &entry.name,
                base_dir,
            };
            out.push(self.event_factory(&entry.name, kind)?.build(&entry.config, &ctx)?);
            cm_debug!(conf, name = %entry.name, kind, "evaluator built");
        }
        Ok(out)
    }

    /// Build alert sinks in the given order.
    pub fn build_alerts(
        &self,
        entries: &[AlertEntry],
        base_dir: &Path,
    ) -> RuntimeResult<Vec<Box<dyn AlertPlugin>>> {
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let kind = entry.config.kind();
            let ctx = BuildCtx {
                name: &entry.name,
                base_dir,
            };
            out.push(self.alert_factory(&entry.name, kind)?.build(&entry.config, &ctx)?);
            cm_debug!(conf, name = %entry.name, kind, "alert sink built");
        }
        Ok(out)
    }

    /// Resolve every plugin of `config` and validate it without side effects.
    pub fn check(&self, config: &CloudmarkConfig, base_dir: &Path) -> RuntimeResult<()> {
        let mut op = op_context!("check-plugins").with_auto_log();
        op.record("base_dir", base_dir.display().to_string().as_str());

        self.build_events(&config.events, base_dir)?;
        for entry in &config.alerts {
            let ctx = BuildCtx {
                name: &entry.name,
                base_dir,
            };
            self.alert_factory(&entry.name, entry.config.kind())?
                .validate(&entry.config, &ctx)?;
        }

        cm_info!(
            conf,
            events = config.events.len(),
            alerts = config.alerts.len(),
            "configuration check passed"
        );
        op.mark_suc();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[events.activity]
kind = "az_log_profile_missing_activity_type"

[events.coverage]
kind = "az_log_profile_missing"

[alerts.archive]
kind = "file"
path = "out/events.jsonl"

[alerts.mail]
kind = "email"
host = "smtp.example.com"
port = 465
security = "tls"
subject = "Cloud findings"
sender = "bot@example.com"
to = ["ops@example.com"]

[pipeline]
events = ["coverage", "activity"]
"#;

    #[test]
    fn builds_in_pipeline_order() {
        let config: CloudmarkConfig = CONFIG.parse().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let reg = PluginRegistry::builtin();

        let events = reg.build_events(&config.events, dir.path()).unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.kind().to_string()).collect();
        assert_eq!(kinds, ["az_log_profile_missing", "az_log_profile_missing_activity_type"]);

        let alerts = reg.build_alerts(&config.alerts, dir.path()).unwrap();
        let kinds: Vec<_> = alerts.iter().map(|a| a.kind().to_string()).collect();
        assert_eq!(kinds, ["file", "email"]);
        assert!(dir.path().join("out/events.jsonl").exists());
    }

    #[test]
    fn check_has_no_side_effects() {
        let config: CloudmarkConfig = CONFIG.parse().unwrap();
        let dir = tempfile::tempdir().unwrap();
        PluginRegistry::builtin().check(&config, dir.path()).unwrap();
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn unregistered_kind_fails() {
        let config: CloudmarkConfig = CONFIG.parse().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let reg = PluginRegistry::new();
        assert!(reg.build_events(&config.events, dir.path()).is_err());
        assert!(reg.build_alerts(&config.alerts, dir.path()).is_err());
        assert!(reg.check(&config, dir.path()).is_err());
    }

    #[test]
    fn check_rejects_bad_mailbox() {
        let config: CloudmarkConfig = CONFIG
            .replace(r#"to = ["ops@example.com"]"#, r#"to = ["ops at example"]"#)
            .parse()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(PluginRegistry::builtin().check(&config, dir.path()).is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let ctx = BuildCtx {
            name: "x",
            base_dir: Path::new("/etc/cloudmark"),
        };
        assert_eq!(
            ctx.resolve(Path::new("out/a.jsonl")),
            PathBuf::from("/etc/cloudmark/out/a.jsonl")
        );
        assert_eq!(ctx.resolve(Path::new("/var/a.jsonl")), PathBuf::from("/var/a.jsonl"));
    }
}
