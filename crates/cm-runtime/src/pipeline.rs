use std::io::BufRead;
use std::path::Path;

use cm_config::CloudmarkConfig;
use cm_core::alert::AlertPlugin;
use cm_core::event::EventPlugin;
use cm_core::{Record, cm_info, cm_trace};
use orion_error::op_context;
use orion_error::prelude::*;

use crate::error::RuntimeResult;
use crate::reader::RecordReader;
use crate::registry::PluginRegistry;

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records handed to the evaluators.
    pub records: u64,
    /// Events forwarded to the alert sinks.
    pub events: u64,
    /// Input lines dropped as malformed.
    pub skipped: u64,
}

/// Drives records through evaluators and forwards every event to every
/// alert sink.
///
/// Evaluators see each record in the order they were configured. Events
/// reach the sinks in emission order, sink by sink in configured order.
/// [`finish`](Self::finish) consumes the pipeline, so finalization runs
/// exactly once.
pub struct Pipeline {
    events: Vec<Box<dyn EventPlugin>>,
    alerts: Vec<Box<dyn AlertPlugin>>,
    summary: RunSummary,
}

impl Pipeline {
    pub fn new(events: Vec<Box<dyn EventPlugin>>, alerts: Vec<Box<dyn AlertPlugin>>) -> Self {
        Self {
            events,
            alerts,
            summary: RunSummary::default(),
        }
    }

    /// Build every configured plugin with the built-in registry.
    pub fn from_config(config: &CloudmarkConfig, base_dir: &Path) -> RuntimeResult<Self> {
        Self::with_registry(config, base_dir, &PluginRegistry::builtin())
    }

    pub fn with_registry(
        config: &CloudmarkConfig,
        base_dir: &Path,
        registry: &PluginRegistry,
    ) -> RuntimeResult<Self> {
        let mut op = op_context!("pipeline-bootstrap").with_auto_log();
        op.record("base_dir", base_dir.display().to_string().as_str());

        let events = registry.build_events(&config.events, base_dir)?;
        let alerts = registry.build_alerts(&config.alerts, base_dir)?;
        cm_info!(
            sys,
            events = events.len(),
            alerts = alerts.len(),
            "pipeline ready"
        );

        op.mark_suc();
        Ok(Self::new(events, alerts))
    }

    /// Evaluate one record and forward whatever it produced.
    pub fn process(&mut self, record: &Record) {
        self.summary.records += 1;
        for ev in self.events.iter_mut() {
            let produced = ev.eval(record);
            if !produced.is_empty() {
                cm_trace!(pipe, plugin = ev.kind(), count = produced.len(), "events emitted");
            }
            self.summary.events += forward(&mut self.alerts, &produced);
        }
    }

    /// Finalize evaluators (forwarding their last events), then the sinks.
    pub fn finish(mut self) -> RunSummary {
        for ev in self.events.iter_mut() {
            let produced = ev.done();
            self.summary.events += forward(&mut self.alerts, &produced);
        }
        for alert in self.alerts.iter_mut() {
            alert.done();
        }
        cm_info!(
            pipe,
            records = self.summary.records,
            events = self.summary.events,
            "pipeline finished"
        );
        self.summary
    }

    /// Feed JSON Lines input through the pipeline and finish it.
    ///
    /// A read error stops intake, but sinks are still finished so whatever
    /// was collected gets delivered; the error is returned afterwards.
    pub fn run<R: BufRead>(mut self, input: R) -> RuntimeResult<RunSummary> {
        let mut reader = RecordReader::new(input);
        let mut failure = None;
        for item in reader.by_ref() {
            match item {
                Ok(record) => self.process(&record),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        let skipped = reader.skipped() as u64;

        let mut summary = self.finish();
        summary.skipped = skipped;
        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

fn forward(alerts: &mut [Box<dyn AlertPlugin>], events: &[Record]) -> u64 {
    for event in events {
        for alert in alerts.iter_mut() {
            alert.write(event);
        }
    }
    events.len() as u64
}
