use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use orion_error::prelude::*;
use tracing::Span;

use super::AlertPlugin;
use crate::error::{CoreReason, CoreResult};
use crate::record::Record;

pub const KIND: &str = "file";

/// Appends every written record as one JSON line.
///
/// Opening the file is the only fallible step. Later write and flush errors
/// are logged and dropped, so a full disk never stops the run.
pub struct FileAlert {
    writer: BufWriter<File>,
    path: PathBuf,
    written: usize,
    failed: usize,
    span: Span,
}

impl FileAlert {
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StructError::from(CoreReason::Config)
                    .with_detail(format!("create {}: {e}", parent.display()))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StructError::from(CoreReason::Config)
                    .with_detail(format!("open {}: {e}", path.display()))
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            written: 0,
            failed: 0,
            span: tracing::info_span!("alert", plugin = KIND),
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written successfully so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn append(&mut self, record: &Record) -> std::io::Result<()> {
        let json = serde_json::to_string(record)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl AlertPlugin for FileAlert {
    fn kind(&self) -> &str {
        KIND
    }

    fn write(&mut self, record: &Record) {
        let span = self.span.clone();
        let _guard = span.enter();
        match self.append(record) {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.failed += 1;
                cm_warn!(pipe, path = %self.path.display(), error = %e, "alert file write failed");
            }
        }
    }

    fn done(&mut self) {
        let _guard = self.span.enter();
        if let Err(e) = self.writer.flush() {
            cm_error!(pipe, path = %self.path.display(), error = %e, "alert file flush failed");
            return;
        }
        cm_info!(
            pipe,
            path = %self.path.display(),
            written = self.written,
            failed = self.failed,
            "alert file flushed"
        );
    }
}
