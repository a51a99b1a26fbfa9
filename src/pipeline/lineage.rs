//! Lineage log — the audit trail of declared edges.
//!
//! One record is appended per declared edge at graph-build time and the
//! accumulated log is persisted exactly once, as a CSV table, when a run
//! finishes. Records carry the endpoint identity hashes so a result file
//! tagged with a hash can be traced back to the exact type + parameters
//! that produced it.

use crate::error::Result;
use crate::pipeline::identity::IdentityHash;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One declared edge: who feeds whom, and with what configuration.
#[derive(Debug, Clone, Serialize)]
pub struct LineageRecord {
    /// When the edge was declared.
    pub timestamp: DateTime<Utc>,
    /// Name of the downstream pipe.
    pub downstream_name: String,
    /// Type locator of the downstream pipe.
    pub downstream_locator: String,
    /// Canonical JSON snapshot of the downstream constructor parameters.
    pub downstream_params: String,
    /// Identity hash of the upstream endpoint.
    pub upstream_hash: IdentityHash,
    /// Identity hash of the downstream endpoint.
    pub downstream_hash: IdentityHash,
}

/// Append-only collection of lineage records for one run.
#[derive(Debug, Default)]
pub struct LineageLog {
    records: Vec<LineageRecord>,
}

impl LineageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: LineageRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[LineageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the log as a CSV table. Called once at the end of a run.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "timestamp,downstream_name,downstream_type,downstream_params,upstream_hash,downstream_hash"
        )?;
        for record in &self.records {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                record.timestamp.to_rfc3339(),
                csv_field(&record.downstream_name),
                csv_field(&record.downstream_locator),
                csv_field(&record.downstream_params),
                record.upstream_hash,
                record.downstream_hash,
            )?;
        }
        writer.flush()?;
        tracing::info!(path = %path.display(), edges = self.records.len(), "persisted lineage log");
        Ok(())
    }
}

/// Quote a CSV field if it contains a delimiter, quote, or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
