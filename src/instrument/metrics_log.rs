use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::instrument::{Instrumentation, Snapshot};

/// Appends the epoch statistics as one JSON object per line.
pub struct MetricsLog<W: Write> {
    out: W,
}

impl MetricsLog<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<MetricsLog<BufWriter<File>>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(MetricsLog::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> MetricsLog<W> {
    pub fn new(out: W) -> MetricsLog<W> {
        MetricsLog { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Instrumentation for MetricsLog<W> {
    fn name(&self) -> &str {
        "metrics-log"
    }

    fn observe(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, snapshot.stats)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
