use std::io::Write;

use tracing::info;

use crate::error::{GanError, Result};
use crate::instrument::{Instrumentation, Snapshot};
use crate::math::matrix::Matrix;

pub const DEFAULT_CAPTURE_RADIUS: f64 = 0.5;

/// Counts generated points near each mode center of a 2-D mixture.
///
/// Every observation logs the counts and appends them to `out` as one
/// space-separated line, so a collapsed generator shows up as zeros.
pub struct ModeCoverage<W: Write> {
    centers: Vec<[f64; 2]>,
    capture_radius: f64,
    out: W,
    last: Vec<usize>,
}

impl<W: Write> ModeCoverage<W> {
    pub fn new(centers: Vec<[f64; 2]>, out: W) -> ModeCoverage<W> {
        ModeCoverage { centers, capture_radius: DEFAULT_CAPTURE_RADIUS, out, last: Vec::new() }
    }

    pub fn with_capture_radius(mut self, radius: f64) -> ModeCoverage<W> {
        self.capture_radius = radius;
        self
    }

    /// Points strictly inside `capture_radius` of each center. A point near
    /// two centers counts for both.
    pub fn counts(&self, samples: &Matrix) -> Result<Vec<usize>> {
        if samples.cols != 2 {
            return Err(GanError::shape("mode coverage samples", "2 columns", format!("{} columns", samples.cols)));
        }
        let r2 = self.capture_radius * self.capture_radius;
        Ok(self.centers.iter()
            .map(|c| {
                samples.data.iter()
                    .filter(|p| (p[0] - c[0]).powi(2) + (p[1] - c[1]).powi(2) < r2)
                    .count()
            })
            .collect())
    }

    /// Counts from the most recent observation.
    pub fn last_counts(&self) -> &[usize] {
        &self.last
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Instrumentation for ModeCoverage<W> {
    fn name(&self) -> &str {
        "mode-coverage"
    }

    fn observe(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        let counts = self.counts(snapshot.samples)?;
        info!("epoch {} mode coverage: {:?}", snapshot.epoch + 1, counts);
        let line: Vec<String> = counts.iter().map(usize::to_string).collect();
        writeln!(self.out, "{}", line.join(" "))?;
        self.out.flush()?;
        self.last = counts;
        Ok(())
    }
}
