use std::path::PathBuf;

use image::{Rgb, RgbImage};
use tracing::debug;

use crate::error::{GanError, Result};
use crate::instrument::{Instrumentation, Snapshot};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const REAL: Rgb<u8> = Rgb([0, 0, 0]);
const GENERATED: Rgb<u8> = Rgb([255, 165, 0]);
const CENTER: Rgb<u8> = Rgb([160, 160, 160]);

/// Renders real and generated 2-D samples to `{epoch:04}.png`.
///
/// Every 10th real sample is drawn in black, every generated sample in
/// orange, over the square `[-extent, extent]²`.
pub struct ScatterPlot {
    dir: PathBuf,
    size: u32,
    extent: f64,
    centers: Vec<[f64; 2]>,
    capture_radius: f64,
}

impl ScatterPlot {
    pub fn new(dir: impl Into<PathBuf>) -> ScatterPlot {
        ScatterPlot { dir: dir.into(), size: 512, extent: 1.7, centers: Vec::new(), capture_radius: 0.5 }
    }

    /// Outlines a circle of `radius` around each center.
    pub fn with_centers(mut self, centers: Vec<[f64; 2]>, radius: f64) -> ScatterPlot {
        self.centers = centers;
        self.capture_radius = radius;
        self
    }

    pub fn with_size(mut self, size: u32) -> ScatterPlot {
        self.size = size.max(8);
        self
    }

    /// Path written for a 0-based epoch index.
    pub fn path_for(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{:04}.png", epoch + 1))
    }

    fn to_pixel(&self, x: f64, y: f64) -> Option<(u32, u32)> {
        let span = (self.size - 1) as f64;
        let px = ((x + self.extent) / (2.0 * self.extent) * span).round();
        let py = ((self.extent - y) / (2.0 * self.extent) * span).round();
        if !(0.0..=span).contains(&px) || !(0.0..=span).contains(&py) {
            return None;
        }
        Some((px as u32, py as u32))
    }

    fn dot(&self, img: &mut RgbImage, x: f64, y: f64, color: Rgb<u8>) {
        let Some((cx, cy)) = self.to_pixel(x, y) else { return };
        let max = self.size - 1;
        for py in cy.saturating_sub(1)..=(cy + 1).min(max) {
            for px in cx.saturating_sub(1)..=(cx + 1).min(max) {
                img.put_pixel(px, py, color);
            }
        }
    }

    pub fn render(&self, real: &[Vec<f64>], generated: &[Vec<f64>]) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.size, self.size, BACKGROUND);
        for c in &self.centers {
            let steps = 720;
            for s in 0..steps {
                let t = s as f64 / steps as f64 * std::f64::consts::TAU;
                let x = c[0] + self.capture_radius * t.cos();
                let y = c[1] + self.capture_radius * t.sin();
                if let Some((px, py)) = self.to_pixel(x, y) {
                    img.put_pixel(px, py, CENTER);
                }
            }
        }
        for p in real.iter().step_by(10) {
            self.dot(&mut img, p[0], p[1], REAL);
        }
        for p in generated {
            self.dot(&mut img, p[0], p[1], GENERATED);
        }
        img
    }
}

impl Instrumentation for ScatterPlot {
    fn name(&self) -> &str {
        "scatter-plot"
    }

    fn observe(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        for (label, m) in [("generated samples", snapshot.samples), ("real samples", snapshot.real_pool)] {
            if m.cols != 2 {
                return Err(GanError::shape(format!("scatter plot {}", label), "2 columns", format!("{} columns", m.cols)));
            }
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(snapshot.epoch);
        self.render(&snapshot.real_pool.data, &snapshot.samples.data).save(&path)?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}
