use std::path::PathBuf;

use image::{GrayImage, Luma};
use tracing::debug;

use crate::error::{GanError, Result};
use crate::instrument::{Instrumentation, Snapshot};
use crate::math::matrix::Matrix;

/// Tiles generated images into one grayscale PNG per cadence point,
/// `generated_epoch_{n}.png` with `n` the 1-based epoch.
///
/// Samples are flattened `width × height` images in the tanh range `[-1, 1]`.
pub struct ImageGrid {
    dir: PathBuf,
    width: usize,
    height: usize,
    columns: usize,
}

impl ImageGrid {
    pub fn new(dir: impl Into<PathBuf>, width: usize, height: usize) -> ImageGrid {
        ImageGrid { dir: dir.into(), width, height, columns: 4 }
    }

    pub fn with_columns(mut self, columns: usize) -> ImageGrid {
        self.columns = columns.max(1);
        self
    }

    pub fn path_for(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("generated_epoch_{}.png", epoch + 1))
    }

    pub fn render(&self, samples: &Matrix) -> Result<GrayImage> {
        let pixels = self.width * self.height;
        if samples.cols != pixels {
            return Err(GanError::shape(
                "image grid samples",
                format!("{} columns ({}x{})", pixels, self.width, self.height),
                format!("{} columns", samples.cols),
            ));
        }
        let columns = self.columns.min(samples.rows.max(1));
        let rows = (samples.rows + columns - 1) / columns;
        let mut img = GrayImage::new((columns * self.width) as u32, (rows.max(1) * self.height) as u32);

        for (n, sample) in samples.data.iter().enumerate() {
            let (ox, oy) = ((n % columns) * self.width, (n / columns) * self.height);
            for (i, &v) in sample.iter().enumerate() {
                let level = ((v + 1.0) * 127.5).clamp(0.0, 255.0) as u8;
                let (x, y) = (ox + i % self.width, oy + i / self.width);
                img.put_pixel(x as u32, y as u32, Luma([level]));
            }
        }
        Ok(img)
    }
}

impl Instrumentation for ImageGrid {
    fn name(&self) -> &str {
        "image-grid"
    }

    fn observe(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        let img = self.render(snapshot.samples)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(snapshot.epoch);
        img.save(&path)?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}
