use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{GanError, Result};
use crate::math::matrix::Matrix;

/// The real-sample pool a run trains against.
///
/// Reshuffled once per epoch, then cut into consecutive windows of
/// `batch_size` rows. A trailing window shorter than `batch_size` is dropped,
/// so every batch the trainer sees is full.
#[derive(Debug, Clone)]
pub struct DataPool {
    samples: Matrix,
}

impl DataPool {
    pub fn new(samples: Matrix) -> Result<DataPool> {
        if samples.rows == 0 || samples.cols == 0 {
            return Err(GanError::Data("real-data pool is empty".to_owned()));
        }
        if !samples.is_finite() {
            tracing::warn!("real-data pool contains non-finite values");
        }
        Ok(DataPool { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.rows
    }

    pub fn is_empty(&self) -> bool {
        self.samples.rows == 0
    }

    /// Dimension of one sample.
    pub fn dim(&self) -> usize {
        self.samples.cols
    }

    pub fn samples(&self) -> &Matrix {
        &self.samples
    }

    /// Full batches available per epoch.
    pub fn window_count(&self, batch_size: usize) -> usize {
        if batch_size == 0 { 0 } else { self.len() / batch_size }
    }

    /// Rows left out of every epoch by the drop-last policy.
    pub fn dropped_per_epoch(&self, batch_size: usize) -> usize {
        if batch_size == 0 { self.len() } else { self.len() % batch_size }
    }

    /// Permutes the pool in place.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut perm: Vec<usize> = (0..self.len()).collect();
        perm.shuffle(rng);
        self.samples.permute_rows(&perm);
    }

    /// The `index`-th full window of `batch_size` rows.
    pub fn window(&self, index: usize, batch_size: usize) -> Matrix {
        let start = index * batch_size;
        let rows: Vec<usize> = (start..start + batch_size).collect();
        self.samples.select_rows(&rows)
    }

    pub fn windows(&self, batch_size: usize) -> impl Iterator<Item = Matrix> + '_ {
        (0..self.window_count(batch_size)).map(move |i| self.window(i, batch_size))
    }
}
