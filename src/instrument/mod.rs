pub mod mode_coverage;
pub mod scatter_plot;
pub mod image_grid;
pub mod metrics_log;

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;

pub use image_grid::ImageGrid;
pub use metrics_log::MetricsLog;
pub use mode_coverage::ModeCoverage;
pub use scatter_plot::ScatterPlot;

/// What a hook sees at a cadence point.
///
/// The generator is in eval mode for the lifetime of the snapshot.
/// `samples` is its output on `fixed_latent`, the same latent batch at every
/// cadence point of the run.
pub struct Snapshot<'a> {
    /// 0-based index of the epoch that just finished.
    pub epoch: usize,
    pub generator: &'a Network,
    pub samples: &'a Matrix,
    pub fixed_latent: &'a Matrix,
    pub real_pool: &'a Matrix,
    pub stats: &'a EpochStats,
}

/// A side-effect run every `plot_frequency` epochs.
///
/// Hooks never influence training. A failing hook is logged and the run
/// continues.
pub trait Instrumentation {
    fn name(&self) -> &str;

    fn observe(&mut self, snapshot: &Snapshot<'_>) -> Result<()>;
}
