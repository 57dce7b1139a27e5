pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod train;
pub mod instrument;

// Convenience re-exports
pub use error::{GanError, Phase, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{Network, NetworkSpec};
pub use loss::{GanLoss, LossFamily};
pub use optim::{Optimizer, OptimizerKind};
pub use data::{DataPool, DataSource};
pub use train::{EpochStats, Trainer, TrainConfig};
pub use instrument::{Instrumentation, Snapshot};
