pub mod constraint;
pub mod epoch_stats;
pub mod noise;
pub mod top_k;
pub mod train_config;
pub mod trainer;

pub use constraint::ParameterConstraint;
pub use epoch_stats::EpochStats;
pub use noise::{ConstantNoise, GaussianNoise, NoiseMode, NoiseSource};
pub use top_k::SampleFilter;
pub use train_config::{ComputeTarget, TrainConfig};
pub use trainer::Trainer;
