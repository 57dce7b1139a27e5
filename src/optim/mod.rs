pub mod optimizer;
pub mod sgd;
pub mod rms_prop;
pub mod adam;

use serde::{Deserialize, Serialize};

pub use adam::Adam;
pub use optimizer::Optimizer;
pub use rms_prop::RmsProp;
pub use sgd::Sgd;

/// Selects the update rule used for both networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizerKind {
    Sgd,
    RmsProp,
    Adam,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64, adam_betas: (f64, f64)) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate)),
            OptimizerKind::RmsProp => Box::new(RmsProp::new(learning_rate)),
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate, adam_betas)),
        }
    }
}
