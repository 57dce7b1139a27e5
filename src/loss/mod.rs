pub mod family;
pub mod minimax;
pub mod hinge;
pub mod wasserstein;
pub mod least_squares;
pub mod gradient_penalty;
pub mod gan_loss;

pub use family::LossFamily;
pub use gan_loss::{DiscriminatorOutput, GanLoss, LossOutput};
pub use gradient_penalty::PenaltyContext;
