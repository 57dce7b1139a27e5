use serde::{Serialize, Deserialize};

/// Per-epoch training statistics returned by `Trainer::fit` and handed to
/// instrumentation hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean generator loss over the epoch's generator steps.
    pub generator_loss: f64,
    /// Mean discriminator loss (penalty included) over the epoch's discriminator steps.
    pub discriminator_loss: f64,
    /// Mean unweighted gradient penalty; only set for the gradient-penalty family.
    pub gradient_penalty: Option<f64>,
    pub discriminator_steps: usize,
    pub generator_steps: usize,
    /// Whether top-k filtering shaped this epoch's generator updates.
    pub top_k_active: bool,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
