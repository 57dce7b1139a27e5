use crate::error::{GanError, Result};
use crate::loss::family::LossFamily;
use crate::network::network::Network;

/// Lipschitz control applied to the discriminator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterConstraint {
    None,
    /// Clamp every discriminator parameter into `[-bound, bound]` after each step.
    WeightClip { bound: f64 },
    /// Soft constraint; lives in the discriminator loss, nothing to do after a step.
    GradientPenalty { weight: f64 },
}

impl ParameterConstraint {
    /// Picks the policy for a family. A clip bound is only accepted for the
    /// plain Wasserstein family.
    pub fn from_config(family: LossFamily, clip_weights: f64, penalty_weight: f64) -> Result<ParameterConstraint> {
        if !clip_weights.is_finite() || clip_weights < 0.0 {
            return Err(GanError::Configuration(format!(
                "clip_weights must be a non-negative number, got {}", clip_weights
            )));
        }
        if clip_weights > 0.0 && !family.accepts_weight_clipping() {
            return Err(GanError::Configuration(format!(
                "clip_weights = {} only applies to the wasserstein family, not {}",
                clip_weights, family
            )));
        }
        if family.uses_gradient_penalty() {
            return Ok(ParameterConstraint::GradientPenalty { weight: penalty_weight });
        }
        if clip_weights > 0.0 {
            return Ok(ParameterConstraint::WeightClip { bound: clip_weights });
        }
        Ok(ParameterConstraint::None)
    }

    /// Post-step projection. No gradient flows through it.
    pub fn apply(&self, discriminator: &mut Network) {
        if let ParameterConstraint::WeightClip { bound } = *self {
            discriminator.clamp_parameters(bound);
        }
    }
}
