use crate::error::{GanError, Result};
use crate::loss::family::LossFamily;
use crate::loss::gradient_penalty::{gradient_penalty, PenaltyContext};
use crate::loss::hinge::HingeLoss;
use crate::loss::least_squares::LeastSquaresLoss;
use crate::loss::minimax::{MinimaxLoss, NonSaturatingLoss};
use crate::loss::wasserstein::WassersteinLoss;

/// Default λ for the gradient-penalty family.
pub const DEFAULT_GRADIENT_PENALTY_WEIGHT: f64 = 10.0;

/// Scalar loss plus its gradient with respect to each per-sample score.
#[derive(Debug, Clone, PartialEq)]
pub struct LossOutput {
    pub value: f64,
    pub grad: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorOutput {
    /// Total loss, penalty term included.
    pub value: f64,
    pub real_grad: Vec<f64>,
    pub fake_grad: Vec<f64>,
    /// Unweighted gradient penalty, when the family computes one.
    pub penalty: Option<f64>,
}

/// A generator/discriminator objective pair chosen as one unit.
///
/// Both methods take per-sample scores and reduce by the batch mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GanLoss {
    family: LossFamily,
    gradient_penalty_weight: f64,
}

impl GanLoss {
    pub fn new(family: LossFamily) -> GanLoss {
        GanLoss { family, gradient_penalty_weight: DEFAULT_GRADIENT_PENALTY_WEIGHT }
    }

    pub fn with_gradient_penalty_weight(mut self, weight: f64) -> GanLoss {
        self.gradient_penalty_weight = weight;
        self
    }

    pub fn family(&self) -> LossFamily {
        self.family
    }

    pub fn gradient_penalty_weight(&self) -> f64 {
        self.gradient_penalty_weight
    }

    pub fn generator(&self, fake: &[f64]) -> LossOutput {
        let (value, grad) = match self.family {
            LossFamily::Standard => (
                MinimaxLoss::generator_loss(fake),
                MinimaxLoss::generator_derivative(fake),
            ),
            LossFamily::NonSaturating => (
                NonSaturatingLoss::generator_loss(fake),
                NonSaturatingLoss::generator_derivative(fake),
            ),
            LossFamily::Hinge => (
                HingeLoss::generator_loss(fake),
                HingeLoss::generator_derivative(fake),
            ),
            LossFamily::Wasserstein | LossFamily::WassersteinGp => (
                WassersteinLoss::generator_loss(fake),
                WassersteinLoss::generator_derivative(fake),
            ),
            LossFamily::LeastSquares => (
                LeastSquaresLoss::generator_loss(fake),
                LeastSquaresLoss::generator_derivative(fake),
            ),
        };
        LossOutput { value, grad }
    }

    /// Discriminator objective. `penalty` is ignored by every family except
    /// `wasserstein-gp`, which requires it and accumulates the penalty's
    /// parameter gradient into the discriminator it carries.
    pub fn discriminator(
        &self,
        real: &[f64],
        fake: &[f64],
        penalty: Option<PenaltyContext<'_>>,
    ) -> Result<DiscriminatorOutput> {
        let (value, (real_grad, fake_grad)) = match self.family {
            LossFamily::Standard | LossFamily::NonSaturating => (
                MinimaxLoss::discriminator_loss(real, fake),
                MinimaxLoss::discriminator_derivative(real, fake),
            ),
            LossFamily::Hinge => (
                HingeLoss::discriminator_loss(real, fake),
                HingeLoss::discriminator_derivative(real, fake),
            ),
            LossFamily::Wasserstein | LossFamily::WassersteinGp => (
                WassersteinLoss::discriminator_loss(real, fake),
                WassersteinLoss::discriminator_derivative(real, fake),
            ),
            LossFamily::LeastSquares => (
                LeastSquaresLoss::discriminator_loss(real, fake),
                LeastSquaresLoss::discriminator_derivative(real, fake),
            ),
        };

        if !self.family.uses_gradient_penalty() {
            return Ok(DiscriminatorOutput { value, real_grad, fake_grad, penalty: None });
        }

        let ctx = penalty.ok_or_else(|| GanError::Configuration(format!(
            "{} discriminator loss needs a penalty context", self.family
        )))?;
        let gp = gradient_penalty(ctx, self.gradient_penalty_weight)?;
        Ok(DiscriminatorOutput {
            value: value + self.gradient_penalty_weight * gp,
            real_grad,
            fake_grad,
            penalty: Some(gp),
        })
    }
}
