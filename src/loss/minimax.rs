/// The original minimax GAN objective on discriminator logits.
///
/// The discriminator emits unbounded logits; `σ` is applied here, through
/// softplus so that confident scores do not overflow:
/// `log σ(x) = −softplus(−x)` and `log(1 − σ(x)) = −softplus(x)`.
pub struct MinimaxLoss;

/// Non-saturating generator objective. The discriminator side is
/// `MinimaxLoss::discriminator_loss`.
pub struct NonSaturatingLoss;

pub(crate) fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl MinimaxLoss {
    /// mean(log(1 − σ(fake)))
    pub fn generator_loss(fake: &[f64]) -> f64 {
        let n = fake.len() as f64;
        fake.iter().map(|&f| -softplus(f)).sum::<f64>() / n
    }

    /// ∂/∂fake_i = −σ(fake_i) / n
    pub fn generator_derivative(fake: &[f64]) -> Vec<f64> {
        let n = fake.len() as f64;
        fake.iter().map(|&f| -sigmoid(f) / n).collect()
    }

    /// −mean(log σ(real)) − mean(log(1 − σ(fake)))
    pub fn discriminator_loss(real: &[f64], fake: &[f64]) -> f64 {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        real.iter().map(|&r| softplus(-r)).sum::<f64>() / nr
            + fake.iter().map(|&f| softplus(f)).sum::<f64>() / nf
    }

    pub fn discriminator_derivative(real: &[f64], fake: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        (
            real.iter().map(|&r| -sigmoid(-r) / nr).collect(),
            fake.iter().map(|&f| sigmoid(f) / nf).collect(),
        )
    }
}

impl NonSaturatingLoss {
    /// −mean(log σ(fake))
    pub fn generator_loss(fake: &[f64]) -> f64 {
        let n = fake.len() as f64;
        fake.iter().map(|&f| softplus(-f)).sum::<f64>() / n
    }

    /// ∂/∂fake_i = −σ(−fake_i) / n
    pub fn generator_derivative(fake: &[f64]) -> Vec<f64> {
        let n = fake.len() as f64;
        fake.iter().map(|&f| -sigmoid(-f) / n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn softplus_is_stable_for_large_inputs() {
        assert_abs_diff_eq!(softplus(800.0), 800.0);
        assert_abs_diff_eq!(softplus(-800.0), 0.0);
        assert_abs_diff_eq!(softplus(0.0), 2f64.ln(), epsilon = 1e-15);
    }

    #[test]
    fn confident_discriminator_has_small_loss() {
        let loss = MinimaxLoss::discriminator_loss(&[10.0; 4], &[-10.0; 4]);
        assert!(loss < 1e-3);
    }

    #[test]
    fn zero_logits_give_log_two_terms() {
        let ln2 = 2f64.ln();
        assert_abs_diff_eq!(MinimaxLoss::discriminator_loss(&[0.0; 3], &[0.0; 3]), 2.0 * ln2, epsilon = 1e-12);
        assert_abs_diff_eq!(MinimaxLoss::generator_loss(&[0.0; 3]), -ln2, epsilon = 1e-12);
        assert_abs_diff_eq!(NonSaturatingLoss::generator_loss(&[0.0; 3]), ln2, epsilon = 1e-12);
    }

    #[test]
    fn saturating_generator_gradient_vanishes_when_rejected() {
        // Fakes the discriminator rejects hard: minimax barely moves, NS still pushes.
        let fake = [-12.0; 2];
        let mm = MinimaxLoss::generator_derivative(&fake)[0].abs();
        let ns = NonSaturatingLoss::generator_derivative(&fake)[0].abs();
        assert!(mm < 1e-5);
        assert!(ns > 0.49);
    }
}
