/// Least-squares GAN objective with targets 1 (real) and 0 (fake).
pub struct LeastSquaresLoss;

impl LeastSquaresLoss {
    /// mean((fake − 1)²) / 2
    pub fn generator_loss(fake: &[f64]) -> f64 {
        let n = fake.len() as f64;
        fake.iter().map(|f| (f - 1.0).powi(2)).sum::<f64>() / n / 2.0
    }

    pub fn generator_derivative(fake: &[f64]) -> Vec<f64> {
        let n = fake.len() as f64;
        fake.iter().map(|f| (f - 1.0) / n).collect()
    }

    /// [mean((real − 1)²) + mean(fake²)] / 2
    pub fn discriminator_loss(real: &[f64], fake: &[f64]) -> f64 {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        (real.iter().map(|r| (r - 1.0).powi(2)).sum::<f64>() / nr
            + fake.iter().map(|f| f * f).sum::<f64>() / nf) / 2.0
    }

    pub fn discriminator_derivative(real: &[f64], fake: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        (
            real.iter().map(|r| (r - 1.0) / nr).collect(),
            fake.iter().map(|f| f / nf).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_scores_cost_nothing() {
        assert_eq!(LeastSquaresLoss::discriminator_loss(&[1.0; 3], &[0.0; 3]), 0.0);
        assert_eq!(LeastSquaresLoss::generator_loss(&[1.0; 3]), 0.0);
    }

    #[test]
    fn loss_is_halved_squared_error() {
        assert_eq!(LeastSquaresLoss::generator_loss(&[3.0]), 2.0);
        assert_eq!(LeastSquaresLoss::discriminator_loss(&[3.0], &[2.0]), 4.0);
    }
}
