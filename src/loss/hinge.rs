/// Margin loss on raw discriminator scores.
pub struct HingeLoss;

impl HingeLoss {
    /// −mean(fake)
    pub fn generator_loss(fake: &[f64]) -> f64 {
        let n = fake.len() as f64;
        -fake.iter().sum::<f64>() / n
    }

    pub fn generator_derivative(fake: &[f64]) -> Vec<f64> {
        let n = fake.len() as f64;
        vec![-1.0 / n; fake.len()]
    }

    /// mean(relu(1 − real)) + mean(relu(1 + fake))
    pub fn discriminator_loss(real: &[f64], fake: &[f64]) -> f64 {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        real.iter().map(|&r| (1.0 - r).max(0.0)).sum::<f64>() / nr
            + fake.iter().map(|&f| (1.0 + f).max(0.0)).sum::<f64>() / nf
    }

    /// Subgradient: zero once a score is past its margin.
    pub fn discriminator_derivative(real: &[f64], fake: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        (
            real.iter().map(|&r| if 1.0 - r > 0.0 { -1.0 / nr } else { 0.0 }).collect(),
            fake.iter().map(|&f| if 1.0 + f > 0.0 { 1.0 / nf } else { 0.0 }).collect(),
        )
    }
}
