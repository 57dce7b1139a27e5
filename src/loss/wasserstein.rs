/// Wasserstein critic objective. Only meaningful for a (near) 1-Lipschitz
/// critic: pair it with weight clipping, or use the gradient-penalty family.
pub struct WassersteinLoss;

impl WassersteinLoss {
    /// −mean(fake)
    pub fn generator_loss(fake: &[f64]) -> f64 {
        let n = fake.len() as f64;
        -fake.iter().sum::<f64>() / n
    }

    pub fn generator_derivative(fake: &[f64]) -> Vec<f64> {
        let n = fake.len() as f64;
        vec![-1.0 / n; fake.len()]
    }

    /// mean(fake) − mean(real)
    pub fn discriminator_loss(real: &[f64], fake: &[f64]) -> f64 {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        fake.iter().sum::<f64>() / nf - real.iter().sum::<f64>() / nr
    }

    pub fn discriminator_derivative(real: &[f64], fake: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let nr = real.len() as f64;
        let nf = fake.len() as f64;
        (vec![-1.0 / nr; real.len()], vec![1.0 / nf; fake.len()])
    }
}
