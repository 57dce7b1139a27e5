use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::math::matrix::Matrix;

/// Produces the latent input for the generator, one row per sample.
///
/// Called afresh for every discriminator and generator update.
pub trait NoiseSource {
    fn sample(&self, rows: usize, cols: usize, rng: &mut dyn RngCore) -> Matrix;
}

/// Independent standard-normal draws.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianNoise;

impl NoiseSource for GaussianNoise {
    fn sample(&self, rows: usize, cols: usize, rng: &mut dyn RngCore) -> Matrix {
        Matrix::random_normal(rows, cols, 1.0, rng)
    }
}

/// Every latent entry set to one value; the generator then sees the same
/// input for every sample.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn sample(&self, rows: usize, cols: usize, _rng: &mut dyn RngCore) -> Matrix {
        Matrix::filled(rows, cols, self.0)
    }
}

/// Configured noise mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NoiseMode {
    Gaussian,
    Constant { value: f64 },
}

impl Default for NoiseMode {
    fn default() -> Self {
        NoiseMode::Gaussian
    }
}

impl NoiseMode {
    pub fn build(self) -> Box<dyn NoiseSource> {
        match self {
            NoiseMode::Gaussian => Box::new(GaussianNoise),
            NoiseMode::Constant { value } => Box::new(ConstantNoise(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn gaussian_draws_differ_between_calls() {
        let mut rng = StdRng::seed_from_u64(0);
        let noise = NoiseMode::Gaussian.build();
        let a = noise.sample(8, 4, &mut rng);
        let b = noise.sample(8, 4, &mut rng);
        assert_eq!(a.shape(), (8, 4));
        assert_ne!(a, b);
    }

    #[test]
    fn constant_mode_fills_every_entry() {
        let mut rng = StdRng::seed_from_u64(0);
        let m = NoiseMode::Constant { value: 0.5 }.build().sample(3, 2, &mut rng);
        assert_eq!(m, Matrix::filled(3, 2, 0.5));
    }
}
