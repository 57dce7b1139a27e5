use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{GanError, Result};
use crate::math::matrix::Matrix;

/// A mixture of isotropic Gaussians whose means sit evenly on a circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ring {
    pub modes: usize,
    pub radius: f64,
    pub std: f64,
}

impl Default for Ring {
    fn default() -> Self {
        Ring { modes: 8, radius: 1.0, std: 0.05 }
    }
}

impl Ring {
    /// Mode means at angles (2k + 1)·π / modes, k = 0..modes.
    pub fn centers(&self) -> Vec<[f64; 2]> {
        (0..self.modes)
            .map(|k| {
                let angle = (2 * k + 1) as f64 * PI / self.modes as f64;
                [self.radius * angle.cos(), self.radius * angle.sin()]
            })
            .collect()
    }

    /// Rejects rings no sample could be drawn from.
    pub fn validate(&self) -> Result<()> {
        if self.modes == 0 {
            return Err(GanError::Configuration("ring needs at least one mode".to_owned()));
        }
        if !(self.std.is_finite() && self.std >= 0.0) {
            return Err(GanError::Configuration(format!(
                "ring std must be a non-negative number, got {}", self.std
            )));
        }
        if !self.radius.is_finite() {
            return Err(GanError::Configuration(format!("ring radius must be finite, got {}", self.radius)));
        }
        Ok(())
    }

    /// Draws `samples` points, spread round-robin across the modes.
    pub fn sample<R: Rng + ?Sized>(&self, samples: usize, rng: &mut R) -> Result<Matrix> {
        self.validate()?;
        let noise = Normal::new(0.0, self.std)
            .map_err(|e| GanError::Configuration(format!("ring std {}: {}", self.std, e)))?;
        let centers = self.centers();
        let data = (0..samples)
            .map(|i| {
                let c = centers[i % centers.len()];
                vec![c[0] + noise.sample(rng), c[1] + noise.sample(rng)]
            })
            .collect();
        Ok(Matrix::from_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn eight_centers_sit_at_odd_multiples_of_pi_over_eight() {
        let centers = Ring::default().centers();
        assert_eq!(centers.len(), 8);
        assert_abs_diff_eq!(centers[0][0], (PI / 8.0).cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(centers[3][1], (7.0 * PI / 8.0).sin(), epsilon = 1e-12);
        for c in &centers {
            assert_abs_diff_eq!((c[0] * c[0] + c[1] * c[1]).sqrt(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn samples_stay_near_their_mode() {
        let ring = Ring::default();
        let data = ring.sample(800, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(data.shape(), (800, 2));
        let centers = ring.centers();
        for (i, row) in data.data.iter().enumerate() {
            let c = centers[i % 8];
            let d = ((row[0] - c[0]).powi(2) + (row[1] - c[1]).powi(2)).sqrt();
            assert!(d < 0.5, "sample {} is {} away from its mode", i, d);
        }
    }

    #[test]
    fn negative_spread_is_a_configuration_error() {
        let ring = Ring { std: -1.0, ..Ring::default() };
        assert!(matches!(
            ring.sample(4, &mut StdRng::seed_from_u64(0)),
            Err(GanError::Configuration(_))
        ));
        let nan = Ring { std: f64::NAN, ..Ring::default() };
        assert!(nan.validate().is_err());
        assert!(Ring { std: 0.0, ..Ring::default() }.validate().is_ok());
    }
}
