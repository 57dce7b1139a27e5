use rand::{Rng, RngCore};

use crate::error::{GanError, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// Everything a discriminator loss may need beyond the two score vectors.
///
/// Every family receives it; only the gradient-penalty family reads it.
pub struct PenaltyContext<'a> {
    pub real: &'a Matrix,
    pub fake: &'a Matrix,
    pub discriminator: &'a mut Network,
    pub rng: &'a mut dyn RngCore,
}

/// Draws one interpolation coefficient `ε ~ U[0, 1)` per sample and returns
/// `ε·real + (1 − ε)·fake`.
pub fn interpolate(real: &Matrix, fake: &Matrix, rng: &mut dyn RngCore) -> Result<Matrix> {
    if real.shape() != fake.shape() {
        return Err(GanError::shape(
            "gradient penalty interpolation",
            format!("{:?}", real.shape()),
            format!("{:?}", fake.shape()),
        ));
    }
    let coeff: Vec<f64> = (0..real.rows).map(|_| rng.gen::<f64>()).collect();
    let complement: Vec<f64> = coeff.iter().map(|c| 1.0 - c).collect();
    Ok(real.scale_rows(&coeff) + fake.scale_rows(&complement))
}

/// `mean((‖∇ₓD(x̂)‖₂ − 1)²)` on interpolates between real and fake samples.
///
/// The parameter gradient of `weight · penalty` is accumulated into the
/// discriminator; the unweighted penalty is returned.
pub fn gradient_penalty(ctx: PenaltyContext<'_>, weight: f64) -> Result<f64> {
    let interpolated = interpolate(ctx.real, ctx.fake, ctx.rng)?;
    ctx.discriminator.penalize_input_gradient(&interpolated, weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::{activation::activation::ActivationFunction, layers::dense::Layer};

    fn linear_critic(w: [f64; 2]) -> Network {
        let layer = Layer::from_parts(
            Matrix::from_data(vec![vec![w[0]], vec![w[1]]]),
            Matrix::zeros(1, 1),
            ActivationFunction::Identity,
        );
        Network::from_layers("critic", vec![layer])
    }

    #[test]
    fn interpolates_lie_between_their_endpoints() {
        let mut rng = StdRng::seed_from_u64(9);
        let real = Matrix::filled(50, 2, 1.0);
        let fake = Matrix::filled(50, 2, -1.0);
        let x = interpolate(&real, &fake, &mut rng).unwrap();
        for row in &x.data {
            assert!(row[0] >= -1.0 && row[0] <= 1.0);
            assert_eq!(row[0], row[1]);
        }
    }

    #[test]
    fn penalty_vanishes_as_gradient_norm_approaches_one() {
        let mut rng = StdRng::seed_from_u64(4);
        let real = Matrix::random_normal(16, 2, 1.0, &mut rng);
        let fake = Matrix::random_normal(16, 2, 1.0, &mut rng);

        let mut previous = f64::INFINITY;
        for gain in [1.5, 1.1, 1.01, 1.0] {
            let mut critic = linear_critic([0.6 * gain, 0.8 * gain]);
            let penalty = gradient_penalty(
                PenaltyContext { real: &real, fake: &fake, discriminator: &mut critic, rng: &mut rng },
                10.0,
            ).unwrap();
            // A linear critic has the same input gradient everywhere.
            assert_abs_diff_eq!(penalty, (gain - 1.0_f64).powi(2), epsilon = 1e-12);
            assert!(penalty <= previous);
            previous = penalty;
        }
        assert_abs_diff_eq!(previous, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_batches_are_rejected() {
        let mut critic = linear_critic([1.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(0);
        let err = gradient_penalty(
            PenaltyContext {
                real: &Matrix::zeros(4, 2),
                fake: &Matrix::zeros(3, 2),
                discriminator: &mut critic,
                rng: &mut rng,
            },
            10.0,
        ).unwrap_err();
        assert!(matches!(err, GanError::ShapeMismatch { .. }));
    }
}
