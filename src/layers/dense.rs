use rand::Rng;

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Power-iteration state for spectral normalisation.
#[derive(Debug, Clone)]
struct SpectralNorm {
    u: Vec<f64>,
    sigma: f64,
}

/// Fully-connected layer computing `f(x · W / σ + b)` for a batch `x`.
///
/// `σ` is the spectral-norm estimate when spectral normalisation is enabled,
/// and 1 otherwise. Gradients accumulate into `weights_grad` / `biases_grad`
/// until `zero_grad` is called.
#[derive(Debug, Clone)]
pub struct Layer{
    pub size: usize,
    pub input_size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    pub weights_grad: Matrix,
    pub biases_grad: Matrix,
    spectral: Option<SpectralNorm>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(size: usize, input_size: usize, activation: ActivationFunction, rng: &mut R) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU
            | ActivationFunction::LeakyReLU { .. }
            | ActivationFunction::Elu { .. } => Matrix::he(input_size, size, rng),
            _ => Matrix::xavier(input_size, size, rng),
        };
        Layer::from_parts(weights, Matrix::zeros(1, size), activation)
    }

    /// Builds a layer around explicit parameters. `weights` is `input_size × size`.
    pub fn from_parts(weights: Matrix, biases: Matrix, activation: ActivationFunction) -> Layer {
        assert_eq!(biases.rows, 1, "biases must be a single row");
        assert_eq!(biases.cols, weights.cols, "one bias per output neuron");
        Layer {
            size: weights.cols,
            input_size: weights.rows,
            weights_grad: Matrix::zeros(weights.rows, weights.cols),
            biases_grad: Matrix::zeros(1, weights.cols),
            weights,
            biases,
            activator: activation,
            spectral: None,
        }
    }

    pub fn enable_spectral_norm<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut u: Vec<f64> = (0..self.input_size).map(|_| rng.gen::<f64>() - 0.5).collect();
        normalize(&mut u);
        self.spectral = Some(SpectralNorm { u, sigma: 1.0 });
        self.power_iteration();
    }

    pub fn has_spectral_norm(&self) -> bool {
        self.spectral.is_some()
    }

    /// One power-iteration refresh of the largest singular value of `W`.
    pub fn power_iteration(&mut self) {
        let Some(sn) = self.spectral.as_mut() else { return };
        let w = &self.weights;

        // v = Wᵀu / |Wᵀu|
        let mut v = vec![0.0; w.cols];
        for (i, row) in w.data.iter().enumerate() {
            for (vj, wij) in v.iter_mut().zip(row.iter()) {
                *vj += wij * sn.u[i];
            }
        }
        normalize(&mut v);

        // u = Wv / |Wv|, σ = uᵀWv
        let mut wv: Vec<f64> = w.data.iter()
            .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
            .collect();
        let sigma = normalize(&mut wv);
        sn.u = wv;
        if sigma > f64::EPSILON {
            sn.sigma = sigma;
        }
    }

    /// Multiplier applied to `x · W`; `1/σ` under spectral normalisation.
    pub fn gain(&self) -> f64 {
        self.spectral.as_ref().map_or(1.0, |sn| 1.0 / sn.sigma)
    }

    /// Forward pass over a batch. Returns `(pre_activation, activation)`.
    pub fn feed_from(&self, input: &Matrix) -> (Matrix, Matrix) {
        let mut xw = input.matmul(&self.weights);
        let gain = self.gain();
        if gain != 1.0 {
            xw = xw.scale(gain);
        }
        let z = xw.add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        (z, a)
    }

    /// δ = ∂L/∂a ⊙ f'(z): the error in pre-activation space.
    pub fn delta(&self, output_grad: &Matrix, pre_neurons: &Matrix) -> Matrix {
        let act_derivative = pre_neurons.map(|x| self.activator.derivative(x));
        output_grad.hadamard(&act_derivative)
    }

    /// ∂L/∂x given this layer's δ.
    pub fn input_gradient(&self, delta: &Matrix) -> Matrix {
        delta.matmul(&self.weights.transpose()).scale(self.gain())
    }

    /// Computes gradient adjustments for a batch. Returns (weights_grad, biases_grad).
    pub fn compute_gradients(&self, delta: &Matrix, inputs: &Matrix) -> (Matrix, Matrix) {
        let weights_adjustment = inputs.transpose().matmul(delta).scale(self.gain());
        let biases_adjustment = delta.sum_rows();
        (weights_adjustment, biases_adjustment)
    }

    pub fn accumulate_gradients(&mut self, weights_grad: &Matrix, biases_grad: &Matrix) {
        self.weights_grad.accumulate(weights_grad);
        self.biases_grad.accumulate(biases_grad);
    }

    pub fn zero_grad(&mut self) {
        self.weights_grad = Matrix::zeros(self.weights.rows, self.weights.cols);
        self.biases_grad = Matrix::zeros(1, self.biases.cols);
    }

    /// Parameters paired with their accumulated gradients, weights first.
    pub fn parameters_mut(&mut self) -> [(&mut Matrix, &Matrix); 2] {
        [
            (&mut self.weights, &self.weights_grad),
            (&mut self.biases, &self.biases_grad),
        ]
    }

    pub fn parameters(&self) -> [&Matrix; 2] {
        [&self.weights, &self.biases]
    }

    pub fn gradients(&self) -> [&Matrix; 2] {
        [&self.weights_grad, &self.biases_grad]
    }
}

/// Scales `v` to unit length and returns its previous norm.
fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}
