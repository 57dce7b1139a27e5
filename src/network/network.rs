use rand::Rng;

use crate::{activation::activation::ActivationFunction, layers::dense::Layer, math::matrix::Matrix};
use crate::error::{GanError, Result};
use crate::network::spec::NetworkSpec;

/// Intermediate values of a tracked forward pass, kept for backprop.
///
/// `activations[0]` is the input; `activations[i + 1]` and
/// `pre_activations[i]` belong to layer `i`.
#[derive(Debug, Clone)]
pub struct Trace {
    pub activations: Vec<Matrix>,
    pub pre_activations: Vec<Matrix>,
}

impl Trace {
    pub fn input(&self) -> &Matrix {
        &self.activations[0]
    }

    pub fn output(&self) -> &Matrix {
        &self.activations[self.activations.len() - 1]
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub layers: Vec<Layer>,
    training: bool,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new<R: Rng + ?Sized>(name: &str, layer_specs: Vec<(usize, usize, ActivationFunction)>, rng: &mut R) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network::from_layers(name, layers)
    }

    pub fn from_layers(name: &str, layers: Vec<Layer>) -> Network {
        Network { name: name.to_owned(), layers, training: true }
    }

    pub fn from_spec<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Result<Network> {
        spec.validate()?;
        let tuples = spec.layers.iter()
            .map(|l| (l.size, l.input_size, l.activation.clone()))
            .collect();
        Ok(Network::new(&spec.name, tuples, rng))
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn enable_spectral_norm<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.enable_spectral_norm(rng);
        }
    }

    /// Refreshes spectral-norm estimates. Frozen in eval mode.
    pub fn power_iteration(&mut self) {
        if !self.training {
            return;
        }
        for layer in &mut self.layers {
            layer.power_iteration();
        }
    }

    fn check_input(&self, input: &Matrix) -> Result<()> {
        if input.cols != self.input_size() {
            return Err(GanError::shape(
                format!("{} input", self.name),
                format!("{} columns", self.input_size()),
                format!("{} columns", input.cols),
            ));
        }
        Ok(())
    }

    /// Untracked forward pass: nothing is kept for backprop.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        self.check_input(input)?;
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.feed_from(&current).1;
        }
        Ok(current)
    }

    /// Forward pass that records every layer's input and pre-activation.
    pub fn forward_tracked(&self, input: &Matrix) -> Result<Trace> {
        self.check_input(input)?;
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut current = input.clone();
        for layer in &self.layers {
            let (z, a) = layer.feed_from(&current);
            pre_activations.push(z);
            activations.push(std::mem::replace(&mut current, a));
        }
        activations.push(current);
        Ok(Trace { activations, pre_activations })
    }

    /// Backprop of `output_grad` (∂L/∂output) through a tracked pass.
    ///
    /// Parameter gradients are accumulated into the layers; the returned
    /// matrix is ∂L/∂input.
    pub fn backward(&mut self, trace: &Trace, output_grad: &Matrix) -> Matrix {
        let mut grads = Vec::with_capacity(self.layers.len());
        let input_grad = self.propagate(trace, output_grad, |i, layer, delta| {
            grads.push((i, layer.compute_gradients(delta, &trace.activations[i])));
        });
        for (i, (w_grad, b_grad)) in grads {
            self.layers[i].accumulate_gradients(&w_grad, &b_grad);
        }
        input_grad
    }

    /// ∂L/∂input for a tracked pass, leaving parameter gradients untouched.
    pub fn input_gradient(&self, trace: &Trace, output_grad: &Matrix) -> Matrix {
        self.propagate(trace, output_grad, |_, _, _| {})
    }

    fn propagate<F>(&self, trace: &Trace, output_grad: &Matrix, mut visit: F) -> Matrix
    where
        F: FnMut(usize, &Layer, &Matrix),
    {
        assert_eq!(trace.pre_activations.len(), self.layers.len(), "trace belongs to another network");
        assert_eq!(output_grad.shape(), trace.output().shape(), "output gradient shape");

        let mut grad = output_grad.clone();
        for i in (0..self.layers.len()).rev() {
            let layer = &self.layers[i];
            let delta = layer.delta(&grad, &trace.pre_activations[i]);
            visit(i, layer, &delta);
            grad = layer.input_gradient(&delta);
        }
        grad
    }

    /// Gradient penalty on the input gradient of a scalar-output network.
    ///
    /// Computes `P = mean_b (‖∂D(x_b)/∂x_b‖₂ − 1)²` over the rows of `input`
    /// and accumulates `weight · ∂P/∂θ` into the layer gradients by
    /// differentiating the backward pass itself. Returns the unweighted `P`.
    pub fn penalize_input_gradient(&mut self, input: &Matrix, weight: f64) -> Result<f64> {
        if self.output_size() != 1 {
            return Err(GanError::shape(
                format!("{} output for gradient penalty", self.name),
                "1 column",
                format!("{} columns", self.output_size()),
            ));
        }
        let trace = self.forward_tracked(input)?;
        let n_layers = self.layers.len();
        let batch = input.rows;
        if batch == 0 {
            return Ok(0.0);
        }

        // Backward pass for ∂D/∂x, keeping g_i = ∂D/∂a_i and every δ_i.
        let mut g = vec![Matrix::default(); n_layers + 1];
        let mut deltas = vec![Matrix::default(); n_layers];
        g[n_layers] = Matrix::filled(batch, 1, 1.0);
        for i in (0..n_layers).rev() {
            let layer = &self.layers[i];
            deltas[i] = layer.delta(&g[i + 1], &trace.pre_activations[i]);
            g[i] = layer.input_gradient(&deltas[i]);
        }

        let n = batch as f64;
        let norms = g[0].row_norms();
        let penalty = norms.iter().map(|nb| (nb - 1.0).powi(2)).sum::<f64>() / n;

        // ∂(weight · P)/∂g_0, row by row. A zero gradient row has no direction.
        let seed: Vec<f64> = norms.iter()
            .map(|&nb| if nb > f64::EPSILON { weight * 2.0 * (nb - 1.0) / (n * nb) } else { 0.0 })
            .collect();
        let mut g_bar = g[0].scale_rows(&seed);

        // Reverse of the backward pass, input side first:
        //   g_i = gain · δ_i Wᵀ,   δ_i = g_{i+1} ⊙ f'(z_i)
        let mut w_grads = Vec::with_capacity(n_layers);
        let mut z_bars = Vec::with_capacity(n_layers);
        for i in 0..n_layers {
            let layer = &self.layers[i];
            let pre = &trace.pre_activations[i];
            let gain = layer.gain();
            let delta_bar = g_bar.matmul(&layer.weights).scale(gain);
            w_grads.push(g_bar.transpose().matmul(&deltas[i]).scale(gain));
            let second = pre.map(|x| layer.activator.second_derivative(x));
            z_bars.push(delta_bar.hadamard(&g[i + 1]).hadamard(&second));
            g_bar = layer.delta(&delta_bar, pre);
        }

        // Reverse of the forward pass. The penalty does not read the output
        // itself, so the activation adjoint starts at zero.
        let mut a_bar = Matrix::zeros(batch, self.output_size());
        let mut grads = Vec::with_capacity(n_layers);
        for i in (0..n_layers).rev() {
            let layer = &self.layers[i];
            let z_bar = z_bars[i].clone() + layer.delta(&a_bar, &trace.pre_activations[i]);
            let (mut w_grad, b_grad) = layer.compute_gradients(&z_bar, &trace.activations[i]);
            w_grad.accumulate(&w_grads[i]);
            grads.push((i, w_grad, b_grad));
            if i > 0 {
                a_bar = layer.input_gradient(&z_bar);
            }
        }

        for (i, w_grad, b_grad) in grads {
            self.layers[i].accumulate_gradients(&w_grad, &b_grad);
        }
        Ok(penalty)
    }

    pub fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grad();
        }
    }

    /// Every trainable matrix, in a stable order (per layer: weights, biases).
    pub fn parameters(&self) -> impl Iterator<Item = &Matrix> + '_ {
        self.layers.iter().flat_map(Layer::parameters)
    }

    /// Parameters paired with their gradients, in the same order as `parameters()`.
    pub fn parameters_mut(&mut self) -> impl Iterator<Item = (&mut Matrix, &Matrix)> + '_ {
        self.layers.iter_mut().flat_map(Layer::parameters_mut)
    }

    pub fn gradients(&self) -> impl Iterator<Item = &Matrix> + '_ {
        self.layers.iter().flat_map(Layer::gradients)
    }

    /// The first NaN or infinite gradient entry, if any.
    pub fn non_finite_gradient(&self) -> Option<f64> {
        self.gradients()
            .flat_map(|g| g.data.iter().flatten())
            .copied()
            .find(|x| !x.is_finite())
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters().map(|p| p.rows * p.cols).sum()
    }

    /// Projects every parameter element into `[-bound, bound]`.
    pub fn clamp_parameters(&mut self, bound: f64) {
        for (param, _) in self.parameters_mut() {
            param.clamp_in_place(-bound, bound);
        }
    }
}
