use crate::{math::matrix::Matrix, network::network::Network, optim::optimizer::Optimizer};

/// RMSprop with a running average of squared gradients:
///
/// ```text
/// v ← α·v + (1 − α)·g²
/// θ ← θ − lr · g / (√v + ε)
/// ```
pub struct RmsProp {
    pub learning_rate: f64,
    pub alpha: f64,
    pub eps: f64,
    square_avg: Vec<Matrix>,
}

impl RmsProp {
    pub fn new(learning_rate: f64) -> RmsProp {
        RmsProp { learning_rate, alpha: 0.99, eps: 1e-8, square_avg: Vec::new() }
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, network: &mut Network) {
        let (lr, alpha, eps) = (self.learning_rate, self.alpha, self.eps);
        for (i, (param, grad)) in network.parameters_mut().enumerate() {
            if self.square_avg.len() <= i {
                self.square_avg.push(Matrix::zeros(grad.rows, grad.cols));
            }
            let v = self.square_avg[i].zip_map(grad, |v, g| alpha * v + (1.0 - alpha) * g * g);
            *param = param.zip_map(&grad.zip_map(&v, |g, v| g / (v.sqrt() + eps)), |p, u| p - lr * u);
            self.square_avg[i] = v;
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}
