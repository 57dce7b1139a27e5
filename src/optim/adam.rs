use crate::{math::matrix::Matrix, network::network::Network, optim::optimizer::Optimizer};

/// Adam with bias-corrected first and second moment estimates.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    t: i32,
    m: Vec<Matrix>,
    v: Vec<Matrix>,
}

impl Adam {
    pub fn new(learning_rate: f64, betas: (f64, f64)) -> Adam {
        Adam {
            learning_rate,
            beta1: betas.0,
            beta2: betas.1,
            eps: 1e-8,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, network: &mut Network) {
        self.t += 1;
        let (lr, b1, b2, eps) = (self.learning_rate, self.beta1, self.beta2, self.eps);
        let c1 = 1.0 - b1.powi(self.t);
        let c2 = 1.0 - b2.powi(self.t);

        for (i, (param, grad)) in network.parameters_mut().enumerate() {
            if self.m.len() <= i {
                self.m.push(Matrix::zeros(grad.rows, grad.cols));
                self.v.push(Matrix::zeros(grad.rows, grad.cols));
            }
            self.m[i] = self.m[i].zip_map(grad, |m, g| b1 * m + (1.0 - b1) * g);
            self.v[i] = self.v[i].zip_map(grad, |v, g| b2 * v + (1.0 - b2) * g * g);
            let update = self.m[i].zip_map(&self.v[i], |m, v| (m / c1) / ((v / c2).sqrt() + eps));
            *param = param.zip_map(&update, |p, u| p - lr * u);
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}
