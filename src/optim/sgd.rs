use crate::{network::network::Network, optim::optimizer::Optimizer};

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    /// Applies one SGD weight update: `θ ← θ − lr · ∇θ`.
    fn step(&mut self, network: &mut Network) {
        let lr = self.learning_rate;
        for (param, grad) in network.parameters_mut() {
            *param = param.zip_map(grad, |p, g| p - lr * g);
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}
