use crate::network::network::Network;

/// A stateful parameter update rule.
///
/// Optimizers never compute gradients; they read the buffers filled by
/// `Network::backward` and friends. Any per-parameter state is keyed by the
/// parameter's position in `Network::parameters_mut()`, so one optimizer
/// instance must stay bound to one network.
pub trait Optimizer {
    /// Clears the network's gradient buffers before a new backward pass.
    fn zero_grad(&mut self, network: &mut Network) {
        network.zero_grad();
    }

    /// Applies one update using the currently accumulated gradients.
    fn step(&mut self, network: &mut Network);

    fn learning_rate(&self) -> f64;
}
