use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::error::{GanError, Result};

/// One dense layer: `input_size` inputs, `size` outputs, then `activation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// A serializable description of a dense network architecture.
///
/// Generator and discriminator architectures are described this way in the
/// training configuration, so an architecture can be changed without code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name; shows up in shape errors and logs.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// A multilayer perceptron: `input → hidden... → output`, with one
    /// activation shared by every hidden layer.
    pub fn mlp(
        name: &str,
        input_size: usize,
        hidden: &[usize],
        hidden_activation: ActivationFunction,
        output_size: usize,
        output_activation: ActivationFunction,
    ) -> NetworkSpec {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = input_size;
        for &size in hidden {
            layers.push(LayerSpec { size, input_size: fan_in, activation: hidden_activation.clone() });
            fan_in = size;
        }
        layers.push(LayerSpec { size: output_size, input_size: fan_in, activation: output_activation });
        NetworkSpec { name: name.to_owned(), layers }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    /// Checks that the layers are non-empty and chain together.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(GanError::Configuration(format!("network '{}' has no layers", self.name)));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.size == 0 || layer.input_size == 0 {
                return Err(GanError::Configuration(format!(
                    "network '{}' layer {} has a zero dimension", self.name, i
                )));
            }
            if i > 0 && layer.input_size != self.layers[i - 1].size {
                return Err(GanError::shape(
                    format!("network '{}' layer {}", self.name, i),
                    format!("input_size {}", self.layers[i - 1].size),
                    format!("input_size {}", layer.input_size),
                ));
            }
        }
        Ok(())
    }
}
