use std::fmt;

use thiserror::Error;

use crate::loss::family::LossFamily;

/// Which half of the adversarial update produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discriminator,
    Generator,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Discriminator => write!(f, "discriminator"),
            Phase::Generator => write!(f, "generator"),
        }
    }
}

/// Errors raised while configuring or running adversarial training.
///
/// None of these are retried: a run that hits one terminates.
#[derive(Debug, Error)]
pub enum GanError {
    /// Rejected before the first training step.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A loss or gradient left the finite range.
    #[error(
        "numerical divergence: {loss} {phase} produced {value} at epoch {epoch}, batch {batch}, step {step}"
    )]
    NumericalDivergence {
        loss: LossFamily,
        phase: Phase,
        epoch: usize,
        batch: usize,
        step: usize,
        value: f64,
    },

    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("data error: {0}")]
    Data(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GanError {
    pub(crate) fn shape(
        context: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> GanError {
        GanError::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_message_names_family_phase_and_step() {
        let err = GanError::NumericalDivergence {
            loss: LossFamily::WassersteinGp,
            phase: Phase::Discriminator,
            epoch: 3,
            batch: 1,
            step: 17,
            value: f64::NAN,
        };
        let msg = err.to_string();
        assert!(msg.contains("wasserstein-gp"));
        assert!(msg.contains("discriminator"));
        assert!(msg.contains("epoch 3"));
        assert!(msg.contains("step 17"));
    }

    #[test]
    fn shape_helper_formats_both_sides() {
        let err = GanError::shape("discriminator input", "2 columns", "3 columns");
        assert_eq!(
            err.to_string(),
            "shape mismatch in discriminator input: expected 2 columns, got 3 columns"
        );
    }
}
