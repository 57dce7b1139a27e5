use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::error::GanError;

/// Selects which adversarial objective the training loop uses.
///
/// A family names both the generator and the discriminator objective, so the
/// two halves can never be mixed.
///
/// - `Standard`: minimax cross-entropy; the generator saturates once the
///   discriminator is confident.
/// - `NonSaturating`: same discriminator, generator maximises log D(G(z)).
/// - `Hinge`: margin loss on raw scores.
/// - `Wasserstein`: critic difference of means; pair with weight clipping.
/// - `WassersteinGp`: Wasserstein plus a gradient penalty on interpolates.
/// - `LeastSquares`: squared distance to the 1 / 0 targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LossFamily {
    Standard,
    NonSaturating,
    Hinge,
    Wasserstein,
    WassersteinGp,
    LeastSquares,
}

impl LossFamily {
    pub const ALL: [LossFamily; 6] = [
        LossFamily::Standard,
        LossFamily::NonSaturating,
        LossFamily::Hinge,
        LossFamily::Wasserstein,
        LossFamily::WassersteinGp,
        LossFamily::LeastSquares,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LossFamily::Standard => "standard",
            LossFamily::NonSaturating => "non-saturating",
            LossFamily::Hinge => "hinge",
            LossFamily::Wasserstein => "wasserstein",
            LossFamily::WassersteinGp => "wasserstein-gp",
            LossFamily::LeastSquares => "least-squares",
        }
    }

    /// Only the plain Wasserstein critic is meant to be weight-clipped.
    pub fn accepts_weight_clipping(self) -> bool {
        self == LossFamily::Wasserstein
    }

    pub fn uses_gradient_penalty(self) -> bool {
        self == LossFamily::WassersteinGp
    }
}

impl fmt::Display for LossFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LossFamily {
    type Err = GanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LossFamily::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = LossFamily::ALL.iter().map(|f| f.name()).collect();
                GanError::Configuration(format!(
                    "unknown loss family '{}' (expected one of: {})", s, known.join(", ")
                ))
            })
    }
}
