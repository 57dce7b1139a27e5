use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activation::activation::ActivationFunction;
use crate::data::DataSource;
use crate::error::{GanError, Result};
use crate::loss::family::LossFamily;
use crate::loss::gan_loss::DEFAULT_GRADIENT_PENALTY_WEIGHT;
use crate::network::spec::NetworkSpec;
use crate::optim::OptimizerKind;
use crate::train::constraint::ParameterConstraint;
use crate::train::noise::NoiseMode;

/// Where the run is asked to execute. Only the CPU path exists; asking for
/// an accelerator logs a warning and trains on the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ComputeTarget {
    #[default]
    Cpu,
    Accelerator,
}

/// Configuration for a `Trainer` run.
///
/// Every field has a default, so a config file only needs the keys it
/// changes. `generator` and `discriminator` fall back to MLPs derived from
/// `latent_size` and the sample width when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    pub compute_target: ComputeTarget,
    pub epochs: usize,
    /// Discriminator updates per generator update.
    pub d_updates: usize,
    /// Instrumentation runs when `(epoch + 1) % plot_frequency == 0`.
    pub plot_frequency: usize,
    pub learning_rate: f64,
    pub latent_size: usize,
    /// Size of the synthetic pool. Ignored for image data.
    pub samples: usize,
    pub batch_size: usize,
    pub loss: LossFamily,
    pub spectral_norm: bool,
    /// `> 0` turns on weight clipping at this bound.
    pub clip_weights: f64,
    pub gradient_penalty_weight: f64,
    pub topk: bool,
    pub gen_picture: bool,
    pub optimizer: OptimizerKind,
    pub adam_betas: (f64, f64),
    pub noise: NoiseMode,
    pub data: DataSource,
    pub generator: Option<NetworkSpec>,
    pub discriminator: Option<NetworkSpec>,
    /// Rows in the fixed latent batch fed to instrumentation.
    pub snapshot_size: Option<usize>,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub progress_bar: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            compute_target: ComputeTarget::Cpu,
            epochs: 10_000,
            d_updates: 1,
            plot_frequency: 10,
            learning_rate: 1e-4,
            latent_size: 32,
            samples: 10_000,
            batch_size: 500,
            loss: LossFamily::Standard,
            spectral_norm: false,
            clip_weights: 0.0,
            gradient_penalty_weight: DEFAULT_GRADIENT_PENALTY_WEIGHT,
            topk: false,
            gen_picture: false,
            optimizer: OptimizerKind::RmsProp,
            adam_betas: (0.5, 0.999),
            noise: NoiseMode::Gaussian,
            data: DataSource::default(),
            generator: None,
            discriminator: None,
            snapshot_size: None,
            seed: None,
            output_dir: PathBuf::from("plots"),
            progress_bar: false,
        }
    }
}

impl TrainConfig {
    /// Image layout: 100-dim latent, 256-512-1024 generator with a tanh
    /// output, 512-256 discriminator, Adam and non-saturating loss.
    pub fn image_preset(width: usize, height: usize, images: impl Into<PathBuf>) -> TrainConfig {
        let pixels = width * height;
        let latent_size = 100;
        TrainConfig {
            epochs: 50,
            plot_frequency: 1,
            learning_rate: 2e-4,
            latent_size,
            batch_size: 64,
            loss: LossFamily::NonSaturating,
            gen_picture: true,
            optimizer: OptimizerKind::Adam,
            noise: NoiseMode::Constant { value: 0.5 },
            data: DataSource::Idx { images: images.into() },
            generator: Some(NetworkSpec::mlp(
                "generator",
                latent_size,
                &[256, 512, 1024],
                ActivationFunction::LeakyReLU { alpha: 0.2 },
                pixels,
                ActivationFunction::Tanh,
            )),
            discriminator: Some(NetworkSpec::mlp(
                "discriminator",
                pixels,
                &[512, 256],
                ActivationFunction::LeakyReLU { alpha: 0.2 },
                1,
                ActivationFunction::Identity,
            )),
            snapshot_size: Some(16),
            ..TrainConfig::default()
        }
    }

    /// Loads a config from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> Result<TrainConfig> {
        let text = std::fs::read_to_string(path)?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => TrainConfig::from_toml_str(&text),
            Some("json") => serde_json::from_str(&text)
                .map_err(|e| GanError::Configuration(e.to_string())),
            _ => Err(GanError::Configuration(
                "config file must end in .toml or .json".to_string(),
            )),
        };
        parsed.map_err(|e| match e {
            GanError::Configuration(msg) => {
                GanError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<TrainConfig> {
        toml::from_str(text).map_err(|e| GanError::Configuration(e.to_string()))
    }

    /// Rejects settings no run could use. Called by `Trainer::new`.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("epochs", self.epochs),
            ("d_updates", self.d_updates),
            ("plot_frequency", self.plot_frequency),
            ("latent_size", self.latent_size),
            ("samples", self.samples),
            ("batch_size", self.batch_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(GanError::Configuration(format!("{} must be positive", name)));
            }
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(GanError::Configuration(format!(
                "learning_rate must be a positive number, got {}", self.learning_rate
            )));
        }
        if !(self.gradient_penalty_weight.is_finite() && self.gradient_penalty_weight >= 0.0) {
            return Err(GanError::Configuration(format!(
                "gradient_penalty_weight must be non-negative, got {}",
                self.gradient_penalty_weight
            )));
        }
        let (beta1, beta2) = self.adam_betas;
        if !((0.0..1.0).contains(&beta1) && (0.0..1.0).contains(&beta2)) {
            return Err(GanError::Configuration(format!(
                "adam_betas must lie in [0, 1), got ({}, {})", beta1, beta2
            )));
        }
        if let NoiseMode::Constant { value } = self.noise {
            if !value.is_finite() {
                return Err(GanError::Configuration("constant noise value must be finite".to_string()));
            }
        }
        if self.snapshot_size == Some(0) {
            return Err(GanError::Configuration("snapshot_size must be positive".to_string()));
        }
        if let DataSource::Ring(ring) = &self.data {
            if self.batch_size > self.samples {
                return Err(GanError::Configuration(format!(
                    "batch_size {} exceeds the {} samples in the pool",
                    self.batch_size, self.samples
                )));
            }
            ring.validate()?;
        }
        ParameterConstraint::from_config(self.loss, self.clip_weights, self.gradient_penalty_weight)?;
        for spec in [&self.generator, &self.discriminator].into_iter().flatten() {
            spec.validate()?;
        }
        if let Some(generator) = &self.generator {
            if generator.input_size() != self.latent_size {
                return Err(GanError::shape(
                    "generator input",
                    format!("latent_size {}", self.latent_size),
                    format!("{} inputs", generator.input_size()),
                ));
            }
        }

        if self.loss == LossFamily::Wasserstein && self.clip_weights == 0.0 && !self.spectral_norm {
            warn!("wasserstein loss without weight clipping or spectral norm leaves the critic unconstrained");
        }
        if self.compute_target == ComputeTarget::Accelerator {
            warn!("no accelerator backend is available, training on the CPU");
        }
        Ok(())
    }

    /// Rows in the fixed latent batch used for snapshots.
    pub fn snapshot_rows(&self) -> usize {
        self.snapshot_size.unwrap_or((self.samples / 10).max(1))
    }

    /// Seeded from `seed` when set, otherwise from OS entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// The configured generator, or `latent → 256 → 256 → sample_dim`.
    /// Image data gets a tanh output to match the pixel range.
    pub fn generator_spec(&self, sample_dim: usize) -> NetworkSpec {
        if let Some(spec) = &self.generator {
            return spec.clone();
        }
        let output = match self.data {
            DataSource::Idx { .. } => ActivationFunction::Tanh,
            DataSource::Ring(_) => ActivationFunction::Identity,
        };
        NetworkSpec::mlp(
            "generator",
            self.latent_size,
            &[256, 256],
            ActivationFunction::LeakyReLU { alpha: 0.2 },
            sample_dim,
            output,
        )
    }

    /// The configured discriminator, or `sample_dim → 256 → 256 → 1` with a
    /// linear score.
    pub fn discriminator_spec(&self, sample_dim: usize) -> NetworkSpec {
        if let Some(spec) = &self.discriminator {
            return spec.clone();
        }
        NetworkSpec::mlp(
            "discriminator",
            sample_dim,
            &[256, 256],
            ActivationFunction::LeakyReLU { alpha: 0.2 },
            1,
            ActivationFunction::Identity,
        )
    }
}
