use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::data::DataPool;
use crate::error::{GanError, Phase, Result};
use crate::instrument::{Instrumentation, Snapshot};
use crate::loss::gan_loss::GanLoss;
use crate::loss::gradient_penalty::PenaltyContext;
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::constraint::ParameterConstraint;
use crate::train::epoch_stats::EpochStats;
use crate::train::noise::NoiseSource;
use crate::train::top_k::SampleFilter;
use crate::train::train_config::TrainConfig;

/// Position of an update inside the run, carried into divergence errors.
#[derive(Debug, Clone, Copy)]
struct StepIndex {
    epoch: usize,
    batch: usize,
}

/// Running sums for one epoch.
#[derive(Debug, Default)]
struct EpochTotals {
    generator_loss: f64,
    discriminator_loss: f64,
    penalty: f64,
    penalty_steps: usize,
    discriminator_steps: usize,
    generator_steps: usize,
}

/// Alternating adversarial trainer.
///
/// Each full batch of real samples gets `d_updates` discriminator updates
/// followed by one generator update. Every update draws fresh noise, and
/// both networks' gradient buffers are cleared before each update, so no
/// gradient from one phase leaks into the other.
pub struct Trainer {
    config: TrainConfig,
    loss: GanLoss,
    constraint: ParameterConstraint,
    filter: SampleFilter,
    generator: Network,
    discriminator: Network,
    generator_optimizer: Box<dyn Optimizer>,
    discriminator_optimizer: Box<dyn Optimizer>,
    noise: Box<dyn NoiseSource>,
    rng: StdRng,
    fixed_latent: Option<Matrix>,
    hooks: Vec<Box<dyn Instrumentation>>,
    stop_flag: Option<Arc<AtomicBool>>,
    step: usize,
}

impl Trainer {
    /// Assembles a trainer around existing networks.
    ///
    /// Fails before any training when the config is invalid or the networks
    /// do not chain `latent → generator → discriminator → 1 score`.
    pub fn new(config: TrainConfig, generator: Network, discriminator: Network, rng: StdRng) -> Result<Trainer> {
        config.validate()?;
        let constraint = ParameterConstraint::from_config(
            config.loss,
            config.clip_weights,
            config.gradient_penalty_weight,
        )?;

        if generator.input_size() != config.latent_size {
            return Err(GanError::shape(
                "generator input",
                format!("latent_size {}", config.latent_size),
                format!("{} inputs", generator.input_size()),
            ));
        }
        if generator.output_size() != discriminator.input_size() {
            return Err(GanError::shape(
                "discriminator input",
                format!("{} generator outputs", generator.output_size()),
                format!("{} inputs", discriminator.input_size()),
            ));
        }
        if discriminator.output_size() != 1 {
            return Err(GanError::shape(
                "discriminator output",
                "1 score per sample",
                format!("{} outputs", discriminator.output_size()),
            ));
        }

        let loss = GanLoss::new(config.loss).with_gradient_penalty_weight(config.gradient_penalty_weight);
        let filter = SampleFilter::new(config.topk, config.epochs);
        let generator_optimizer = config.optimizer.build(config.learning_rate, config.adam_betas);
        let discriminator_optimizer = config.optimizer.build(config.learning_rate, config.adam_betas);
        let noise = config.noise.build();

        info!(
            "{} loss, {:?} optimizer, lr {}, {} epochs, batch {}, {} D updates per G update, {:?}",
            config.loss,
            config.optimizer,
            config.learning_rate,
            config.epochs,
            config.batch_size,
            config.d_updates,
            constraint,
        );
        info!(
            "generator: {} parameters, discriminator: {} parameters",
            generator.parameter_count(),
            discriminator.parameter_count(),
        );

        Ok(Trainer {
            config,
            loss,
            constraint,
            filter,
            generator,
            discriminator,
            generator_optimizer,
            discriminator_optimizer,
            noise,
            rng,
            fixed_latent: None,
            hooks: Vec::new(),
            stop_flag: None,
            step: 0,
        })
    }

    /// Builds both networks from the config for samples of width `sample_dim`.
    pub fn from_config(config: TrainConfig, sample_dim: usize, mut rng: StdRng) -> Result<Trainer> {
        let generator = Network::from_spec(&config.generator_spec(sample_dim), &mut rng)?;
        let mut discriminator = Network::from_spec(&config.discriminator_spec(sample_dim), &mut rng)?;
        if config.spectral_norm {
            discriminator.enable_spectral_norm(&mut rng);
        }
        Trainer::new(config, generator, discriminator, rng)
    }

    pub fn with_noise(mut self, noise: impl NoiseSource + 'static) -> Trainer {
        self.noise = Box::new(noise);
        self
    }

    /// Replaces the optimizers built from the config.
    pub fn with_optimizers(mut self, generator: Box<dyn Optimizer>, discriminator: Box<dyn Optimizer>) -> Trainer {
        self.generator_optimizer = generator;
        self.discriminator_optimizer = discriminator;
        self
    }

    pub fn with_instrumentation(mut self, hook: impl Instrumentation + 'static) -> Trainer {
        self.hooks.push(Box::new(hook));
        self
    }

    /// When the flag is set from another thread, `fit` returns after the
    /// current epoch.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Trainer {
        self.stop_flag = Some(flag);
        self
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn loss(&self) -> GanLoss {
        self.loss
    }

    pub fn constraint(&self) -> ParameterConstraint {
        self.constraint
    }

    pub fn generator(&self) -> &Network {
        &self.generator
    }

    pub fn discriminator(&self) -> &Network {
        &self.discriminator
    }

    /// Optimizer steps taken so far, both networks counted.
    pub fn steps(&self) -> usize {
        self.step
    }

    /// Generator output for `latent`, computed in eval mode.
    pub fn sample(&mut self, latent: &Matrix) -> Result<Matrix> {
        self.generator.set_training(false);
        let out = self.generator.forward(latent);
        self.generator.set_training(true);
        out
    }

    // -----------------------------------------------------------------------
    // Training loop
    // -----------------------------------------------------------------------

    /// Runs `config.epochs` epochs over `pool` and returns per-epoch stats.
    ///
    /// The pool is reshuffled at the start of every epoch. Any trailing rows
    /// that do not fill a whole batch are left out of that epoch.
    pub fn fit(&mut self, pool: &mut DataPool) -> Result<Vec<EpochStats>> {
        let batch_size = self.config.batch_size;
        if pool.dim() != self.discriminator.input_size() {
            return Err(GanError::shape(
                "real samples",
                format!("{} columns", self.discriminator.input_size()),
                format!("{} columns", pool.dim()),
            ));
        }
        if pool.window_count(batch_size) == 0 {
            return Err(GanError::Configuration(format!(
                "batch_size {} exceeds the {} samples in the pool",
                batch_size,
                pool.len()
            )));
        }
        let dropped = pool.dropped_per_epoch(batch_size);
        if dropped > 0 {
            warn!(
                "batch_size {} does not divide {} samples, {} are left out of each epoch",
                batch_size,
                pool.len(),
                dropped
            );
        }

        if self.fixed_latent.is_none() && !self.hooks.is_empty() {
            let rows = self.config.snapshot_rows();
            self.fixed_latent = Some(self.noise.sample(rows, self.config.latent_size, &mut self.rng));
        }

        let bar = if self.config.progress_bar {
            let bar = ProgressBar::new(self.config.epochs as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut history = Vec::with_capacity(self.config.epochs);
        for epoch in 0..self.config.epochs {
            if let Some(ref flag) = self.stop_flag {
                if flag.load(Ordering::Relaxed) {
                    info!("stop requested, ending after {} epochs", epoch);
                    break;
                }
            }

            let stats = self.train_epoch(epoch, pool)?;
            bar.set_message(format!("G {:.4}  D {:.4}", stats.generator_loss, stats.discriminator_loss));
            bar.inc(1);

            if (epoch + 1) % self.config.plot_frequency == 0 {
                self.instrument(epoch, pool, &stats);
            }
            history.push(stats);
        }
        bar.finish_and_clear();
        Ok(history)
    }

    fn train_epoch(&mut self, epoch: usize, pool: &mut DataPool) -> Result<EpochStats> {
        let t_start = Instant::now();
        let batch_size = self.config.batch_size;
        pool.shuffle(&mut self.rng);

        let mut totals = EpochTotals::default();
        for batch in 0..pool.window_count(batch_size) {
            let real = pool.window(batch, batch_size);
            let at = StepIndex { epoch, batch };

            for _ in 0..self.config.d_updates {
                let (value, penalty) = self.discriminator_step(&real, at)?;
                totals.discriminator_loss += value;
                totals.discriminator_steps += 1;
                if let Some(p) = penalty {
                    totals.penalty += p;
                    totals.penalty_steps += 1;
                }
            }

            let value = self.generator_step(real.rows, at)?;
            totals.generator_loss += value;
            totals.generator_steps += 1;
            debug!(epoch, batch, step = self.step, generator_loss = value, "batch done");
        }

        let stats = EpochStats {
            epoch: epoch + 1,
            total_epochs: self.config.epochs,
            generator_loss: totals.generator_loss / totals.generator_steps.max(1) as f64,
            discriminator_loss: totals.discriminator_loss / totals.discriminator_steps.max(1) as f64,
            gradient_penalty: (totals.penalty_steps > 0)
                .then(|| totals.penalty / totals.penalty_steps as f64),
            discriminator_steps: totals.discriminator_steps,
            generator_steps: totals.generator_steps,
            top_k_active: self.filter.is_active(epoch),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            "epoch {}/{}: G loss {:.5}, D loss {:.5}, {} ms",
            stats.epoch, stats.total_epochs, stats.generator_loss, stats.discriminator_loss, stats.elapsed_ms
        );
        Ok(stats)
    }

    // ── Discriminator update ────────────────────────────────────────────────

    /// One discriminator update against `real`. Returns the loss value and
    /// the unweighted gradient penalty when one was computed.
    fn discriminator_step(&mut self, real: &Matrix, at: StepIndex) -> Result<(f64, Option<f64>)> {
        let noise = self.noise.sample(real.rows, self.config.latent_size, &mut self.rng);
        let fake = self.generator.forward(&noise)?;

        self.discriminator_optimizer.zero_grad(&mut self.discriminator);
        self.generator_optimizer.zero_grad(&mut self.generator);
        self.discriminator.power_iteration();

        let real_trace = self.discriminator.forward_tracked(real)?;
        let fake_trace = self.discriminator.forward_tracked(&fake)?;
        let real_scores = real_trace.output().column(0);
        let fake_scores = fake_trace.output().column(0);

        let penalty_ctx = PenaltyContext {
            real,
            fake: &fake,
            discriminator: &mut self.discriminator,
            rng: &mut self.rng,
        };
        let out = self.loss.discriminator(&real_scores, &fake_scores, Some(penalty_ctx))?;
        self.check_finite(Phase::Discriminator, at, out.value)?;

        self.discriminator.backward(&real_trace, &Matrix::column_from(out.real_grad));
        self.discriminator.backward(&fake_trace, &Matrix::column_from(out.fake_grad));
        if let Some(bad) = self.discriminator.non_finite_gradient() {
            return Err(self.divergence(Phase::Discriminator, at, bad));
        }

        self.discriminator_optimizer.step(&mut self.discriminator);
        self.constraint.apply(&mut self.discriminator);
        self.step += 1;
        Ok((out.value, out.penalty))
    }

    // ── Generator update ────────────────────────────────────────────────────

    /// One generator update on a fresh batch of `rows` fakes. Gradients flow
    /// through the discriminator to the samples, but only the generator
    /// moves.
    fn generator_step(&mut self, rows: usize, at: StepIndex) -> Result<f64> {
        let noise = self.noise.sample(rows, self.config.latent_size, &mut self.rng);

        self.discriminator_optimizer.zero_grad(&mut self.discriminator);
        self.generator_optimizer.zero_grad(&mut self.generator);

        let generator_trace = self.generator.forward_tracked(&noise)?;
        let critic_trace = self.discriminator.forward_tracked(generator_trace.output())?;
        let scores = critic_trace.output().column(0);

        let (value, score_grad) = self.generator_objective(&scores, at.epoch);
        self.check_finite(Phase::Generator, at, value)?;

        let sample_grad = self.discriminator.input_gradient(&critic_trace, &Matrix::column_from(score_grad));
        self.generator.backward(&generator_trace, &sample_grad);
        if let Some(bad) = self.generator.non_finite_gradient() {
            return Err(self.divergence(Phase::Generator, at, bad));
        }

        self.generator_optimizer.step(&mut self.generator);
        self.step += 1;
        Ok(value)
    }

    /// Generator loss over the fakes the filter keeps, and its gradient with
    /// respect to every score in the batch. Filtered-out fakes get zero.
    fn generator_objective(&self, scores: &[f64], epoch: usize) -> (f64, Vec<f64>) {
        let kept = self.filter.select(scores, epoch);
        let kept_scores: Vec<f64> = kept.iter().map(|&i| scores[i]).collect();
        let out = self.loss.generator(&kept_scores);

        let mut score_grad = vec![0.0; scores.len()];
        for (&i, g) in kept.iter().zip(out.grad) {
            score_grad[i] = g;
        }
        (out.value, score_grad)
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    fn check_finite(&self, phase: Phase, at: StepIndex, value: f64) -> Result<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(self.divergence(phase, at, value))
        }
    }

    fn divergence(&self, phase: Phase, at: StepIndex, value: f64) -> GanError {
        GanError::NumericalDivergence {
            loss: self.loss.family(),
            phase,
            epoch: at.epoch,
            batch: at.batch,
            step: self.step,
            value,
        }
    }

    /// Runs every hook on the fixed latent batch with the generator in eval
    /// mode. Hook failures are logged and do not stop training.
    fn instrument(&mut self, epoch: usize, pool: &DataPool, stats: &EpochStats) {
        let Some(fixed_latent) = self.fixed_latent.as_ref() else { return };

        self.generator.set_training(false);
        match self.generator.forward(fixed_latent) {
            Ok(samples) => {
                let snapshot = Snapshot {
                    epoch,
                    generator: &self.generator,
                    samples: &samples,
                    fixed_latent,
                    real_pool: pool.samples(),
                    stats,
                };
                for hook in self.hooks.iter_mut() {
                    if let Err(e) = hook.observe(&snapshot) {
                        warn!("instrumentation hook '{}' failed at epoch {}: {}", hook.name(), epoch + 1, e);
                    }
                }
            }
            Err(e) => warn!("snapshot forward pass failed at epoch {}: {}", epoch + 1, e),
        }
        self.generator.set_training(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::loss::family::LossFamily;
    use crate::optim::Sgd;
    use rand::SeedableRng;

    fn tiny_config(loss: LossFamily) -> TrainConfig {
        TrainConfig {
            epochs: 1,
            latent_size: 2,
            samples: 8,
            batch_size: 4,
            loss,
            learning_rate: 1e-2,
            seed: Some(5),
            ..TrainConfig::default()
        }
    }

    fn networks(rng: &mut StdRng) -> (Network, Network) {
        let generator = Network::new("generator", vec![
            (4, 2, ActivationFunction::LeakyReLU { alpha: 0.2 }),
            (2, 4, ActivationFunction::Identity),
        ], rng);
        let discriminator = Network::new("discriminator", vec![
            (4, 2, ActivationFunction::LeakyReLU { alpha: 0.2 }),
            (1, 4, ActivationFunction::Identity),
        ], rng);
        (generator, discriminator)
    }

    fn pool(rng: &mut StdRng) -> DataPool {
        DataPool::new(Matrix::random_normal(8, 2, 1.0, rng)).unwrap()
    }

    #[test]
    fn one_epoch_takes_one_step_per_network_per_batch() {
        let mut rng = StdRng::seed_from_u64(1);
        let (g, d) = networks(&mut rng);
        let g_before: Vec<Matrix> = g.parameters().cloned().collect();
        let d_before: Vec<Matrix> = d.parameters().cloned().collect();
        let mut data = pool(&mut rng);

        let mut trainer = Trainer::new(tiny_config(LossFamily::LeastSquares), g, d, rng).unwrap();
        let history = trainer.fit(&mut data).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].discriminator_steps, 2);
        assert_eq!(history[0].generator_steps, 2);
        assert_eq!(trainer.steps(), 4);
        assert!(trainer.generator().parameters().zip(&g_before).any(|(a, b)| a != b));
        assert!(trainer.discriminator().parameters().zip(&d_before).any(|(a, b)| a != b));
    }

    #[test]
    fn mismatched_latent_size_fails_before_training() {
        let mut rng = StdRng::seed_from_u64(2);
        let (g, d) = networks(&mut rng);
        let config = TrainConfig { latent_size: 3, ..tiny_config(LossFamily::Standard) };
        assert!(matches!(Trainer::new(config, g, d, rng), Err(GanError::ShapeMismatch { .. })));
    }

    #[test]
    fn multi_output_discriminator_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let (g, _) = networks(&mut rng);
        let d = Network::new("discriminator", vec![(2, 2, ActivationFunction::Identity)], &mut rng);
        assert!(matches!(
            Trainer::new(tiny_config(LossFamily::Hinge), g, d, rng),
            Err(GanError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn weight_clipping_holds_after_every_epoch() {
        let mut rng = StdRng::seed_from_u64(4);
        let (g, d) = networks(&mut rng);
        let mut data = pool(&mut rng);
        let config = TrainConfig { epochs: 3, clip_weights: 0.01, ..tiny_config(LossFamily::Wasserstein) };
        let mut trainer = Trainer::new(config, g, d, rng)
            .unwrap()
            .with_optimizers(Box::new(Sgd::new(0.5)), Box::new(Sgd::new(0.5)));
        trainer.fit(&mut data).unwrap();
        for param in trainer.discriminator().parameters() {
            assert!(param.max_abs() <= 0.01);
        }
    }

    #[test]
    fn non_finite_data_reports_discriminator_divergence() {
        let mut rng = StdRng::seed_from_u64(6);
        let (g, d) = networks(&mut rng);
        let mut data = DataPool::new(Matrix::filled(8, 2, f64::NAN)).unwrap();
        let mut trainer = Trainer::new(tiny_config(LossFamily::Standard), g, d, rng).unwrap();
        match trainer.fit(&mut data) {
            Err(GanError::NumericalDivergence { loss, phase, epoch, batch, step, .. }) => {
                assert_eq!(loss, LossFamily::Standard);
                assert_eq!(phase, Phase::Discriminator);
                assert_eq!((epoch, batch, step), (0, 0, 0));
            }
            other => panic!("expected divergence, got {:?}", other.map(|h| h.len())),
        }
    }

    #[test]
    fn gradient_penalty_shows_up_in_stats() {
        let mut rng = StdRng::seed_from_u64(7);
        let (g, d) = networks(&mut rng);
        let mut data = pool(&mut rng);
        let mut trainer = Trainer::new(tiny_config(LossFamily::WassersteinGp), g, d, rng).unwrap();
        let history = trainer.fit(&mut data).unwrap();
        assert!(history[0].gradient_penalty.is_some());
        assert!(history[0].discriminator_loss.is_finite());
    }

    #[test]
    fn filtered_fakes_get_no_score_gradient_once_top_k_is_active() {
        let mut rng = StdRng::seed_from_u64(9);
        let (g, d) = networks(&mut rng);
        let config = TrainConfig { epochs: 4, topk: true, ..tiny_config(LossFamily::NonSaturating) };
        let trainer = Trainer::new(config, g, d, rng).unwrap();
        let scores = [0.3, -1.2, 2.5, 0.9];

        let (_, early) = trainer.generator_objective(&scores, 1);
        assert!(early.iter().all(|&g| g != 0.0));

        let (value, late) = trainer.generator_objective(&scores, 2);
        assert_eq!(late[0], 0.0);
        assert_eq!(late[1], 0.0);
        assert!(late[2] != 0.0 && late[3] != 0.0);
        let kept = trainer.loss().generator(&[2.5, 0.9]);
        assert_eq!(value, kept.value);
        assert_eq!((late[2], late[3]), (kept.grad[0], kept.grad[1]));
    }

    #[test]
    fn stop_flag_ends_the_run_early() {
        let mut rng = StdRng::seed_from_u64(8);
        let (g, d) = networks(&mut rng);
        let mut data = pool(&mut rng);
        let flag = Arc::new(AtomicBool::new(true));
        let config = TrainConfig { epochs: 5, ..tiny_config(LossFamily::Hinge) };
        let mut trainer = Trainer::new(config, g, d, rng).unwrap().with_stop_flag(flag);
        assert!(trainer.fit(&mut data).unwrap().is_empty());
        assert_eq!(trainer.steps(), 0);
    }
}
