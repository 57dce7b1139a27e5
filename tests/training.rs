use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use ferrite_gan::data::{DataPool, DataSource, Ring};
use ferrite_gan::instrument::{Instrumentation, MetricsLog, ModeCoverage, ScatterPlot, Snapshot};
use ferrite_gan::optim::Sgd;
use ferrite_gan::train::{GaussianNoise, NoiseSource};
use ferrite_gan::{
    ActivationFunction, EpochStats, GanError, LossFamily, Matrix, Network, Optimizer, TrainConfig, Trainer,
};

// ---------------------------------------------------------------------------
// Recording doubles
// ---------------------------------------------------------------------------

struct RecordingOptimizer {
    label: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
    inner: Sgd,
}

impl Optimizer for RecordingOptimizer {
    fn step(&mut self, network: &mut Network) {
        self.log.borrow_mut().push(self.label);
        self.inner.step(network);
    }

    fn learning_rate(&self) -> f64 {
        self.inner.learning_rate()
    }
}

struct RecordingNoise {
    draws: Rc<RefCell<Vec<Matrix>>>,
}

impl NoiseSource for RecordingNoise {
    fn sample(&self, rows: usize, cols: usize, rng: &mut dyn RngCore) -> Matrix {
        let m = GaussianNoise.sample(rows, cols, rng);
        self.draws.borrow_mut().push(m.clone());
        m
    }
}

struct RecordingHook {
    seen: Rc<RefCell<Vec<(usize, Matrix, bool)>>>,
}

impl Instrumentation for RecordingHook {
    fn name(&self) -> &str {
        "recording"
    }

    fn observe(&mut self, snapshot: &Snapshot<'_>) -> ferrite_gan::Result<()> {
        self.seen.borrow_mut().push((
            snapshot.epoch,
            snapshot.fixed_latent.clone(),
            snapshot.generator.is_training(),
        ));
        Ok(())
    }
}

fn config(loss: LossFamily) -> TrainConfig {
    TrainConfig {
        epochs: 1,
        latent_size: 2,
        samples: 8,
        batch_size: 4,
        loss,
        learning_rate: 1e-2,
        seed: Some(11),
        ..TrainConfig::default()
    }
}

fn networks(rng: &mut StdRng) -> (Network, Network) {
    let generator = Network::new("generator", vec![
        (8, 2, ActivationFunction::LeakyReLU { alpha: 0.2 }),
        (2, 8, ActivationFunction::Identity),
    ], rng);
    let discriminator = Network::new("discriminator", vec![
        (8, 2, ActivationFunction::LeakyReLU { alpha: 0.2 }),
        (1, 8, ActivationFunction::Identity),
    ], rng);
    (generator, discriminator)
}

fn ring_pool(samples: usize, rng: &mut StdRng) -> DataPool {
    DataPool::new(Ring::default().sample(samples, rng).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// Alternating protocol
// ---------------------------------------------------------------------------

#[test]
fn three_discriminator_updates_precede_each_generator_update() {
    let mut rng = StdRng::seed_from_u64(1);
    let (g, d) = networks(&mut rng);
    let mut pool = ring_pool(8, &mut rng);
    let log = Rc::new(RefCell::new(Vec::new()));
    let draws = Rc::new(RefCell::new(Vec::new()));

    let mut trainer = Trainer::new(TrainConfig { d_updates: 3, ..config(LossFamily::Hinge) }, g, d, rng)
        .unwrap()
        .with_optimizers(
            Box::new(RecordingOptimizer { label: "G", log: Rc::clone(&log), inner: Sgd::new(0.01) }),
            Box::new(RecordingOptimizer { label: "D", log: Rc::clone(&log), inner: Sgd::new(0.01) }),
        )
        .with_noise(RecordingNoise { draws: Rc::clone(&draws) });
    trainer.fit(&mut pool).unwrap();

    assert_eq!(*log.borrow(), vec!["D", "D", "D", "G", "D", "D", "D", "G"]);

    // Four updates per batch, each on its own noise draw.
    let draws = draws.borrow();
    assert_eq!(draws.len(), 8);
    for i in 0..draws.len() {
        assert_eq!(draws[i].shape(), (4, 2));
        for j in (i + 1)..draws.len() {
            assert_ne!(draws[i], draws[j], "noise draws {} and {} coincide", i, j);
        }
    }
}

#[test]
fn generator_updates_never_move_the_discriminator() {
    let mut rng = StdRng::seed_from_u64(2);
    let (g, d) = networks(&mut rng);
    let g_before: Vec<Matrix> = g.parameters().cloned().collect();
    let d_before: Vec<Matrix> = d.parameters().cloned().collect();
    let mut pool = ring_pool(8, &mut rng);

    let mut trainer = Trainer::new(config(LossFamily::NonSaturating), g, d, rng)
        .unwrap()
        .with_optimizers(Box::new(Sgd::new(0.1)), Box::new(Sgd::new(0.0)));
    trainer.fit(&mut pool).unwrap();

    let d_after: Vec<Matrix> = trainer.discriminator().parameters().cloned().collect();
    assert_eq!(d_after, d_before);
    assert!(trainer.generator().parameters().zip(&g_before).any(|(a, b)| a != b));
}

#[test]
fn least_squares_run_takes_two_steps_per_network() {
    let rng = StdRng::seed_from_u64(3);
    let cfg = config(LossFamily::LeastSquares);
    let mut data_rng = StdRng::seed_from_u64(30);
    let mut pool = ring_pool(cfg.samples, &mut data_rng);

    let mut trainer = Trainer::from_config(cfg, 2, rng).unwrap();
    let g_before: Vec<Matrix> = trainer.generator().parameters().cloned().collect();
    let d_before: Vec<Matrix> = trainer.discriminator().parameters().cloned().collect();
    let history = trainer.fit(&mut pool).unwrap();

    assert_eq!(history[0].discriminator_steps, 2);
    assert_eq!(history[0].generator_steps, 2);
    assert!(history[0].generator_loss.is_finite());
    assert!(history[0].discriminator_loss.is_finite());
    assert!(trainer.generator().parameters().zip(&g_before).any(|(a, b)| a != b));
    assert!(trainer.discriminator().parameters().zip(&d_before).any(|(a, b)| a != b));
}

#[test]
fn every_family_trains_without_diverging() {
    for family in LossFamily::ALL {
        let mut rng = StdRng::seed_from_u64(4);
        let (g, d) = networks(&mut rng);
        let mut pool = ring_pool(16, &mut rng);
        let cfg = TrainConfig {
            epochs: 2,
            clip_weights: if family == LossFamily::Wasserstein { 0.05 } else { 0.0 },
            ..config(family)
        };
        let history = Trainer::new(cfg, g, d, rng).unwrap().fit(&mut pool).unwrap();
        assert_eq!(history.len(), 2, "{}", family);
        assert!(history.iter().all(|s| s.generator_loss.is_finite()), "{}", family);
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[test]
fn unknown_loss_family_is_rejected_up_front() {
    let err = "bogus".parse::<LossFamily>().unwrap_err();
    assert!(matches!(err, GanError::Configuration(_)));
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn clip_bound_with_hinge_is_rejected_before_training() {
    let mut rng = StdRng::seed_from_u64(5);
    let (g, d) = networks(&mut rng);
    let cfg = TrainConfig { clip_weights: 0.01, ..config(LossFamily::Hinge) };
    assert!(matches!(Trainer::new(cfg, g, d, rng), Err(GanError::Configuration(_))));
}

#[test]
fn pool_of_the_wrong_width_is_a_shape_mismatch() {
    let mut rng = StdRng::seed_from_u64(6);
    let (g, d) = networks(&mut rng);
    let mut pool = DataPool::new(Matrix::zeros(8, 3)).unwrap();
    let mut trainer = Trainer::new(config(LossFamily::Standard), g, d, rng).unwrap();
    assert!(matches!(trainer.fit(&mut pool), Err(GanError::ShapeMismatch { .. })));
}

// ---------------------------------------------------------------------------
// Instrumentation
// ---------------------------------------------------------------------------

#[test]
fn hooks_run_on_the_plot_cadence() {
    let dir = tempfile::tempdir().unwrap();
    let metrics_path = dir.path().join("metrics.jsonl");
    let cfg = TrainConfig {
        epochs: 4,
        plot_frequency: 2,
        samples: 32,
        batch_size: 8,
        snapshot_size: Some(16),
        data: DataSource::Ring(Ring::default()),
        ..config(LossFamily::Standard)
    };
    let mut rng = cfg.rng();
    let loaded = cfg.data.load(cfg.samples, &mut rng).unwrap();
    let mut pool = loaded.pool;

    let mut trainer = Trainer::from_config(cfg, 2, rng)
        .unwrap()
        .with_instrumentation(MetricsLog::create(&metrics_path).unwrap())
        .with_instrumentation(ScatterPlot::new(dir.path()).with_size(64))
        .with_instrumentation(ModeCoverage::new(Ring::default().centers(), Vec::<u8>::new()));
    trainer.fit(&mut pool).unwrap();
    drop(trainer);

    let text = std::fs::read_to_string(&metrics_path).unwrap();
    let epochs: Vec<usize> = text
        .lines()
        .map(|l| serde_json::from_str::<EpochStats>(l).unwrap().epoch)
        .collect();
    assert_eq!(epochs, vec![2, 4]);
    assert!(dir.path().join("0002.png").exists());
    assert!(dir.path().join("0004.png").exists());
    assert!(!dir.path().join("0001.png").exists());
}

#[test]
fn constant_noise_makes_every_fake_identical() {
    let mut rng = StdRng::seed_from_u64(8);
    let (g, d) = networks(&mut rng);
    let mut trainer = Trainer::new(config(LossFamily::Standard), g, d, rng).unwrap();
    let latent = ferrite_gan::train::ConstantNoise(0.5).sample(5, 2, &mut StdRng::seed_from_u64(0));
    let fakes = trainer.sample(&latent).unwrap();
    assert!(fakes.data.iter().all(|row| row == &fakes.data[0]));
}

#[test]
fn every_cadence_point_sees_the_same_fixed_latent() {
    let mut rng = StdRng::seed_from_u64(9);
    let (g, d) = networks(&mut rng);
    let mut pool = ring_pool(8, &mut rng);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let cfg = TrainConfig { epochs: 4, plot_frequency: 1, snapshot_size: Some(6), ..config(LossFamily::Standard) };

    let mut trainer = Trainer::new(cfg, g, d, rng)
        .unwrap()
        .with_instrumentation(RecordingHook { seen: Rc::clone(&seen) });
    trainer.fit(&mut pool).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.iter().map(|s| s.0).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert_eq!(seen[0].1.shape(), (6, 2));
    assert!(seen.iter().all(|s| s.1 == seen[0].1));
    // Hooks see the generator in eval mode; training resumes afterwards.
    assert!(seen.iter().all(|s| !s.2));
    assert!(trainer.generator().is_training());
}

#[test]
fn top_k_switches_on_at_the_halfway_epoch() {
    let mut rng = StdRng::seed_from_u64(10);
    let (g, d) = networks(&mut rng);
    let mut pool = ring_pool(8, &mut rng);
    let cfg = TrainConfig { epochs: 4, topk: true, ..config(LossFamily::NonSaturating) };

    let history = Trainer::new(cfg, g, d, rng).unwrap().fit(&mut pool).unwrap();
    let active: Vec<bool> = history.iter().map(|s| s.top_k_active).collect();
    assert_eq!(active, vec![false, false, true, true]);
}

#[test]
fn top_k_stays_off_when_disabled() {
    let mut rng = StdRng::seed_from_u64(11);
    let (g, d) = networks(&mut rng);
    let mut pool = ring_pool(8, &mut rng);
    let cfg = TrainConfig { epochs: 4, ..config(LossFamily::NonSaturating) };

    let history = Trainer::new(cfg, g, d, rng).unwrap().fit(&mut pool).unwrap();
    assert!(history.iter().all(|s| !s.top_k_active));
}
