use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ferrite_gan::data::DataSource;
use ferrite_gan::instrument::mode_coverage::DEFAULT_CAPTURE_RADIUS;
use ferrite_gan::instrument::{ImageGrid, MetricsLog, ModeCoverage, ScatterPlot};
use ferrite_gan::{LossFamily, TrainConfig, Trainer};

#[derive(Parser)]
#[command(name = "ferrite-gan")]
#[command(about = "Train a GAN with a selectable loss family", long_about = None)]
struct Cli {
    /// TOML or JSON training config; defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Loss family: standard, non-saturating, hinge, wasserstein, wasserstein-gp, least-squares
    #[arg(short, long)]
    loss: Option<String>,

    /// Number of epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for plots and logs
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => TrainConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TrainConfig::default(),
    };
    if let Some(loss) = &cli.loss {
        config.loss = loss.parse::<LossFamily>()?;
    }
    if let Some(epochs) = cli.epochs {
        config.epochs = epochs;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    config.validate()?;

    let mut rng = config.rng();
    let loaded = config.data.load(config.samples, &mut rng).context("loading real samples")?;
    let mut pool = loaded.pool;
    info!("{} real samples of width {}", pool.len(), pool.dim());

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    let output_dir = config.output_dir.clone();
    let gen_picture = config.gen_picture;
    let data = config.data.clone();

    let mut trainer = Trainer::from_config(config, pool.dim(), rng)?
        .with_instrumentation(MetricsLog::create(&output_dir.join("metrics.jsonl"))?);

    if let DataSource::Ring(ring) = &data {
        let coverage = File::create(output_dir.join("output.txt"))?;
        trainer = trainer.with_instrumentation(ModeCoverage::new(ring.centers(), BufWriter::new(coverage)));
        if gen_picture {
            trainer = trainer.with_instrumentation(
                ScatterPlot::new(&output_dir).with_centers(ring.centers(), DEFAULT_CAPTURE_RADIUS),
            );
        }
    }
    if let (true, Some((width, height))) = (gen_picture, loaded.image_size) {
        trainer = trainer.with_instrumentation(ImageGrid::new(&output_dir, width, height));
    }

    let history = trainer.fit(&mut pool)?;
    if let Some(last) = history.last() {
        info!(
            "finished after {} epochs: G loss {:.5}, D loss {:.5}",
            last.epoch, last.generator_loss, last.discriminator_loss
        );
    }
    Ok(())
}
