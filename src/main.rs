//! Interactive INT8 MNIST harness.
//!
//! Type `0`-`9` to classify a sample, `a` to classify all of them, `p` to print the
//! selected one, `h` for help.

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use digitprobe::config::Config;
use digitprobe::dispatcher::Dispatcher;
use digitprobe::io::StdinSource;
use digitprobe::logging::init_logging;
use digitprobe::samples::SampleStore;
use digitprobe::startup;

/// Classify fixed MNIST samples with an INT8 quantized model.
#[derive(Parser, Debug)]
#[command(name = "digitprobe", version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model file (DPQM format); defaults to a template model built from the samples
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Engine working-memory budget in bytes
    #[arg(long)]
    arena_bytes: Option<usize>,

    /// Pause between samples of the automatic test, in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Maximum wait per input poll, in milliseconds
    #[arg(long)]
    poll_timeout_ms: Option<u64>,

    /// MNIST IDX image file to pick samples from (requires --labels)
    #[arg(long)]
    images: Option<PathBuf>,

    /// MNIST IDX label file, optionally gzip-compressed (requires --images)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Exit with status 1 on a fatal startup error instead of halting
    #[arg(long)]
    exit_on_fatal: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if self.model.is_some() {
            config.model = self.model;
        }
        if let Some(arena_bytes) = self.arena_bytes {
            config.arena_bytes = arena_bytes;
        }
        if let Some(pacing_ms) = self.pacing_ms {
            config.pacing_ms = pacing_ms;
        }
        if let Some(poll_timeout_ms) = self.poll_timeout_ms {
            config.poll_timeout_ms = poll_timeout_ms;
        }
        if self.images.is_some() {
            config.images = self.images;
        }
        if self.labels.is_some() {
            config.labels = self.labels;
        }
        if self.exit_on_fatal {
            config.halt_on_fatal = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let config = cli.into_config().context("loading configuration")?;

    let store = match (&config.images, &config.labels) {
        (Some(images), Some(labels)) => {
            SampleStore::from_idx(images, labels).context("loading MNIST samples")?
        }
        _ => SampleStore::builtin(),
    };

    let mut out = io::stdout();
    let engine = startup::build_engine(&config, &store);
    let pipeline = match startup::start(engine, &mut out) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "fatal startup error");
            if config.halt_on_fatal {
                startup::halt();
            }
            process::exit(1);
        }
    };
    startup::write_ready(&mut out)?;

    let mut source = StdinSource::spawn().context("starting stdin reader")?;
    let mut dispatcher = Dispatcher::new(pipeline, store, out)
        .with_pacing(config.pacing())
        .with_poll_timeout(config.poll_timeout());
    dispatcher.run(&mut source)?;
    Ok(())
}
