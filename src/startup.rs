//! Engine bring-up, startup diagnostics, and the fatal halt.

use std::io::{self, Write};
use std::thread;

use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::dispatcher::write_help;
use crate::engine::{EngineError, InferenceEngine, QuantizedEngine};
use crate::network::Network;
use crate::pipeline::InferencePipeline;
use crate::samples::SampleStore;

/// Conditions after which no command may be processed.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("engine initialization failed (code {}): {}", .0.code(), .0)]
    EngineInit(#[source] EngineError),
    #[error("{0} unavailable after initialization")]
    Unavailable(&'static str),
    #[error("failed to write diagnostics: {0}")]
    Io(#[from] io::Error),
}

/// The engine for `config`: the configured model file, or a template-matching model built
/// from `store` when none is set.
pub fn build_engine(config: &Config, store: &SampleStore) -> QuantizedEngine {
    match &config.model {
        Some(path) => QuantizedEngine::from_file(path, config.arena_bytes),
        None => {
            info!(samples = store.len(), "no model file configured, using the template model");
            QuantizedEngine::from_bytes(Network::template(store).encode(), config.arena_bytes)
        }
    }
}

/// Initializes `engine`, prints the startup diagnostics to `out`, and wraps the engine
/// in a pipeline. Every fatal condition is reported to `out` once before returning.
pub fn start<E: InferenceEngine, W: Write>(
    mut engine: E,
    out: &mut W,
) -> Result<InferencePipeline<E>, FatalError> {
    writeln!(out, "\n=== digitprobe: INT8 MNIST classifier (interactive) ===")?;

    if let Err(e) = engine.init() {
        let fatal = FatalError::EngineInit(e);
        error!(error = %fatal, "engine initialization failed");
        writeln!(out, "{}", fatal)?;
        return Err(fatal);
    }
    writeln!(out, "Engine initialized")?;
    writeln!(out, "Arena used (bytes): {}", engine.arena_used_bytes())?;

    let in_bytes = engine.input_buffer().map(|b| b.capacity());
    let out_bytes = engine.output_buffer().map(|b| b.capacity());
    let (Some(in_bytes), Some(out_bytes)) = (in_bytes, out_bytes) else {
        return Err(report(out, FatalError::Unavailable("input/output buffer"))?);
    };
    let (Some(in_params), Some(out_params)) = (engine.input_params(), engine.output_params()) else {
        return Err(report(out, FatalError::Unavailable("quantization parameters"))?);
    };

    writeln!(out, "Input bytes: {} | Output bytes: {}", in_bytes, out_bytes)?;
    writeln!(out, "IN:  scale={:.6} zp={}", in_params.scale(), in_params.zero_point())?;
    writeln!(out, "OUT: scale={:.6} zp={}", out_params.scale(), out_params.zero_point())?;
    info!(
        arena_used = engine.arena_used_bytes(),
        in_bytes,
        out_bytes,
        input = %in_params,
        output = %out_params,
        "engine ready"
    );

    Ok(InferencePipeline::new(engine, in_params, out_params))
}

fn report<W: Write>(out: &mut W, fatal: FatalError) -> Result<FatalError, FatalError> {
    error!(error = %fatal, "startup aborted");
    writeln!(out, "Error: {}", fatal)?;
    Ok(fatal)
}

/// Help text plus the ready prompt, printed once before the command loop starts.
pub fn write_ready<W: Write>(out: &mut W) -> io::Result<()> {
    write_help(out)?;
    writeln!(out, "Ready. Type 0..9 to classify a sample, e.g. type 7 and press Enter.")?;
    out.flush()
}

/// Parks the calling thread forever. Used after a fatal startup error so that no
/// further command is processed.
pub fn halt() -> ! {
    loop {
        thread::park();
    }
}
