//! One end-to-end classification: quantize the image, invoke the engine, and turn
//! its INT8 outputs back into scores.

use std::fmt;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::InferenceEngine;
use crate::quantization::{dequantize, quantize, QuantParams};
use crate::samples::{Image, Label, IMAGE_LEN, NUM_CLASSES};

/// Which of the engine's buffers a [`PipelineError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Input,
    Output,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Input => write!(f, "input"),
            BufferKind::Output => write!(f, "output"),
        }
    }
}

/// Per-run failures. None of them affect later runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("{buffer} buffer holds {actual} bytes, at least {required} required")]
    BufferTooSmall {
        buffer: BufferKind,
        required: usize,
        actual: usize,
    },
    #[error("{0} buffer unavailable")]
    BufferUnavailable(BufferKind),
    #[error("invoke failed: {0}")]
    InvokeFailed(i32),
}

/// Outcome of one classification.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub expected: Label,
    pub predicted: usize,
    /// Raw engine outputs, one per class.
    pub quantized: [i8; NUM_CLASSES],
    /// `quantized` mapped back to real values with the output parameters.
    pub scores: [f32; NUM_CLASSES],
}

impl InferenceResult {
    pub fn is_correct(&self) -> bool {
        self.predicted == self.expected as usize
    }
}

/// The report block: expected/predicted line followed by one line per class.
impl fmt::Display for InferenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Expected label: {} | Predicted: {}", self.expected, self.predicted)?;
        for (c, (q, y)) in self.quantized.iter().zip(self.scores.iter()).enumerate() {
            writeln!(f, "c{}: q={} y~={:.6}", c, q, y)?;
        }
        Ok(())
    }
}

/// Index of the first maximum. Returns 0 for an empty slice.
pub fn argmax(values: &[i8]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Runs images through an initialized [`InferenceEngine`].
pub struct InferencePipeline<E> {
    engine: E,
    input_params: QuantParams,
    output_params: QuantParams,
}

impl<E: InferenceEngine> InferencePipeline<E> {
    pub fn new(engine: E, input_params: QuantParams, output_params: QuantParams) -> Self {
        InferencePipeline {
            engine,
            input_params,
            output_params,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn input_params(&self) -> QuantParams {
        self.input_params
    }

    pub fn output_params(&self) -> QuantParams {
        self.output_params
    }

    /// Classifies `image`. Buffer capacities are checked before anything is written,
    /// so a too-small buffer never reaches the engine.
    pub fn run(&mut self, image: &Image, expected: Label) -> Result<InferenceResult, PipelineError> {
        let input_capacity = self
            .engine
            .input_buffer()
            .ok_or(PipelineError::BufferUnavailable(BufferKind::Input))?
            .capacity();
        if input_capacity < IMAGE_LEN {
            return Err(PipelineError::BufferTooSmall {
                buffer: BufferKind::Input,
                required: IMAGE_LEN,
                actual: input_capacity,
            });
        }
        let output_capacity = self
            .engine
            .output_buffer()
            .ok_or(PipelineError::BufferUnavailable(BufferKind::Output))?
            .capacity();
        if output_capacity < NUM_CLASSES {
            return Err(PipelineError::BufferTooSmall {
                buffer: BufferKind::Output,
                required: NUM_CLASSES,
                actual: output_capacity,
            });
        }

        {
            let mut input = self
                .engine
                .input_buffer()
                .ok_or(PipelineError::BufferUnavailable(BufferKind::Input))?;
            let dst = input.prefix_mut(IMAGE_LEN).ok_or(PipelineError::BufferTooSmall {
                buffer: BufferKind::Input,
                required: IMAGE_LEN,
                actual: input_capacity,
            })?;
            for (q, &p) in dst.iter_mut().zip(image.iter()) {
                *q = quantize(p as f32 / 255.0, &self.input_params);
            }
        }

        let start = Instant::now();
        if let Err(e) = self.engine.invoke() {
            warn!(error = %e, code = e.code(), "invoke failed");
            return Err(PipelineError::InvokeFailed(e.code()));
        }
        let elapsed = start.elapsed();

        let output = self
            .engine
            .output_buffer()
            .ok_or(PipelineError::BufferUnavailable(BufferKind::Output))?;
        let raw = output.prefix(NUM_CLASSES).ok_or(PipelineError::BufferTooSmall {
            buffer: BufferKind::Output,
            required: NUM_CLASSES,
            actual: output.capacity(),
        })?;
        let mut quantized = [0i8; NUM_CLASSES];
        quantized.copy_from_slice(raw);

        let scores = quantized.map(|q| dequantize(q, &self.output_params));
        let predicted = argmax(&quantized);
        debug!(expected, predicted, latency_us = elapsed.as_micros() as u64, "inference complete");

        Ok(InferenceResult {
            expected,
            predicted,
            quantized,
            scores,
        })
    }
}
