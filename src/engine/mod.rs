//! The contract the harness uses to drive a quantized classifier, and a concrete
//! INT8 engine that satisfies it.

mod arena;
mod quantized;

pub use arena::Arena;
pub use quantized::QuantizedEngine;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::buffer::{BufferView, BufferViewMut};
use crate::network::ModelError;
use crate::quantization::QuantParams;

/// Errors raised by an [`InferenceEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is not initialized")]
    NotInitialized,
    #[error("engine is already initialized")]
    AlreadyInitialized,
    #[error("failed to read model '{}': {source}", path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("arena exhausted reserving {what}: {requested} bytes requested, {available} available")]
    ArenaExhausted {
        what: &'static str,
        requested: usize,
        available: usize,
    },
    #[error("network produced {produced} values but the output buffer holds {capacity}")]
    OutputTooLarge { produced: usize, capacity: usize },
    #[error("engine failure {code}: {message}")]
    Failed { code: i32, message: String },
}

impl EngineError {
    /// Stable numeric code used in one-line user reports.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::NotInitialized => 1,
            EngineError::AlreadyInitialized => 2,
            EngineError::ModelLoad { .. } => 3,
            EngineError::Model(_) => 4,
            EngineError::ArenaExhausted { .. } => 5,
            EngineError::OutputTooLarge { .. } => 6,
            EngineError::Failed { code, .. } => *code,
        }
    }
}

/// A quantized classifier that owns its weights, working memory, and INT8 I/O buffers.
///
/// `init` must succeed before anything else is meaningful. Buffers and quantization
/// parameters are fixed from then on. `invoke` takes `&mut self`, so one engine can
/// never run two forward passes at once.
pub trait InferenceEngine {
    /// Allocates working memory and loads the model. Valid exactly once.
    fn init(&mut self) -> Result<(), EngineError>;

    /// The input buffer, or `None` if it is unavailable.
    fn input_buffer(&mut self) -> Option<BufferViewMut<'_>>;

    /// The output buffer, or `None` if it is unavailable.
    fn output_buffer(&self) -> Option<BufferView<'_>>;

    fn input_params(&self) -> Option<QuantParams>;

    fn output_params(&self) -> Option<QuantParams>;

    /// Runs one forward pass over the input buffer, overwriting the output buffer.
    fn invoke(&mut self) -> Result<(), EngineError>;

    /// Bytes of working memory in use. Diagnostic only.
    fn arena_used_bytes(&self) -> usize;
}
