use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Arena, EngineError, InferenceEngine};
use crate::buffer::{BufferView, BufferViewMut, QuantizedBuffer};
use crate::network::{Network, Plan, Scratch};
use crate::quantization::QuantParams;

enum ModelSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

struct Loaded {
    network: Network,
    plan: Plan,
    scratch: Scratch,
    input: QuantizedBuffer,
    output: QuantizedBuffer,
}

/// An [`InferenceEngine`] that runs a [`Network`] loaded from the model file format.
///
/// All memory is sized and accounted against a fixed [`Arena`] during `init`;
/// `invoke` does not allocate.
pub struct QuantizedEngine {
    source: ModelSource,
    arena: Arena,
    loaded: Option<Loaded>,
}

impl QuantizedEngine {
    pub fn from_file(path: impl AsRef<Path>, arena_bytes: usize) -> Self {
        QuantizedEngine {
            source: ModelSource::File(path.as_ref().to_path_buf()),
            arena: Arena::new(arena_bytes),
            loaded: None,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>, arena_bytes: usize) -> Self {
        QuantizedEngine {
            source: ModelSource::Bytes(bytes),
            arena: Arena::new(arena_bytes),
            loaded: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn network(&self) -> Option<&Network> {
        self.loaded.as_ref().map(|l| &l.network)
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.loaded.as_ref().map(|l| &l.plan)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

impl InferenceEngine for QuantizedEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        if self.loaded.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }

        let file_bytes;
        let bytes: &[u8] = match &self.source {
            ModelSource::File(path) => {
                file_bytes = fs::read(path).map_err(|source| EngineError::ModelLoad {
                    path: path.clone(),
                    source,
                })?;
                &file_bytes
            }
            ModelSource::Bytes(bytes) => bytes,
        };

        let network = Network::decode(bytes)?;
        let plan = network.plan()?;

        let mut arena = Arena::new(self.arena.capacity());
        arena.reserve("weights", plan.weight_bytes)?;
        arena.reserve("input buffer", network.input_shape().len())?;
        arena.reserve("output buffer", plan.output_shape.len())?;
        arena.reserve("activations", Scratch::memory_bytes(plan.max_activation))?;

        for (index, (layer, shape)) in network.layers().iter().zip(&plan.shapes).enumerate() {
            debug!(index, layer = %layer.layer_type(), output = %shape, "layer planned");
        }
        info!(
            layers = network.num_layers(),
            input = %network.input_shape(),
            output = %plan.output_shape,
            arena_used = arena.used(),
            arena_capacity = arena.capacity(),
            "model loaded"
        );

        self.loaded = Some(Loaded {
            input: QuantizedBuffer::new(network.input_shape().len()),
            output: QuantizedBuffer::new(plan.output_shape.len()),
            scratch: Scratch::new(plan.max_activation),
            network,
            plan,
        });
        self.arena = arena;
        Ok(())
    }

    fn input_buffer(&mut self) -> Option<BufferViewMut<'_>> {
        self.loaded.as_mut().map(|l| l.input.view_mut())
    }

    fn output_buffer(&self) -> Option<BufferView<'_>> {
        self.loaded.as_ref().map(|l| l.output.view())
    }

    fn input_params(&self) -> Option<QuantParams> {
        self.loaded.as_ref().map(|l| l.network.input_params())
    }

    fn output_params(&self) -> Option<QuantParams> {
        self.loaded.as_ref().map(|l| l.plan.output_params)
    }

    fn invoke(&mut self) -> Result<(), EngineError> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotInitialized)?;
        let (result, _params) = loaded
            .network
            .forward(loaded.input.as_slice(), &mut loaded.scratch)?;
        let values = result.as_slice();
        let capacity = loaded.output.capacity();
        let dst = loaded
            .output
            .as_mut_slice()
            .get_mut(..values.len())
            .ok_or(EngineError::OutputTooLarge {
                produced: values.len(),
                capacity,
            })?;
        dst.copy_from_slice(values);
        Ok(())
    }

    fn arena_used_bytes(&self) -> usize {
        self.arena.used()
    }
}
