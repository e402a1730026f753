/// INT8 quantized layer implementations.
mod layers_i8;
/// Binary model file encoding and decoding.
mod format;
/// Template-matching classifier built from a sample table.
mod template;

pub use format::{ModelError, ModelReader, ModelWriter, MODEL_MAGIC, MODEL_VERSION};
pub use layers_i8::*;

use std::fmt;
use std::mem;

use crate::quantization::QuantParams;
use crate::tensor::{Shape, TensorI8};

/// Identifies the type of a quantized layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Conv2d,
    Linear,
    MaxPool2d,
    ReLu,
    Flatten,
}

impl LayerType {
    /// Tag byte identifying the layer in a model file.
    pub fn tag(&self) -> u8 {
        match self {
            LayerType::Conv2d => 1,
            LayerType::Linear => 2,
            LayerType::ReLu => 3,
            LayerType::MaxPool2d => 4,
            LayerType::Flatten => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(LayerType::Conv2d),
            2 => Some(LayerType::Linear),
            3 => Some(LayerType::ReLu),
            4 => Some(LayerType::MaxPool2d),
            5 => Some(LayerType::Flatten),
            _ => None,
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerType::Conv2d => write!(f, "Conv2d"),
            LayerType::Linear => write!(f, "Linear"),
            LayerType::MaxPool2d => write!(f, "MaxPool2d"),
            LayerType::ReLu => write!(f, "ReLu"),
            LayerType::Flatten => write!(f, "Flatten"),
        }
    }
}

/// Trait for INT8 quantized layers.
///
/// A layer validates the shape it is fed, performs forward inference in INT8 arithmetic
/// into a caller-provided output tensor, and reports the quantization parameters of that
/// output.
pub trait QuantizedLayer {
    fn layer_type(&self) -> LayerType;

    /// Output shape for `input`, or a description of why the input is not accepted.
    fn output_shape(&self, input: Shape) -> Result<Shape, String>;

    fn output_params(&self, input_params: &QuantParams) -> QuantParams;

    /// Runs the layer. `output` must already have the shape returned by
    /// [`QuantizedLayer::output_shape`].
    fn fwd_i8(&self, input: &TensorI8, input_params: &QuantParams, output: &mut TensorI8) -> QuantParams;

    fn weight_memory_bytes(&self) -> usize;

    /// Writes the layer's fields (without the tag byte).
    fn encode(&self, writer: &mut ModelWriter);
}

/// Shapes and memory requirements of a validated network.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Output shape of each layer, in order.
    pub shapes: Vec<Shape>,
    pub output_shape: Shape,
    pub output_params: QuantParams,
    /// Element count of the largest activation, input included.
    pub max_activation: usize,
    pub weight_bytes: usize,
}

/// Two activation tensors that layers alternate between.
pub struct Scratch {
    front: TensorI8,
    back: TensorI8,
}

impl Scratch {
    pub fn new(capacity: usize) -> Self {
        Scratch {
            front: TensorI8::with_capacity(capacity),
            back: TensorI8::with_capacity(capacity),
        }
    }

    pub fn memory_bytes(capacity: usize) -> usize {
        2 * capacity
    }
}

/// An INT8 quantized neural network.
///
/// Holds the expected input shape and input quantization parameters, and a sequence of
/// layers run entirely in INT8 arithmetic.
pub struct Network {
    input_shape: Shape,
    input_params: QuantParams,
    layers: Vec<Box<dyn QuantizedLayer>>,
}

impl Network {
    pub fn new(input_shape: Shape, input_params: QuantParams) -> Self {
        Network {
            input_shape,
            input_params,
            layers: Vec::new(),
        }
    }

    pub fn add(&mut self, layer: Box<dyn QuantizedLayer>) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[Box<dyn QuantizedLayer>] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    pub fn input_params(&self) -> QuantParams {
        self.input_params
    }

    /// Walks the layers once, checking that each accepts the previous layer's output.
    pub fn plan(&self) -> Result<Plan, ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::Empty);
        }
        let mut cur = self.input_shape;
        let mut max_activation = cur.checked_len().ok_or(ModelError::DimensionOverflow)?;
        let mut params = self.input_params;
        let mut shapes = Vec::with_capacity(self.layers.len());
        let mut weight_bytes = 0usize;

        for (index, layer) in self.layers.iter().enumerate() {
            cur = layer.output_shape(cur).map_err(|reason| ModelError::InvalidLayer {
                index,
                layer: layer.layer_type(),
                reason,
            })?;
            let len = cur.checked_len().ok_or(ModelError::DimensionOverflow)?;
            max_activation = max_activation.max(len);
            params = layer.output_params(&params);
            weight_bytes = weight_bytes.saturating_add(layer.weight_memory_bytes());
            shapes.push(cur);
        }

        Ok(Plan {
            shapes,
            output_shape: cur,
            output_params: params,
            max_activation,
            weight_bytes,
        })
    }

    /// Runs every layer over `input`. The returned tensor lives in `scratch`.
    pub fn forward<'s>(
        &self,
        input: &[i8],
        scratch: &'s mut Scratch,
    ) -> Result<(&'s TensorI8, QuantParams), ModelError> {
        let expected = self.input_shape.len();
        let input = input.get(..expected).ok_or(ModelError::InputSize {
            expected,
            actual: input.len(),
        })?;
        reshape(&mut scratch.front, self.input_shape)?;
        scratch.front.as_mut_slice().copy_from_slice(input);

        let mut params = self.input_params;
        for (index, layer) in self.layers.iter().enumerate() {
            let shape = layer
                .output_shape(scratch.front.shape())
                .map_err(|reason| ModelError::InvalidLayer {
                    index,
                    layer: layer.layer_type(),
                    reason,
                })?;
            reshape(&mut scratch.back, shape)?;
            params = layer.fwd_i8(&scratch.front, &params, &mut scratch.back);
            mem::swap(&mut scratch.front, &mut scratch.back);
        }
        Ok((&scratch.front, params))
    }
}

fn reshape(tensor: &mut TensorI8, shape: Shape) -> Result<(), ModelError> {
    if tensor.reshape(shape) {
        Ok(())
    } else {
        Err(ModelError::ScratchTooSmall { needed: shape.len() })
    }
}
