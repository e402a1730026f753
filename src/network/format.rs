//! Model file layout (all integers little endian):
//!
//! ```text
//! magic "DPQM" | version u32 | input c,h,w u32 | input scale f32, zero point i32
//! layer count u32 | { tag u8, layer fields }*
//! ```

use thiserror::Error;

use super::{
    Conv2dLayerQ, FlattenLayerQ, LayerType, LinearLayerQ, MaxPool2dLayerQ, Network, QuantizedLayer,
    ReLuLayerQ,
};
use crate::quantization::{QuantError, QuantParams};
use crate::tensor::Shape;

pub const MODEL_MAGIC: [u8; 4] = *b"DPQM";
pub const MODEL_VERSION: u32 = 1;

/// Errors raised while decoding, validating, or running a network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("bad magic {0:?}, expected \"DPQM\"")]
    BadMagic([u8; 4]),
    #[error("unsupported model version {0}")]
    UnsupportedVersion(u32),
    #[error("model truncated at byte {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },
    #[error("unknown layer tag {tag} at layer {index}")]
    UnknownLayer { tag: u8, index: usize },
    #[error("invalid quantization parameters: {0}")]
    Params(#[from] QuantError),
    #[error("layer {index} ({layer}): {reason}")]
    InvalidLayer {
        index: usize,
        layer: LayerType,
        reason: String,
    },
    #[error("tensor dimensions overflow")]
    DimensionOverflow,
    #[error("{0} trailing bytes after the last layer")]
    TrailingBytes(usize),
    #[error("model has no layers")]
    Empty,
    #[error("input holds {actual} values, network expects {expected}")]
    InputSize { expected: usize, actual: usize },
    #[error("activation of {needed} values does not fit in scratch memory")]
    ScratchTooSmall { needed: usize },
}

/// Little-endian cursor over an in-memory model file.
pub struct ModelReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ModelReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ModelReader { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ModelError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(ModelError::Truncated {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let out = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ModelError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, ModelError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, ModelError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ModelError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ModelError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_dim(&mut self) -> Result<usize, ModelError> {
        usize::try_from(self.read_u32()?).map_err(|_| ModelError::DimensionOverflow)
    }

    pub fn read_params(&mut self) -> Result<QuantParams, ModelError> {
        let scale = self.read_f32()?;
        let zero_point = self.read_i32()?;
        Ok(QuantParams::new(scale, zero_point)?)
    }

    pub fn read_i8s(&mut self, count: usize) -> Result<Vec<i8>, ModelError> {
        Ok(self.take(count)?.iter().map(|&b| b as i8).collect())
    }

    pub fn read_f32s(&mut self, count: usize) -> Result<Vec<f32>, ModelError> {
        let len = count.checked_mul(4).ok_or(ModelError::DimensionOverflow)?;
        Ok(self
            .take(len)?
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

/// Little-endian builder for a model file.
#[derive(Default)]
pub struct ModelWriter {
    buf: Vec<u8>,
}

impl ModelWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    pub fn put_u32(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn put_i32(&mut self, val: i32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn put_f32(&mut self, val: f32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Dimensions are stored as `u32`; larger values are a programming error upstream
    /// and are saturated so the decoder rejects them.
    pub fn put_dim(&mut self, val: usize) {
        self.put_u32(u32::try_from(val).unwrap_or(u32::MAX));
    }

    pub fn put_params(&mut self, params: &QuantParams) {
        self.put_f32(params.scale());
        self.put_i32(params.zero_point());
    }

    pub fn put_i8s(&mut self, vals: &[i8]) {
        self.buf.extend(vals.iter().map(|&v| v as u8));
    }

    pub fn put_f32s(&mut self, vals: &[f32]) {
        for &v in vals {
            self.put_f32(v);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Network {
    /// Serializes the network into the model file format.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ModelWriter::new();
        w.buf.extend_from_slice(&MODEL_MAGIC);
        w.put_u32(MODEL_VERSION);
        let shape = self.input_shape();
        w.put_dim(shape.c);
        w.put_dim(shape.h);
        w.put_dim(shape.w);
        w.put_params(&self.input_params());
        w.put_dim(self.num_layers());
        for layer in self.layers() {
            w.put_u8(layer.layer_type().tag());
            layer.encode(&mut w);
        }
        w.into_bytes()
    }

    /// Parses a model file. Shapes are not checked here; see [`Network::plan`].
    pub fn decode(bytes: &[u8]) -> Result<Network, ModelError> {
        let mut r = ModelReader::new(bytes);
        let magic: [u8; 4] = r.take_array()?;
        if magic != MODEL_MAGIC {
            return Err(ModelError::BadMagic(magic));
        }
        let version = r.read_u32()?;
        if version != MODEL_VERSION {
            return Err(ModelError::UnsupportedVersion(version));
        }
        let input_shape = Shape::new(r.read_dim()?, r.read_dim()?, r.read_dim()?);
        let input_params = r.read_params()?;
        let count = r.read_dim()?;

        let mut net = Network::new(input_shape, input_params);
        for index in 0..count {
            let tag = r.read_u8()?;
            let layer: Box<dyn QuantizedLayer> = match LayerType::from_tag(tag) {
                Some(LayerType::Conv2d) => Box::new(Conv2dLayerQ::decode(&mut r)?),
                Some(LayerType::Linear) => Box::new(LinearLayerQ::decode(&mut r)?),
                Some(LayerType::ReLu) => Box::new(ReLuLayerQ::new()),
                Some(LayerType::MaxPool2d) => Box::new(MaxPool2dLayerQ::decode(&mut r)?),
                Some(LayerType::Flatten) => Box::new(FlattenLayerQ::new()),
                None => return Err(ModelError::UnknownLayer { tag, index }),
            };
            net.add(layer);
        }
        if r.remaining() > 0 {
            return Err(ModelError::TrailingBytes(r.remaining()));
        }
        Ok(net)
    }
}
