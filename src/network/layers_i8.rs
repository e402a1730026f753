use crate::quantization::{quantize, QuantParams};
use crate::tensor::{Shape, TensorI8};
use super::{LayerType, ModelError, ModelReader, ModelWriter, QuantizedLayer};

/// Requantizes an accumulator into the output domain.
///
/// A single term spans up to `255 * 128` in magnitude; `i64` accumulators hold the sum
/// for any fan-in a model file can describe.
fn requantize(sum: i64, combined_scale: f32, bias: f32, output_params: &QuantParams) -> i8 {
    quantize(sum as f32 * combined_scale + bias, output_params)
}

fn window_output(size: usize, kernel: usize, stride: usize, pad: usize) -> Option<usize> {
    let padded = size.checked_add(pad.checked_mul(2)?)?;
    if kernel == 0 || stride == 0 || padded < kernel {
        return None;
    }
    Some((padded - kernel) / stride + 1)
}

/// INT8 quantized 2D convolution layer.
///
/// Weights are laid out as `[out_channels][in_channels][kernel][kernel]`. Padding
/// positions contribute `input_zero_point`, i.e. zero in the real domain.
pub struct Conv2dLayerQ {
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    pad: usize,
    weights: Vec<i8>,
    weight_params: QuantParams,
    bias: Vec<f32>,
    output_params: QuantParams,
}

impl Conv2dLayerQ {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_channels: usize, out_channels: usize, kernel_size: usize,
        stride: usize, pad: usize,
        weights: Vec<i8>, weight_params: QuantParams,
        bias: Vec<f32>, output_params: QuantParams,
    ) -> Self {
        Conv2dLayerQ {
            in_channels, out_channels, kernel_size, stride, pad,
            weights, weight_params, bias, output_params,
        }
    }

    pub fn decode(r: &mut ModelReader<'_>) -> Result<Self, ModelError> {
        let in_channels = r.read_dim()?;
        let out_channels = r.read_dim()?;
        let kernel_size = r.read_dim()?;
        let stride = r.read_dim()?;
        let pad = r.read_dim()?;
        let weight_params = r.read_params()?;
        let count = out_channels
            .checked_mul(in_channels)
            .and_then(|v| v.checked_mul(kernel_size))
            .and_then(|v| v.checked_mul(kernel_size))
            .ok_or(ModelError::DimensionOverflow)?;
        let weights = r.read_i8s(count)?;
        let bias = r.read_f32s(out_channels)?;
        let output_params = r.read_params()?;
        Ok(Self::new(
            in_channels, out_channels, kernel_size, stride, pad,
            weights, weight_params, bias, output_params,
        ))
    }

    fn weight(&self, oc: usize, ic: usize, kh: usize, kw: usize) -> i64 {
        let k = self.kernel_size;
        self.weights[((oc * self.in_channels + ic) * k + kh) * k + kw] as i64
    }
}

impl QuantizedLayer for Conv2dLayerQ {
    fn layer_type(&self) -> LayerType { LayerType::Conv2d }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        if input.c != self.in_channels {
            return Err(format!("expects {} input channels, got {}", self.in_channels, input.c));
        }
        let expected = self.out_channels * self.in_channels * self.kernel_size * self.kernel_size;
        if self.weights.len() != expected {
            return Err(format!("holds {} weights, expected {}", self.weights.len(), expected));
        }
        if self.bias.len() != self.out_channels {
            return Err(format!("holds {} biases, expected {}", self.bias.len(), self.out_channels));
        }
        let h = window_output(input.h, self.kernel_size, self.stride, self.pad);
        let w = window_output(input.w, self.kernel_size, self.stride, self.pad);
        match (h, w) {
            (Some(h), Some(w)) => Ok(Shape::new(self.out_channels, h, w)),
            _ => Err(format!(
                "kernel {} stride {} pad {} does not fit input {}",
                self.kernel_size, self.stride, self.pad, input
            )),
        }
    }

    fn output_params(&self, _input_params: &QuantParams) -> QuantParams {
        self.output_params
    }

    fn weight_memory_bytes(&self) -> usize {
        self.weights.len() + self.bias.len() * 4
    }

    fn fwd_i8(&self, input: &TensorI8, input_params: &QuantParams, output: &mut TensorI8) -> QuantParams {
        let combined_scale = input_params.scale() * self.weight_params.scale();
        let input_zp = input_params.zero_point() as i64;

        for oc in 0..self.out_channels {
            for oh in 0..output.h {
                for ow in 0..output.w {
                    let mut sum: i64 = 0;
                    for ic in 0..self.in_channels {
                        for kh in 0..self.kernel_size {
                            let ih = (oh * self.stride + kh).wrapping_sub(self.pad);
                            if ih >= input.h {
                                continue;
                            }
                            for kw in 0..self.kernel_size {
                                let iw = (ow * self.stride + kw).wrapping_sub(self.pad);
                                if iw >= input.w {
                                    continue;
                                }
                                let inp = input.get(ic, ih, iw) as i64;
                                sum += (inp - input_zp) * self.weight(oc, ic, kh, kw);
                            }
                        }
                    }
                    output.set(oc, oh, ow, requantize(sum, combined_scale, self.bias[oc], &self.output_params));
                }
            }
        }
        self.output_params
    }

    fn encode(&self, w: &mut ModelWriter) {
        w.put_dim(self.in_channels);
        w.put_dim(self.out_channels);
        w.put_dim(self.kernel_size);
        w.put_dim(self.stride);
        w.put_dim(self.pad);
        w.put_params(&self.weight_params);
        w.put_i8s(&self.weights);
        w.put_f32s(&self.bias);
        w.put_params(&self.output_params);
    }
}

/// INT8 quantized fully-connected (linear) layer.
///
/// Accepts any input whose element count equals `in_features`; the input is read in
/// its flat CHW order.
pub struct LinearLayerQ {
    in_features: usize,
    out_features: usize,
    weights: Vec<i8>,
    weight_params: QuantParams,
    bias: Vec<f32>,
    output_params: QuantParams,
}

impl LinearLayerQ {
    pub fn new(
        in_features: usize, out_features: usize,
        weights: Vec<i8>, weight_params: QuantParams,
        bias: Vec<f32>, output_params: QuantParams,
    ) -> Self {
        LinearLayerQ {
            in_features, out_features,
            weights, weight_params, bias, output_params,
        }
    }

    pub fn decode(r: &mut ModelReader<'_>) -> Result<Self, ModelError> {
        let in_features = r.read_dim()?;
        let out_features = r.read_dim()?;
        let weight_params = r.read_params()?;
        let count = in_features
            .checked_mul(out_features)
            .ok_or(ModelError::DimensionOverflow)?;
        let weights = r.read_i8s(count)?;
        let bias = r.read_f32s(out_features)?;
        let output_params = r.read_params()?;
        Ok(Self::new(in_features, out_features, weights, weight_params, bias, output_params))
    }
}

impl QuantizedLayer for LinearLayerQ {
    fn layer_type(&self) -> LayerType { LayerType::Linear }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        if self.in_features == 0 {
            return Err("has no input features".to_string());
        }
        if input.len() != self.in_features {
            return Err(format!("expects {} input features, got {}", self.in_features, input.len()));
        }
        if self.weights.len() != self.in_features * self.out_features {
            return Err(format!(
                "holds {} weights, expected {}",
                self.weights.len(),
                self.in_features * self.out_features
            ));
        }
        if self.bias.len() != self.out_features {
            return Err(format!("holds {} biases, expected {}", self.bias.len(), self.out_features));
        }
        Ok(Shape::flat(self.out_features))
    }

    fn output_params(&self, _input_params: &QuantParams) -> QuantParams {
        self.output_params
    }

    fn weight_memory_bytes(&self) -> usize {
        self.weights.len() + self.bias.len() * 4
    }

    fn fwd_i8(&self, input: &TensorI8, input_params: &QuantParams, output: &mut TensorI8) -> QuantParams {
        let combined_scale = input_params.scale() * self.weight_params.scale();
        let input_zp = input_params.zero_point() as i64;
        let inputs = input.as_slice();

        for (o, row) in self.weights.chunks_exact(self.in_features).enumerate() {
            let sum: i64 = inputs
                .iter()
                .zip(row.iter())
                .map(|(&inp, &wt)| (inp as i64 - input_zp) * wt as i64)
                .sum();
            output.set(o, 0, 0, requantize(sum, combined_scale, self.bias[o], &self.output_params));
        }
        self.output_params
    }

    fn encode(&self, w: &mut ModelWriter) {
        w.put_dim(self.in_features);
        w.put_dim(self.out_features);
        w.put_params(&self.weight_params);
        w.put_i8s(&self.weights);
        w.put_f32s(&self.bias);
        w.put_params(&self.output_params);
    }
}

/// INT8 quantized ReLU activation layer.
///
/// Real zero maps to the input zero point, so clamping below at it is exact.
#[derive(Default)]
pub struct ReLuLayerQ;

impl ReLuLayerQ {
    pub fn new() -> Self { ReLuLayerQ }
}

impl QuantizedLayer for ReLuLayerQ {
    fn layer_type(&self) -> LayerType { LayerType::ReLu }
    fn weight_memory_bytes(&self) -> usize { 0 }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        Ok(input)
    }

    fn output_params(&self, input_params: &QuantParams) -> QuantParams {
        *input_params
    }

    fn fwd_i8(&self, input: &TensorI8, input_params: &QuantParams, output: &mut TensorI8) -> QuantParams {
        let zp = input_params.zero_point() as i8;
        for (out, &v) in output.as_mut_slice().iter_mut().zip(input.as_slice()) {
            *out = v.max(zp);
        }
        *input_params
    }

    fn encode(&self, _w: &mut ModelWriter) {}
}

/// INT8 quantized 2D max pooling layer. Padding never wins the maximum.
pub struct MaxPool2dLayerQ {
    kernel_size: usize,
    stride: usize,
    pad: usize,
}

impl MaxPool2dLayerQ {
    pub fn new(kernel_size: usize, stride: usize, pad: usize) -> Self {
        MaxPool2dLayerQ { kernel_size, stride, pad }
    }

    pub fn decode(r: &mut ModelReader<'_>) -> Result<Self, ModelError> {
        Ok(Self::new(r.read_dim()?, r.read_dim()?, r.read_dim()?))
    }
}

impl QuantizedLayer for MaxPool2dLayerQ {
    fn layer_type(&self) -> LayerType { LayerType::MaxPool2d }
    fn weight_memory_bytes(&self) -> usize { 0 }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        let h = window_output(input.h, self.kernel_size, self.stride, self.pad);
        let w = window_output(input.w, self.kernel_size, self.stride, self.pad);
        match (h, w) {
            (Some(h), Some(w)) => Ok(Shape::new(input.c, h, w)),
            _ => Err(format!(
                "kernel {} stride {} pad {} does not fit input {}",
                self.kernel_size, self.stride, self.pad, input
            )),
        }
    }

    fn output_params(&self, input_params: &QuantParams) -> QuantParams {
        *input_params
    }

    fn fwd_i8(&self, input: &TensorI8, input_params: &QuantParams, output: &mut TensorI8) -> QuantParams {
        for c in 0..input.c {
            for h in 0..output.h {
                for w in 0..output.w {
                    let mut max_val = i8::MIN;
                    for kh in 0..self.kernel_size {
                        let ih = (h * self.stride + kh).wrapping_sub(self.pad);
                        if ih >= input.h {
                            continue;
                        }
                        for kw in 0..self.kernel_size {
                            let iw = (w * self.stride + kw).wrapping_sub(self.pad);
                            if iw < input.w {
                                max_val = max_val.max(input.get(c, ih, iw));
                            }
                        }
                    }
                    output.set(c, h, w, max_val);
                }
            }
        }
        *input_params
    }

    fn encode(&self, w: &mut ModelWriter) {
        w.put_dim(self.kernel_size);
        w.put_dim(self.stride);
        w.put_dim(self.pad);
    }
}

/// INT8 quantized flatten layer.
#[derive(Default)]
pub struct FlattenLayerQ;

impl FlattenLayerQ {
    pub fn new() -> Self { FlattenLayerQ }
}

impl QuantizedLayer for FlattenLayerQ {
    fn layer_type(&self) -> LayerType { LayerType::Flatten }
    fn weight_memory_bytes(&self) -> usize { 0 }

    fn output_shape(&self, input: Shape) -> Result<Shape, String> {
        Ok(Shape::flat(input.len()))
    }

    fn output_params(&self, input_params: &QuantParams) -> QuantParams {
        *input_params
    }

    fn fwd_i8(&self, input: &TensorI8, input_params: &QuantParams, output: &mut TensorI8) -> QuantParams {
        // CHW storage is already the flattened order.
        output.as_mut_slice().copy_from_slice(input.as_slice());
        *input_params
    }

    fn encode(&self, _w: &mut ModelWriter) {}
}
