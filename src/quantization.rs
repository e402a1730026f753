use std::fmt;

use thiserror::Error;

/// Errors raised when constructing quantization parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantError {
    #[error("scale must be finite and positive, got {0}")]
    InvalidScale(f32),
    #[error("zero point {0} outside [-128, 127]")]
    InvalidZeroPoint(i32),
}

/// Parameters for affine quantization: `real_value = scale * (quantized_value - zero_point)`.
///
/// The scale is always finite and strictly positive, so dividing by it never degenerates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    scale: f32,
    zero_point: i32,
}

impl QuantParams {
    /// Maps intensities `p / 255` in `[0, 1]` onto the full `i8` range.
    pub const PIXEL: QuantParams = QuantParams {
        scale: 1.0 / 255.0,
        zero_point: -128,
    };

    pub fn new(scale: f32, zero_point: i32) -> Result<Self, QuantError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(QuantError::InvalidScale(scale));
        }
        if !(i8::MIN as i32..=i8::MAX as i32).contains(&zero_point) {
            return Err(QuantError::InvalidZeroPoint(zero_point));
        }
        Ok(QuantParams { scale, zero_point })
    }

    /// Zero-centred parameters covering `[-max_abs, max_abs]`.
    pub fn symmetric(max_abs: f32) -> Self {
        let scale = if !max_abs.is_finite() || max_abs < 1e-10 {
            1.0
        } else {
            max_abs / 127.0
        };
        QuantParams { scale, zero_point: 0 }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn zero_point(&self) -> i32 {
        self.zero_point
    }
}

impl fmt::Display for QuantParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scale={:.6} zp={}", self.scale, self.zero_point)
    }
}

/// Quantize a single value: `round(x / scale) + zero_point`, saturated to `[-128, 127]`.
///
/// Rounding is half-away-from-zero and happens before the zero point is added.
pub fn quantize(x: f32, params: &QuantParams) -> i8 {
    // `as i32` saturates on overflow and maps NaN to 0.
    let q = ((x / params.scale).round() as i32).saturating_add(params.zero_point);
    q.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

/// Dequantize a single value: `(q - zero_point) * scale`.
pub fn dequantize(q: i8, params: &QuantParams) -> f32 {
    (q as i32 - params.zero_point) as f32 * params.scale
}
