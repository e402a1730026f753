#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use digitprobe::buffer::{BufferView, BufferViewMut, QuantizedBuffer};
use digitprobe::engine::{EngineError, InferenceEngine};
use digitprobe::io::{ByteSource, Delay, Input};
use digitprobe::network::Network;
use digitprobe::quantization::{quantize, QuantParams};
use digitprobe::samples::{SampleStore, IMAGE_LEN, NUM_CLASSES};

/// Parameters used by the stub scenarios.
pub fn stub_input_params() -> QuantParams {
    QuantParams::new(0.0078125, -128).unwrap()
}

pub fn stub_output_params() -> QuantParams {
    QuantParams::new(0.00390625, -10).unwrap()
}

/// Output written by the stub for every invocation: class 7 stands out.
pub const SEVEN_HOT: [i8; NUM_CLASSES] = [-10, -10, -10, -10, -10, -10, -10, 90, -10, -10];

/// Scriptable engine that records the input buffer of every invocation.
pub struct StubEngine {
    pub input: QuantizedBuffer,
    pub output: QuantizedBuffer,
    pub input_params: QuantParams,
    pub output_params: QuantParams,
    pub response: Vec<i8>,
    pub fail_init: bool,
    pub fail_invoke: Option<i32>,
    pub buffers_available: bool,
    pub init_calls: usize,
    pub invocations: Vec<Vec<i8>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::with_capacities(IMAGE_LEN, NUM_CLASSES)
    }

    pub fn with_capacities(input: usize, output: usize) -> Self {
        StubEngine {
            input: QuantizedBuffer::new(input),
            output: QuantizedBuffer::new(output),
            input_params: stub_input_params(),
            output_params: stub_output_params(),
            response: SEVEN_HOT.to_vec(),
            fail_init: false,
            fail_invoke: None,
            buffers_available: true,
            init_calls: 0,
            invocations: Vec::new(),
        }
    }

    pub fn respond_with(mut self, response: &[i8]) -> Self {
        self.response = response.to_vec();
        self
    }
}

impl InferenceEngine for StubEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(EngineError::Failed {
                code: -7,
                message: "arena allocation failed".into(),
            });
        }
        Ok(())
    }

    fn input_buffer(&mut self) -> Option<BufferViewMut<'_>> {
        if self.buffers_available {
            Some(self.input.view_mut())
        } else {
            None
        }
    }

    fn output_buffer(&self) -> Option<BufferView<'_>> {
        if self.buffers_available {
            Some(self.output.view())
        } else {
            None
        }
    }

    fn input_params(&self) -> Option<QuantParams> {
        Some(self.input_params)
    }

    fn output_params(&self) -> Option<QuantParams> {
        Some(self.output_params)
    }

    fn invoke(&mut self) -> Result<(), EngineError> {
        self.invocations.push(self.input.as_slice().to_vec());
        if let Some(code) = self.fail_invoke {
            return Err(EngineError::Failed {
                code,
                message: "forward pass aborted".into(),
            });
        }
        let n = self.response.len().min(self.output.capacity());
        self.output.as_mut_slice()[..n].copy_from_slice(&self.response[..n]);
        Ok(())
    }

    fn arena_used_bytes(&self) -> usize {
        4096
    }
}

/// Byte source replaying a fixed script, then reporting `Closed`.
pub struct ScriptedSource {
    script: VecDeque<Input>,
    pub polls: usize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Input>) -> Self {
        ScriptedSource {
            script: script.into(),
            polls: 0,
        }
    }

    pub fn bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.iter().map(|&b| Input::Byte(b)).collect())
    }
}

impl ByteSource for ScriptedSource {
    fn poll(&mut self, _timeout: Duration) -> Input {
        self.polls += 1;
        self.script.pop_front().unwrap_or(Input::Closed)
    }
}

/// Delay that records requested durations instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    pub calls: Rc<RefCell<Vec<Duration>>>,
}

impl Delay for RecordingDelay {
    fn delay(&mut self, duration: Duration) {
        self.calls.borrow_mut().push(duration);
    }
}

/// The input buffer contents the pipeline should produce for `pixels`.
pub fn expected_input(pixels: &[u8], params: &QuantParams) -> Vec<i8> {
    pixels.iter().map(|&p| quantize(p as f32 / 255.0, params)).collect()
}

pub fn template_input_params() -> QuantParams {
    QuantParams::PIXEL
}

/// The library's template model over the built-in digits.
pub fn template_network() -> Network {
    Network::template(&SampleStore::builtin())
}
