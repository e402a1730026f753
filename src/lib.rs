//! An interactive harness that classifies fixed sample digits with an INT8 quantized
//! network and reports per-class scores.
//!
//! Input bytes drive a [`dispatcher::Dispatcher`], which runs samples from a
//! [`samples::SampleStore`] through an [`pipeline::InferencePipeline`]. The pipeline
//! quantizes pixels with the engine's input parameters, invokes any
//! [`engine::InferenceEngine`], and dequantizes the outputs.
//!
//! # Example
//!
//! ```no_run
//! use digitprobe::config::Config;
//! use digitprobe::dispatcher::Dispatcher;
//! use digitprobe::samples::SampleStore;
//! use digitprobe::startup;
//!
//! let mut out = std::io::stdout();
//! let store = SampleStore::builtin();
//! let engine = startup::build_engine(&Config::default(), &store);
//! let pipeline = startup::start(engine, &mut out).unwrap();
//! let mut dispatcher = Dispatcher::new(pipeline, store, out);
//! dispatcher.dispatch(b'7').unwrap();
//! ```

/// Affine INT8 quantization.
pub mod quantization;
/// INT8 activation tensors.
pub mod tensor;
/// Engine-owned buffers and bounds-checked views.
pub mod buffer;
/// Quantized layers, networks, and the model file format.
pub mod network;
/// The inference engine contract and the concrete INT8 engine.
pub mod engine;
/// Sample images and labels.
pub mod samples;
/// Glyph rendering of images.
pub mod render;
/// Quantize, invoke, dequantize.
pub mod pipeline;
/// Byte input and delay primitives.
pub mod io;
/// The command loop.
pub mod dispatcher;
/// Startup diagnostics and fatal halt.
pub mod startup;
pub mod config;
pub mod logging;
