//! The single-threaded command loop: one input byte in, one action out.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::engine::InferenceEngine;
use crate::io::{ByteSource, Delay, Input, ThreadDelay};
use crate::pipeline::InferencePipeline;
use crate::render::render_image;
use crate::samples::SampleStore;

pub const DEFAULT_PACING: Duration = Duration::from_millis(200);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// What a single input byte asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Line terminators.
    Ignore,
    Help,
    /// Render the selected sample as text.
    Print,
    /// Classify every sample in index order.
    AutoTest,
    /// Select a sample and classify it.
    Select(usize),
    Unknown(u8),
}

impl Command {
    /// Total mapping from input bytes to commands. Letters are case-insensitive.
    pub fn from_byte(byte: u8) -> Command {
        match byte {
            b'\r' | b'\n' => Command::Ignore,
            b'h' | b'H' => Command::Help,
            b'p' | b'P' => Command::Print,
            b'a' | b'A' => Command::AutoTest,
            b'0'..=b'9' => Command::Select((byte - b'0') as usize),
            other => Command::Unknown(other),
        }
    }
}

pub fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Commands:")?;
    writeln!(out, "  h         -> help")?;
    writeln!(out, "  0..9      -> run inference on the sample for that digit")?;
    writeln!(out, "  a         -> automatic test (all samples)")?;
    writeln!(out, "  p         -> print the current image (ASCII)")?;
    writeln!(out)
}

/// Owns everything a command needs: the pipeline (and through it the engine), the
/// sample table, the selected index, and the report sink.
pub struct Dispatcher<E, W> {
    pipeline: InferencePipeline<E>,
    store: SampleStore,
    current_index: usize,
    out: W,
    delay: Box<dyn Delay>,
    pacing: Duration,
    poll_timeout: Duration,
}

impl<E: InferenceEngine, W: Write> Dispatcher<E, W> {
    pub fn new(pipeline: InferencePipeline<E>, store: SampleStore, out: W) -> Self {
        Dispatcher {
            current_index: store.default_index(),
            pipeline,
            store,
            out,
            delay: Box::new(ThreadDelay),
            pacing: DEFAULT_PACING,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Pause between samples of an automatic test. Zero disables it.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_delay(mut self, delay: impl Delay + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn pipeline(&self) -> &InferencePipeline<E> {
        &self.pipeline
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_parts(self) -> (InferencePipeline<E>, W) {
        (self.pipeline, self.out)
    }

    /// Polls `source` until it closes, dispatching every byte it yields.
    pub fn run<S: ByteSource>(&mut self, source: &mut S) -> io::Result<()> {
        loop {
            match source.poll(self.poll_timeout) {
                Input::Byte(byte) => {
                    self.dispatch(byte)?;
                }
                Input::Idle => thread::yield_now(),
                Input::Closed => {
                    info!("input closed");
                    return Ok(());
                }
            }
        }
    }

    /// Performs the single action `byte` maps to and returns it.
    pub fn dispatch(&mut self, byte: u8) -> io::Result<Command> {
        let command = Command::from_byte(byte);
        match command {
            Command::Ignore => return Ok(command),
            Command::Help => write_help(&mut self.out)?,
            Command::Print => self.print_current()?,
            Command::AutoTest => self.auto_test()?,
            Command::Select(index) => self.select(index)?,
            Command::Unknown(b) => {
                debug!(byte = b, "unknown command");
                writeln!(
                    self.out,
                    "\nUnknown command '{}' (0x{:02x}). Type 'h' for help.",
                    char::from(b).escape_default(),
                    b
                )?;
            }
        }
        self.out.flush()?;
        Ok(command)
    }

    fn print_current(&mut self) -> io::Result<()> {
        // `current_index` always addresses a stored sample.
        if let Some(sample) = self.store.get(self.current_index) {
            writeln!(
                self.out,
                "\nCurrent image (idx={}, label={}):",
                sample.index, sample.label
            )?;
            write!(self.out, "{}", render_image(sample.image))?;
        }
        Ok(())
    }

    fn select(&mut self, index: usize) -> io::Result<()> {
        if index >= self.store.len() {
            return writeln!(
                self.out,
                "\nNo sample at index {} (the table holds {}).",
                index,
                self.store.len()
            );
        }
        self.current_index = index;
        let label = self.store.get(index).map_or(0, |s| s.label);
        writeln!(self.out, "\n--- Running idx={} (label={}) ---", index, label)?;
        self.classify(index).map(|_| ())
    }

    fn auto_test(&mut self) -> io::Result<()> {
        let total = self.store.len();
        writeln!(self.out, "\nAutomatic test 0..{}", total.saturating_sub(1))?;
        let mut correct = 0;
        for index in 0..total {
            let label = self.store.get(index).map_or(0, |s| s.label);
            writeln!(self.out, "\n--- Test idx={} (label={}) ---", index, label)?;
            if self.classify(index)? {
                correct += 1;
            }
            self.out.flush()?;
            if index + 1 < total {
                self.delay.delay(self.pacing);
            }
        }
        info!(correct, total, "automatic test finished");
        writeln!(self.out, "\nAutomatic test: {}/{} correct", correct, total)
    }

    /// Runs the pipeline on sample `index` and writes its report. Returns whether
    /// the prediction matched the label.
    fn classify(&mut self, index: usize) -> io::Result<bool> {
        let Some(sample) = self.store.get(index) else {
            return Ok(false);
        };
        match self.pipeline.run(sample.image, sample.label) {
            Ok(result) => {
                write!(self.out, "\n{}", result)?;
                Ok(result.is_correct())
            }
            Err(e) => {
                writeln!(self.out, "Error: {}", e)?;
                Ok(false)
            }
        }
    }
}
