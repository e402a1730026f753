//! Character input and timing primitives used by the command loop.

use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::debug;

/// Result of one poll of a [`ByteSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Byte(u8),
    /// Nothing arrived within the timeout.
    Idle,
    /// The source will never produce another byte.
    Closed,
}

/// A non-blocking source of single input bytes.
pub trait ByteSource {
    /// Waits at most `timeout` for the next byte.
    fn poll(&mut self, timeout: Duration) -> Input;
}

/// Reads stdin on a background thread and hands bytes over a channel, so polling
/// never blocks longer than the requested timeout.
pub struct StdinSource {
    rx: Receiver<u8>,
}

impl StdinSource {
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let stdin = io::stdin();
                for byte in stdin.lock().bytes() {
                    match byte {
                        Ok(b) => {
                            if tx.send(b).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "stdin read failed");
                            break;
                        }
                    }
                }
            })?;
        Ok(StdinSource { rx })
    }
}

impl ByteSource for StdinSource {
    fn poll(&mut self, timeout: Duration) -> Input {
        match self.rx.recv_timeout(timeout) {
            Ok(b) => Input::Byte(b),
            Err(RecvTimeoutError::Timeout) => Input::Idle,
            Err(RecvTimeoutError::Disconnected) => Input::Closed,
        }
    }
}

/// Blocking delay used for cosmetic pacing.
pub trait Delay {
    fn delay(&mut self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Skips every delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay(&mut self, _duration: Duration) {}
}
