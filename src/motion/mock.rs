//! Recording motion controller double for tests.

use crate::error::{AppResult, ScanError};
use crate::motion::MotionController;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Mock controller that records every sent command.
///
/// Clones share state, so a test can hand one clone to the sequencer and
/// keep another to inspect afterwards.
#[derive(Clone, Default)]
pub struct MockController {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    sent: Vec<String>,
    close_count: usize,
    fail_on: Option<usize>,
}

impl MockController {
    /// Create a controller that acknowledges everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `index`-th `send` (zero-based) fail with a protocol error.
    pub fn fail_on(&self, index: usize) {
        self.inner.lock().fail_on = Some(index);
    }

    /// Commands sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.inner.lock().sent.clone()
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.inner.lock().close_count
    }
}

impl MotionController for MockController {
    fn send(&mut self, command: &str) -> AppResult<()> {
        let mut state = self.inner.lock();
        let index = state.sent.len();
        state.sent.push(command.to_string());
        if state.fail_on == Some(index) {
            return Err(ScanError::Protocol(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated controller fault",
            )));
        }
        Ok(())
    }

    fn close(&mut self) -> AppResult<()> {
        self.inner.lock().close_count += 1;
        Ok(())
    }
}
