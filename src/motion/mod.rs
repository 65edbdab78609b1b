//! Motion control: the controller capability and its implementations.
//!
//! The sequencer only ever talks to [`MotionController`], so the real
//! network client can be swapped for [`mock::MockController`] in tests.

pub mod grbl;
pub mod mock;

pub use grbl::GrblClient;
pub use mock::MockController;

use crate::error::AppResult;

/// Capability interface for the motion controller.
///
/// `send` is synchronous with a built-in acknowledgment wait: it returns
/// only after the controller has confirmed the command, so callers never
/// have more than one command outstanding.
pub trait MotionController {
    /// Send one command line and block until the controller acknowledges.
    fn send(&mut self, command: &str) -> AppResult<()>;

    /// Release the underlying session. Safe to call more than once.
    fn close(&mut self) -> AppResult<()>;
}
