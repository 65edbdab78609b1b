//! Custom error types for the application.
//!
//! This module defines the primary error type, `ScanError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different failure modes of an acquisition
//! run, from configuration problems over motion-protocol faults to capture
//! failures.
//!
//! Every variant is unrecoverable at the point of occurrence: there is no
//! automatic retry anywhere in the acquisition loop. Errors surface to the
//! operator and terminate the run; tiles already written stay on disk.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, ScanError>;

/// Application error type.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Error from the `config` crate while loading or parsing settings.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Semantically invalid configuration that parsed fine.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Invalid objective/overlap/travel parameters. Detected before any
    /// motion occurs.
    #[error("Invalid scan plan: {0}")]
    Plan(String),

    /// The motion protocol session could not be established.
    #[error("Failed to connect to motion controller at {addr}")]
    Connection {
        /// Controller endpoint that was dialed.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on the established motion protocol session.
    #[error("Motion controller I/O error: {0}")]
    Protocol(#[source] std::io::Error),

    /// No acknowledgment observed within the configured window. The stage
    /// position is unknown at this point, so the run must abort.
    #[error("No acknowledgment from motion controller within {0:?}")]
    AckTimeout(Duration),

    /// The controller closed the connection mid-session.
    #[error("Motion controller closed the connection")]
    ConnectionClosed,

    /// A command was issued on a closed client.
    #[error("Motion controller is not connected")]
    NotConnected,

    /// Camera driver fault outside of a per-tile capture.
    #[error("Camera error: {0}")]
    Camera(String),

    /// A per-tile capture failed. Propagated rather than skipped, so a
    /// mosaic never ends up with an undetected gap.
    #[error("Capture failed for '{path}': {reason}")]
    Capture {
        /// Output path of the failed tile.
        path: PathBuf,
        /// Driver-reported reason.
        reason: String,
    },

    /// Output directory creation failure.
    #[error("Failed to create output directory '{path}'")]
    Output {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::Camera("sensor offline".to_string());
        assert_eq!(err.to_string(), "Camera error: sensor offline");
    }

    #[test]
    fn test_ack_timeout_display() {
        let err = ScanError::AckTimeout(Duration::from_secs(10));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_capture_error_carries_path() {
        let err = ScanError::Capture {
            path: PathBuf::from("out/r001_c002.jpg"),
            reason: "sensor fault".into(),
        };
        assert!(err.to_string().contains("r001_c002.jpg"));
    }
}
