//! Line-oriented acknowledgment client for a GRBL-flavoured controller.
//!
//! Protocol overview:
//! - One persistent TCP session to the controller's control port.
//! - Every outbound line is CRLF-terminated.
//! - Every command elicits exactly one acknowledgment containing the
//!   literal token `ok`. The controller may emit diagnostic text around it;
//!   that text is tolerated, never parsed.
//! - On connect, a bare line terminator is written and the stream drained
//!   until the first `ok`, which flushes any boot banner and confirms the
//!   controller is ready.
//!
//! The acknowledgment wait is bounded: no `ok` within the configured window
//! aborts with [`ScanError::AckTimeout`]. An unacknowledged move leaves the
//! stage position unknown, so the command is never re-sent; delivery is
//! at-most-once and ordering follows the single sequential stream.

use crate::error::{AppResult, ScanError};
use crate::motion::MotionController;
use log::{debug, info};
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::{Duration, Instant};

const ACK_TOKEN: &[u8; 2] = b"ok";

/// Blocking motion protocol client over TCP.
#[derive(Debug)]
pub struct GrblClient {
    stream: Option<TcpStream>,
    ack_timeout: Duration,
    addr: String,
}

impl GrblClient {
    /// Connect eagerly and perform the readiness handshake.
    ///
    /// # Errors
    /// Connection failure is fatal for the run; no retry is attempted.
    pub fn connect(host: &str, port: u16, ack_timeout: Duration) -> AppResult<Self> {
        let addr = format!("{host}:{port}");
        info!("Connecting to motion controller at {addr}");
        let stream = TcpStream::connect(&addr).map_err(|source| ScanError::Connection {
            addr: addr.clone(),
            source,
        })?;
        let mut client = Self {
            stream: Some(stream),
            ack_timeout,
            addr,
        };
        // Wake the controller and drain its boot banner.
        client.write_line("")?;
        client.wait_ack()?;
        info!("Motion controller at {} ready", client.addr);
        Ok(client)
    }

    fn write_line(&mut self, command: &str) -> AppResult<()> {
        let stream = self.stream.as_mut().ok_or(ScanError::NotConnected)?;
        stream
            .write_all(format!("{command}\r\n").as_bytes())
            .map_err(ScanError::Protocol)?;
        Ok(())
    }

    /// Block until the ack token appears in the incoming stream.
    fn wait_ack(&mut self) -> AppResult<()> {
        let stream = self.stream.as_mut().ok_or(ScanError::NotConnected)?;
        let deadline = Instant::now() + self.ack_timeout;
        let mut buf = [0u8; 256];
        let mut prev = 0u8;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ScanError::AckTimeout(self.ack_timeout));
            }
            stream
                .set_read_timeout(Some(remaining))
                .map_err(ScanError::Protocol)?;
            match stream.read(&mut buf) {
                Ok(0) => return Err(ScanError::ConnectionClosed),
                Ok(n) => {
                    if scan_for_ack(&mut prev, &buf[..n]) {
                        return Ok(());
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    // Deadline is re-checked at the top of the loop.
                }
                Err(e) => return Err(ScanError::Protocol(e)),
            }
        }
    }
}

/// Scan a chunk for the ack token, carrying the last byte across chunk
/// boundaries so a token split over two reads is still found.
fn scan_for_ack(prev: &mut u8, chunk: &[u8]) -> bool {
    for &byte in chunk {
        if *prev == ACK_TOKEN[0] && byte == ACK_TOKEN[1] {
            return true;
        }
        *prev = byte;
    }
    false
}

impl MotionController for GrblClient {
    fn send(&mut self, command: &str) -> AppResult<()> {
        debug!("-> {command}");
        self.write_line(command)?;
        self.wait_ack()?;
        debug!("<- ok");
        Ok(())
    }

    fn close(&mut self) -> AppResult<()> {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            info!("Motion controller session at {} closed", self.addr);
        }
        Ok(())
    }
}

impl Drop for GrblClient {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
