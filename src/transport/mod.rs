//! # Printer Transport Layer
//!
//! A [`Sink`] buffers command bytes and flushes them to the printer with a
//! settling delay proportional to the payload:
//!
//! ```text
//! delay_ms = extra_ms + buffered_bytes / 16
//! ```
//!
//! ## Available Sinks
//!
//! - [`device`]: character device or file (serial, USB, RFCOMM)
//! - [`MemorySink`]: in-memory recorder, no delays
//!
//! A sink serves one print job at a time. Callers running several jobs
//! against one printer must serialize them.

pub mod device;

use std::time::Duration;

use crate::error::{BoletaError, Result};

pub use device::DeviceSink;

/// Buffered byte output to a printer.
pub trait Sink {
    /// Append bytes to the pending buffer.
    fn write(&mut self, bytes: &[u8]);

    /// Flush the pending buffer, then block for the pacing delay.
    ///
    /// Fails when the sink is not connected.
    fn send(&mut self, extra_delay_ms: u64) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Release the connection. Later sends fail.
    fn disconnect(&mut self);
}

/// Time the printer needs to absorb `len` bytes, plus `extra_ms`.
pub fn pacing_delay(extra_ms: u64, len: usize) -> Duration {
    Duration::from_millis(extra_ms + (len / 16) as u64)
}

pub(crate) fn not_connected() -> BoletaError {
    BoletaError::Connection("Unable to send data to device.".into())
}

/// Records everything sent, in flush order.
#[derive(Debug, Clone)]
pub struct MemorySink {
    connected: bool,
    pending: Vec<u8>,
    sent: Vec<u8>,
    flushes: Vec<(usize, Duration)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            connected: true,
            pending: Vec::new(),
            sent: Vec::new(),
            flushes: Vec::new(),
        }
    }

    /// A sink that was never connected
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::new()
        }
    }

    /// Bytes flushed so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Bytes written but not yet flushed
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Size and pacing delay of each flush
    pub fn flushes(&self) -> &[(usize, Duration)] {
        &self.flushes
    }

    pub fn into_sent(self) -> Vec<u8> {
        self.sent
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for MemorySink {
    fn write(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    fn send(&mut self, extra_delay_ms: u64) -> Result<()> {
        if !self.connected {
            return Err(not_connected());
        }
        let len = self.pending.len();
        self.flushes.push((len, pacing_delay(extra_delay_ms, len)));
        self.sent.append(&mut self.pending);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacing_delay() {
        assert_eq!(pacing_delay(0, 15), Duration::ZERO);
        assert_eq!(pacing_delay(0, 16), Duration::from_millis(1));
        assert_eq!(pacing_delay(100, 3200), Duration::from_millis(300));
    }

    #[test]
    fn test_memory_sink_buffers_until_send() {
        let mut sink = MemorySink::new();
        sink.write(&[1, 2, 3]);
        assert!(sink.sent().is_empty());
        assert_eq!(sink.pending(), &[1, 2, 3]);

        sink.send(100).unwrap();
        assert_eq!(sink.sent(), &[1, 2, 3]);
        assert!(sink.pending().is_empty());
        assert_eq!(sink.flushes(), &[(3, Duration::from_millis(100))]);
    }

    #[test]
    fn test_send_when_disconnected_fails() {
        let mut sink = MemorySink::new();
        sink.disconnect();
        sink.write(&[1]);
        let err = sink.send(0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Connection error: Unable to send data to device."
        );
        assert!(!MemorySink::disconnected().is_connected());
    }
}
