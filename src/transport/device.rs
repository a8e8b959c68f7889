//! # Device Transport
//!
//! Sends data to a printer exposed as a character device: a serial port,
//! a USB printer class device (`/dev/usb/lp0`) or a bound Bluetooth RFCOMM
//! channel (`/dev/rfcomm0`). Regular files work too, which is handy for
//! capturing a job.
//!
//! ## TTY Configuration
//!
//! When the path is a terminal it is switched to raw mode so binary data
//! passes through unmodified:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, etc. off
//! - **No XON/XOFF**: 0x11 and 0x13 appear in raster data
//! - **No output processing**: OPOST off (no CR/LF translation)
//! - **8-bit characters**: CS8, no parity
//! - **Non-canonical mode**: ICANON, ECHO off
//!
//! ## Chunked Writes
//!
//! Large flushes are written in 4096-byte chunks with a short pause in
//! between, then the sink waits for the pacing delay of the whole flush.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use super::{Sink, not_connected, pacing_delay};
use crate::error::{BoletaError, Result};

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Device Sink
///
/// ## Example
///
/// ```no_run
/// use boleta::transport::{DeviceSink, Sink};
///
/// let mut sink = DeviceSink::open("/dev/usb/lp0")?;
/// sink.write(&[0x1B, 0x40]);
/// sink.send(0)?;
///
/// # Ok::<(), boleta::error::BoletaError>(())
/// ```
pub struct DeviceSink {
    file: Option<File>,
    buffer: Vec<u8>,
    chunk_size: usize,
    chunk_delay: Duration,
    pacing: bool,
}

impl DeviceSink {
    /// Open a device or file for writing.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need the lp or dialout group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .write(true)
            .create(!is_device_path(path))
            .truncate(!is_device_path(path))
            .open(path)
            .map_err(|e| {
                BoletaError::Connection(format!("Failed to open {}: {}", path.display(), e))
            })?;

        configure_tty_raw(&file)?;
        info!(device = %path.display(), "printer device opened");

        Ok(Self {
            file: Some(file),
            buffer: Vec::new(),
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
            pacing: true,
        })
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Skip pacing delays, for sinks that are files rather than printers.
    pub fn set_pacing(&mut self, pacing: bool) {
        self.pacing = pacing;
    }

    fn write_chunked(file: &mut File, data: &[u8], chunk_size: usize, delay: Duration) -> io::Result<()> {
        if data.len() <= chunk_size {
            return file.write_all(data);
        }
        for chunk in data.chunks(chunk_size) {
            file.write_all(chunk)?;
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        Ok(())
    }
}

impl Sink for DeviceSink {
    fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn send(&mut self, extra_delay_ms: u64) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(not_connected());
        };

        let len = self.buffer.len();
        Self::write_chunked(file, &self.buffer, self.chunk_size, self.chunk_delay)
            .and_then(|_| file.flush())
            .map_err(|e| BoletaError::Connection(format!("Write failed: {}", e)))?;
        self.buffer.clear();

        let delay = pacing_delay(extra_delay_ms, len);
        debug!(bytes = len, delay_ms = delay.as_millis() as u64, "flushed to device");
        if self.pacing && !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.file.is_some()
    }

    fn disconnect(&mut self) {
        if self.file.take().is_some() {
            info!("printer device closed");
        }
        self.buffer.clear();
    }
}

/// Paths under /dev are opened as-is, everything else may be created.
fn is_device_path(path: &Path) -> bool {
    path.starts_with("/dev")
}

/// Configure a terminal for raw binary output. Non-terminals are left alone.
#[cfg(unix)]
fn configure_tty_raw(file: &File) -> Result<()> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    if unsafe { libc::isatty(fd) } != 1 {
        return Ok(());
    }

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(BoletaError::Connection(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(BoletaError::Connection(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File) -> Result<()> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
