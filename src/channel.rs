//! Serial channel boundary
//!
//! The core never configures a port: baud rate, parity and friends belong
//! to the settings/UI layer. All the streaming protocol requires is "open
//! and writable", captured by [`SerialChannel`].

use std::io::{self, Write};

/// The collaborator the streaming protocol writes to
pub trait SerialChannel {
    /// Whether the device is ready to accept bytes
    fn is_open(&self) -> bool;

    /// Write the whole buffer to the device
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Push any buffered bytes out to the device
    fn flush(&mut self) -> io::Result<()>;
}

/// Adapter making any [`io::Write`] handle a [`SerialChannel`].
///
/// A platform serial-port handle implements `Write`, so the configured port
/// plugs in here; so does a file or an in-memory buffer for dry runs. The
/// handle's existence is its openness; close by dropping.
#[derive(Debug)]
pub struct IoChannel<W> {
    writer: W,
}

impl<W: Write> IoChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Take the wrapped handle back
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SerialChannel for IoChannel<W> {
    fn is_open(&self) -> bool {
        true
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
