//! Byte channels for the console instructions

use std::io::{self, ErrorKind, Read, Write};

/// Source of input bytes
pub trait InputChannel {
    /// Next byte, or `None` once the stream is exhausted
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Sink for output bytes
///
/// Each byte must be visible to the consumer by the time
/// `write_byte` returns.
pub trait OutputChannel {
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;
}

/// Input from any reader
pub struct ReadChannel<R: Read> {
    inner: R,
}

impl<R: Read> ReadChannel<R> {
    pub fn new(inner: R) -> Self {
        ReadChannel { inner }
    }
}

impl<R: Read> InputChannel for ReadChannel<R> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Output to any writer, flushed per byte
pub struct WriteChannel<W: Write> {
    inner: W,
}

impl<W: Write> WriteChannel<W> {
    pub fn new(inner: W) -> Self {
        WriteChannel { inner }
    }
}

impl<W: Write> OutputChannel for WriteChannel<W> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])?;
        self.inner.flush()
    }
}

/// Input that is always at end of stream
#[derive(Default)]
pub struct NoInput;

impl InputChannel for NoInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }
}
