//! In-memory transport
//!
//! Replays a scripted byte stream as the device side and records what the
//! host writes. Used by the test suites and for replaying captured sessions.

use std::io::{self, Read, Write};

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::{Transport, error::*, not_connected};

/// Transport backed by two buffers
///
/// # Examples
///
/// ```
/// use std::io::{Read, Write};
/// use opnrust_transport::{MemoryTransport, Transport};
///
/// let mut transport = MemoryTransport::with_input(vec![0x01u8, 0x02]);
/// transport.connect().unwrap();
///
/// transport.write_all(&[0xAA]).unwrap();
///
/// let mut buf = [0u8; 2];
/// transport.read_exact(&mut buf).unwrap();
///
/// assert_eq!(buf, [0x01, 0x02]);
/// assert_eq!(transport.written(), &[0xAA]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    input: BytesMut,
    output: BytesMut,
    connected: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that will return `input` to reads
    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        let mut transport = Self::new();
        transport.push_input(input);
        transport
    }

    /// Queue more device-side bytes
    pub fn push_input(&mut self, input: impl AsRef<[u8]>) {
        self.input.extend_from_slice(input.as_ref());
    }

    /// Device-side bytes not read yet
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Everything the host has written
    pub fn written(&self) -> &[u8] {
        &self.output
    }

    /// Take the written bytes, leaving the record empty
    pub fn take_written(&mut self) -> Vec<u8> {
        self.output.split().to_vec()
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn port_name(&self) -> String {
        "memory".to_string()
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.connected {
            return Err(not_connected());
        }

        // An empty input reads as end of stream
        let n = buf.len().min(self.input.len());
        buf[..n].copy_from_slice(&self.input[..n]);
        self.input.advance(n);

        trace!("Replayed {} bytes", n);
        Ok(n)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.connected {
            return Err(not_connected());
        }

        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
