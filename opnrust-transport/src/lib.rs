//! Transport layer for the OPN-2001 protocol
//!
//! Provides the serial link to the scanner cradle, and an in-memory
//! transport for tests and for replaying captured sessions.

pub mod config;
pub mod error;
pub mod memory;
pub mod serial;

pub use config::SerialConfig;
pub use error::{Error, Result};
pub use memory::MemoryTransport;
pub use serial::SerialTransport;

use std::io::{Read, Write};

/// Byte stream to a scanner
///
/// Reads and writes are blocking; a protocol session does exact-length reads
/// on top of them. Reading or writing while disconnected fails with
/// [`std::io::ErrorKind::NotConnected`].
pub trait Transport: Read + Write + Send {
    /// Open the link
    fn connect(&mut self) -> Result<()>;

    /// Close the link
    fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Port or source description for logs
    fn port_name(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn port_name(&self) -> String {
        (**self).port_name()
    }
}

pub(crate) fn not_connected() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, Error::NotConnected)
}
