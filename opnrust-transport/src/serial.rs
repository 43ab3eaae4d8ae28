//! Serial transport

use std::io::{self, Read, Write};

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, trace, warn};

use crate::{Transport, config::SerialConfig, error::*, not_connected};

/// Serial transport for the OPN-2001 cradle
pub struct SerialTransport {
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create new serial transport
    pub fn new(config: SerialConfig) -> Self {
        Self { config, port: None }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn port_mut(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or_else(not_connected)
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        self.config.validate()?;

        debug!(
            "Opening {} ({} baud, {:?} parity, {:?} stop bits)...",
            self.config.port, self.config.baud_rate, self.config.parity, self.config.stop_bits
        );

        let port = self.config.builder().open()?;

        // Bytes left over from an earlier session would be taken for a frame header
        port.clear(ClearBuffer::All)?;

        debug!("Opened {}", self.config.port);

        self.port = Some(port);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if self.is_connected() {
            debug!("Closing {}...", self.port_name());
            self.port = None;
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn port_name(&self) -> String {
        self.port
            .as_ref()
            .and_then(|port| port.name())
            .unwrap_or_else(|| self.config.port.clone())
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.port_mut()?.read(buf)?;
        trace!("Received {} bytes: {:02X?}", n, &buf[..n]);
        Ok(n)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        trace!("Sending {} bytes: {:02X?}", buf.len(), buf);
        self.port_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port_mut()?.flush()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Serial transport dropped while still connected");
        }
    }
}
