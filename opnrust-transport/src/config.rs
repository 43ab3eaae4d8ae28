//! Serial line configuration

use std::env;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};

use opnrust_core::constants::{self, DEFAULT_READ_TIMEOUT};

use crate::error::{Error, Result};

/// Environment variable naming the serial port
pub const ENV_PORT: &str = "OPN_PORT";

/// Environment variable overriding the baud rate
pub const ENV_BAUD_RATE: &str = "OPN_BAUD_RATE";

/// Serial port settings
///
/// Defaults match the OPN-2001 cradle: 9600 baud, 8 data bits, odd parity,
/// one stop bit, no flow control.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use opnrust_transport::SerialConfig;
///
/// let config = SerialConfig::new("/dev/ttyUSB0")
///     .with_baud_rate(19200)
///     .with_timeout(Duration::from_secs(2));
///
/// assert_eq!(config.baud_rate, 19200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path (`/dev/ttyUSB0`, `COM4`, ...)
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,

    /// How long a blocking read may wait for the next byte
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: constants::serial::BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::Odd,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
        }
    }

    /// Build from `OPN_PORT` and optional `OPN_BAUD_RATE`
    pub fn from_env() -> Result<Self> {
        let port = env::var(ENV_PORT)
            .map_err(|_| Error::InvalidConfig(format!("{ENV_PORT} is not set")))?;

        let mut config = Self::new(port);

        if let Ok(baud) = env::var(ENV_BAUD_RATE) {
            let baud = baud.trim().parse::<u32>().map_err(|e| {
                Error::InvalidConfig(format!("{ENV_BAUD_RATE}={baud:?}: {e}"))
            })?;
            config = config.with_baud_rate(baud);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    /// Set read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject settings no port can be opened with
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(Error::InvalidConfig("port is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(Error::InvalidConfig("baud rate is zero".into()));
        }
        Ok(())
    }

    pub(crate) fn builder(&self) -> serialport::SerialPortBuilder {
        serialport::new(&self.port, self.baud_rate)
            .data_bits(self.data_bits)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .flow_control(self.flow_control)
            .timeout(self.timeout)
    }
}
