//! High-level scanner interface

use chrono::{Local, NaiveDateTime, SubsecRound};
use tracing::{debug, info, warn};

use opnrust_core::{GetDataResponse, ParamResponse, Request, Response, Session};
use opnrust_transport::{SerialConfig, SerialTransport, Transport};
use opnrust_types::DeviceInfo;

use crate::error::{Error, Result};

/// OPN-2001 scanner
///
/// High-level interface for one scanner on one transport. Each call performs
/// exactly one request/response exchange and returns as soon as it fails.
///
/// # Examples
///
/// ```no_run
/// use opnrust::{Scanner, SerialConfig};
///
/// fn main() -> opnrust::Result<()> {
///     let mut scanner = Scanner::serial(SerialConfig::new("/dev/ttyUSB0"));
///
///     scanner.connect()?;
///
///     let info = scanner.interrogate()?;
///     println!("Scanner: {}", info);
///
///     for barcode in scanner.get_data()?.barcodes {
///         println!("{}", barcode);
///     }
///
///     scanner.disconnect()?;
///     Ok(())
/// }
/// ```
pub struct Scanner<T = Box<dyn Transport>> {
    transport: T,
}

impl Scanner<SerialTransport> {
    /// Create a scanner on a serial port
    pub fn serial(config: SerialConfig) -> Self {
        Self::new(SerialTransport::new(config))
    }
}

impl<T: Transport> Scanner<T> {
    /// Create a scanner on any transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Open the transport
    pub fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.port_name());

        self.transport.connect()?;

        info!("Connected to {}", self.transport.port_name());
        Ok(())
    }

    /// Close the transport
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.port_name());
        self.transport.disconnect()?;

        info!("Disconnected");
        Ok(())
    }

    /// Read device id and firmware version
    pub fn interrogate(&mut self) -> Result<DeviceInfo> {
        debug!("Interrogating scanner...");

        match self.exchange(Request::Interrogate)? {
            Response::Interrogate(r) => {
                let info = DeviceInfo::new(r.device_id, r.firmware());
                debug!("Scanner info: {}", info);
                Ok(info)
            }
            other => Err(unexpected("interrogate", &other)),
        }
    }

    /// Set the scanner clock
    ///
    /// Returns the time the scanner reports back.
    pub fn set_time(&mut self, date: NaiveDateTime) -> Result<NaiveDateTime> {
        debug!("Setting clock to {}...", date);

        match self.exchange(Request::SetTime(date))? {
            Response::SetTime(r) => {
                if r.date != date {
                    warn!("Scanner stored {} instead of {}", r.date, date);
                }
                Ok(r.date)
            }
            other => Err(unexpected("set_time", &other)),
        }
    }

    /// Set the scanner clock to local time
    pub fn sync_clock(&mut self) -> Result<NaiveDateTime> {
        self.set_time(Local::now().naive_local().trunc_subsecs(0))
    }

    /// Read a device or symbology parameter
    pub fn get_param(&mut self, param: impl Into<u8>) -> Result<u8> {
        let param = param.into();
        debug!("Reading parameter 0x{:02X}...", param);

        match self.exchange(Request::GetParam { param })? {
            Response::GetParam(r) => check_param(param, r),
            other => Err(unexpected("get_param", &other)),
        }
    }

    /// Write a device or symbology parameter
    ///
    /// Returns the value the scanner reports after the write.
    pub fn set_param(&mut self, param: impl Into<u8>, value: u8) -> Result<u8> {
        let param = param.into();
        debug!("Writing parameter 0x{:02X} = {}...", param, value);

        match self.exchange(Request::SetParam { param, value })? {
            Response::SetParam(r) => {
                let stored = check_param(param, r)?;
                if stored != value {
                    warn!(
                        param,
                        value,
                        stored,
                        "Scanner did not store the requested value"
                    );
                }
                Ok(stored)
            }
            other => Err(unexpected("set_param", &other)),
        }
    }

    /// Download every barcode stored on the scanner
    pub fn get_data(&mut self) -> Result<GetDataResponse> {
        debug!("Downloading barcodes...");

        match self.exchange(Request::GetData)? {
            Response::GetData(r) => {
                info!("Downloaded {} barcodes", r.barcodes.len());
                Ok(r)
            }
            other => Err(unexpected("get_data", &other)),
        }
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_inner(self) -> T {
        self.transport
    }

    // Helper methods

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    fn exchange(&mut self, request: Request) -> Result<Response> {
        self.ensure_connected()?;

        let mut session = Session::new(&mut self.transport);
        Ok(session.exchange(&request)?)
    }
}

fn check_param(requested: u8, response: ParamResponse) -> Result<u8> {
    if response.param != requested {
        return Err(Error::InvalidResponse(format!(
            "asked for parameter 0x{:02X}, scanner answered for 0x{:02X}",
            requested, response.param
        )));
    }
    Ok(response.value)
}

fn unexpected(operation: &str, response: &Response) -> Error {
    Error::InvalidResponse(format!("{} answered with {}", operation, response.opcode()))
}
