//! # opnrust
//!
//! Rust implementation of the Opticon OPN-2001 barcode scanner serial protocol.
//!
//! ## Features
//!
//! - Type-safe frame and message implementation
//! - Blocking, strictly half-duplex request/response exchanges
//! - Device and symbology parameter tables
//! - Serial and in-memory transports
//!
//! ## Quick Start
//!
//! ```no_run
//! use opnrust::{DeviceParameter, Scanner, SerialConfig};
//!
//! fn main() -> opnrust::Result<()> {
//!     // Open the cradle's serial port
//!     let mut scanner = Scanner::serial(SerialConfig::new("/dev/ttyUSB0"));
//!     scanner.connect()?;
//!
//!     // Identify the scanner and sync its clock
//!     println!("{}", scanner.interrogate()?);
//!     scanner.sync_clock()?;
//!
//!     // Read a parameter
//!     let ascii = scanner.get_param(DeviceParameter::AsciiMode)?;
//!     println!("ASCII mode: {}", ascii);
//!
//!     // Download barcodes
//!     for barcode in scanner.get_data()?.barcodes {
//!         println!("{}", barcode);
//!     }
//!
//!     scanner.disconnect()?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod scanner;
pub mod shared;

// Re-exports
pub use error::{Error, Result};
pub use scanner::Scanner;
pub use shared::SharedScanner;

// Re-export types
pub use opnrust_core::{Barcode, GetDataResponse, Opcode, Request, Response, Session};
pub use opnrust_transport::{MemoryTransport, SerialConfig, SerialTransport, Transport};
pub use opnrust_types::{DeviceInfo, DeviceParameter, Parameter, SymbologyParameter};
