//! # opnrust-core
//!
//! Core protocol implementation for the Opticon OPN-2001 barcode scanner.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - CRC-16 checksum calculation
//! - Device timestamp encodings
//! - Typed request/response messages
//! - Half-duplex request/response sessions over any blocking byte stream

pub mod checksum;
pub mod constants;
pub mod error;
pub mod frame;
pub mod message;
pub mod opcode;
pub mod session;
pub mod timestamp;

pub use error::{Error, Result};
pub use frame::{Frame, FrameHeader};
pub use message::{
    Barcode, GetDataResponse, InterrogateResponse, ParamResponse, Request, Response,
    SetTimeResponse,
};
pub use opcode::Opcode;
pub use session::Session;

/// Protocol version information
pub const PROTOCOL_VERSION: &str = "1.0";
