//! OPN-2001 protocol opcodes

use std::fmt;

use crate::error::{Error, Result};

/// Protocol opcodes
///
/// The device answers each request with a frame for the same operation, so
/// one opcode identifies both halves of an exchange.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Read device id and firmware version
    Interrogate = 1,

    /// Write one configuration parameter
    SetParam = 3,

    /// Download stored barcodes
    GetData = 7,

    /// Read one configuration parameter
    GetParam = 8,

    /// Set the real-time clock
    SetTime = 9,
}

impl Opcode {
    /// Every opcode the protocol defines
    pub const ALL: [Opcode; 5] = [
        Self::Interrogate,
        Self::SetParam,
        Self::GetData,
        Self::GetParam,
        Self::SetTime,
    ];

    /// Get opcode name
    pub fn name(self) -> &'static str {
        match self {
            Self::Interrogate => "OPN_INTERROGATE",
            Self::SetParam => "OPN_SET_PARAM",
            Self::GetData => "OPN_GET_DATA",
            Self::GetParam => "OPN_GET_PARAM",
            Self::SetTime => "OPN_SET_TIME",
        }
    }

    /// Payload size of the response frame, when it is fixed
    ///
    /// `GetData` responses are variable-length and return `None`.
    pub fn response_payload_len(self) -> Option<usize> {
        match self {
            Self::Interrogate => Some(17),
            Self::SetTime => Some(6),
            Self::GetParam | Self::SetParam => Some(2),
            Self::GetData => None,
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Interrogate),
            3 => Ok(Self::SetParam),
            7 => Ok(Self::GetData),
            8 => Ok(Self::GetParam),
            9 => Ok(Self::SetTime),
            _ => Err(Error::UnknownOpcode(value)),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u8)
    }
}
