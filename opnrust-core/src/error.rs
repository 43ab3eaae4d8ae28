//! Error types for opnrust-core



/// Result type alias for opnrust operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Checksum verification failed on a received frame
    #[error("Invalid frame: checksum mismatch, expected 0x{expected:04X}, received 0x{received:04X}")]
    InvalidFrame {
        expected: u16,
        received: u16,
    },

    /// Payload does not fit in the 5-bit length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Response payload does not have the shape its opcode requires
    #[error("Malformed {opcode} payload: {reason}")]
    MalformedPayload {
        opcode: crate::opcode::Opcode,
        reason: String,
    },

    /// Decoded date/time fields are out of calendar range
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Unknown opcode byte
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Short read, closed stream or other I/O failure
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(opcode: crate::opcode::Opcode, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            opcode,
            reason: reason.into(),
        }
    }

    /// Check if the error means the bytes on the wire were damaged or misread
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::InvalidFrame { .. }
                | Self::MalformedPayload { .. }
                | Self::InvalidTimestamp(_)
        )
    }

    /// Check if error requires reopening the transport
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
