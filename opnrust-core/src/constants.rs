//! Protocol constants

/// Marker sent as the second byte of every frame
pub const FLAG_BYTE: u8 = 2;

/// Largest payload the 5-bit length field can describe
pub const MAX_PAYLOAD_SIZE: usize = 0x1F;

/// Opcode, flag byte and length byte
pub const HEADER_SIZE: usize = 3;

/// Big-endian CRC-16 trailer
pub const CHECKSUM_SIZE: usize = 2;

/// Zero byte between a non-empty payload and the checksum
pub const PAD_BYTE: u8 = 0x00;

/// Big-endian device identifier
pub const DEVICE_ID_SIZE: usize = 8;

/// Firmware version string returned by interrogation
pub const FIRMWARE_VERSION_SIZE: usize = 8;

/// Bytes of a barcode record that are not barcode data
/// (symbology id + packed timestamp)
pub const RECORD_OVERHEAD: usize = 5;

/// Record length byte that ends a GetData response
pub const RECORD_TERMINATOR: u8 = 0;

/// Default serial read timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Serial line settings used by the OPN-2001 cradle
pub mod serial {
    /// Baud rate
    pub const BAUD_RATE: u32 = 9600;
}
