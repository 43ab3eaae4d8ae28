//! Device information structures

use std::fmt;

/// Device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device serial identifier
    pub device_id: u64,

    /// Firmware version
    pub firmware_version: String,
}

impl DeviceInfo {
    pub fn new(device_id: u64, firmware_version: impl Into<String>) -> Self {
        Self {
            device_id,
            firmware_version: firmware_version.into(),
        }
    }

    /// Device id as 16 hex digits
    pub fn serial_number(&self) -> String {
        format!("{:016X}", self.device_id)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[ID: {}, FW: {}]",
            self.serial_number(),
            self.firmware_version
        )
    }
}
