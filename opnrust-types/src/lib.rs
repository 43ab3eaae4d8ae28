//! Type definitions for opnrust

pub mod device_info;
pub mod error;
pub mod parameter;

pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use parameter::{DeviceParameter, Parameter, SymbologyParameter};
