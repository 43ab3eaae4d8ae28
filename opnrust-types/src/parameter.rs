//! Device and symbology configuration parameters
//!
//! Parameters are addressed by a single byte. The protocol treats that byte
//! as opaque; these tables give the known ids names and value ranges.
//! The device and symbology tables share no ids: 0x08 (CODE_128) and
//! 0x09 (UPC) exist only as symbology parameters.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

macro_rules! parameter_table {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $id:literal => $label:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $id,
            )+
        }

        impl $name {
            /// Every parameter in the table
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            /// Parameter name as used in the device documentation
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Raw parameter id
            pub fn id(self) -> u8 {
                self as u8
            }
        }

        impl From<$name> for u8 {
            fn from(param: $name) -> u8 {
                param as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = Error;

            fn try_from(value: u8) -> Result<Self> {
                match value {
                    $($id => Ok(Self::$variant),)+
                    _ => Err(Error::UnknownParameter { kind: $kind, id: value }),
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|p| p.name().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| Error::Parse(format!("unknown {} parameter {:?}", $kind, s)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{:02X})", self.name(), *self as u8)
            }
        }
    };
}

parameter_table! {
    /// General device settings
    DeviceParameter, "device" {
        /// Scan window, 1–10 s in 100 ms steps (default 30 = 3 s)
        ScannerOnTime = 0x11 => "SCANNER_ON_TIME",
        /// Beeper, 0=off 1=on (default 1)
        Volume = 0x02 => "VOLUME",
        /// Stay awake after communication, 1–6 in 20 s steps (default 20 s)
        CommAwakeTime = 0x20 => "COMM_AWAKE_TIME",
        /// 3=300 4=600 5=1200 6=2400 7=4800 8=9600 9=19200 (default 9600)
        BaudRate = 0x0D => "BAUD_RATE",
        /// 0–1 s in 10 ms steps (default 35 = 350 ms)
        BaudSwitchDelay = 0x1D => "BAUD_SWITCH_DELAY",
        /// 1=enable 0=disable (default enabled)
        ResetBaudRates = 0x1C => "RESET_BAUD_RATES",
        /// 1=enable 0=disable (default disabled)
        RejectRedundantBarcode = 0x04 => "REJECT_REDUNDANT_BARCODE",
        /// 1=enable 0=disable (default enabled)
        HostConnectBeep = 0x0A => "HOST_CONNECT_BEEP",
        /// 1=enable 0=disable (default enabled)
        HostCompleteBeep = 0x0B => "HOST_COMPLETE_BEEP",
        /// 0=none/block 1=none/allow 2=indicate/block 3=indicate/allow (default 3)
        LowBatteryIndication = 0x07 => "LOW_BATTERY_INDICATION",
        /// 1=enable 0=disable (default disabled)
        AutoClear = 0x0F => "AUTO_CLEAR",
        /// 0–3 delete/clear-all combinations, 4=radio stamp, 5=device initiated upload (default 3)
        DeleteEnable = 0x21 => "DELETE_ENABLE",
        /// 1=enable 0=disable (default disabled)
        DataProtection = 0x31 => "DATA_PROTECTION",
        /// 1=enable 0=disable (default enabled)
        MemoryFullIndication = 0x32 => "MEMORY_FULL_INDICATION",
        /// 1=enable 0=disable (default disabled)
        MemoryLowIndication = 0x33 => "MEMORY_LOW_INDICATION",
        /// 1–30 (default 30)
        MaxBarcodeLen = 0x22 => "MAX_BARCODE_LEN",
        /// 250 ms–1 s in 250 ms steps (default 4)
        GoodDecodeLedOnTime = 0x1E => "GOOD_DECODE_LED_ON_TIME",
        /// 1=enable 0=disable (default enabled)
        StoreRtc = 0x23 => "STORE_RTC",
        /// 0=raw data 1=ASCII string (default 0)
        AsciiMode = 0x4F => "ASCII_MODE",
        /// 0=no 1=yes (default 1)
        BeeperToggle = 0x55 => "BEEPER_TOGGLE",
        /// 0=no 1=yes (default 0)
        BeeperAutoOn = 0x56 => "BEEPER_AUTO_ON",
        /// Free byte for host use
        ScratchPad = 0x26 => "SCRATCH_PAD",
    }
}

parameter_table! {
    /// Per-symbology decoding settings
    SymbologyParameter, "symbology" {
        /// 1=enable 0=disable (default enabled)
        Code39 = 0x1F => "CODE39",
        /// 1=enable 0=disable (default enabled)
        Upc = 0x09 => "UPC",
        /// 1=enable 0=disable (default enabled)
        Code128 = 0x08 => "CODE_128",
        /// 1=enable 0=disable (default disabled)
        Code39Ascii = 0x36 => "CODE39_ASCII",
        /// 0=none 1=supplementals only 2=autodiscriminate (default 2)
        UpcSupps = 0x35 => "UPC_SUPPS",
        /// 1=enable 0=disable (default disabled)
        ConvertUpceToUpca = 0x29 => "CONVERT_UPCE_TO_UPCA",
        /// 1=enable 0=disable (default disabled)
        ConvertEan8ToEan13 = 0x2A => "CONVERT_EAN8_TO_EAN13",
        /// 1=enable 0=disable (default disabled)
        ConvertEan8ToEan13Type = 0x37 => "CONVERT_EAN8_TO_EAN13_TYPE",
        /// 1=enable 0=disable (default enabled)
        SendUpcaCheckDigit = 0x2B => "SEND_UPCA_CHECK_DIGIT",
        /// 1=enable 0=disable (default enabled)
        SendUpceCheckDigit = 0x2C => "SEND_UPCE_CHECK_DIGIT",
        /// 1=enable 0=disable (default disabled)
        Code39CheckDigit = 0x2E => "CODE39_CHECK_DIGIT",
        /// 1=enable 0=disable (default disabled)
        XmitCode39CheckDigit = 0x2D => "XMIT_CODE39_CHECK_DIGIT",
        /// 0=none 1=system char 2=system char + country code (default 1)
        UpcePreamble = 0x25 => "UPCE_PREAMBLE",
        /// 1=enable 0=disable (default enabled)
        Ean128 = 0x34 => "EAN128",
        /// 1=enable 0=disable (default enabled)
        CouponCode = 0x38 => "COUPON_CODE",
        /// 1=enable 0=disable (default enabled)
        I2of5 = 0x3A => "I2OF5",
        /// 1=enable 0=disable (default disabled)
        I2of5CheckDigit = 0x41 => "I2OF5_CHECK_DIGIT",
        /// 1=enable 0=disable (default disabled)
        XmitI2of5CheckDigit = 0x40 => "XMIT_I2OF5_CHECK_DIGIT",
        /// 1=enable 0=disable (default disabled)
        ConvertItf14ToEan13 = 0x3F => "CONVERT_ITF14_TO_EAN13",
        /// First length limit (default 14)
        I2of5Length1 = 0x3B => "I2OF5_LENGTH1",
        /// Second length limit (default 0)
        I2of5Length2 = 0x3C => "I2OF5_LENGTH2",
        /// 1=enable 0=disable (default disabled)
        D2of5 = 0x39 => "D2OF5",
        /// First length limit
        D2of5Length1 = 0x3D => "D2OF5_LENGTH1",
        /// Second length limit
        D2of5Length2 = 0x3E => "D2OF5_LENGTH2",
        /// 0–3 (default 0)
        UpcEanSecurityLevel = 0x2F => "UPC_EAN_SECURITY_LEVEL",
        /// 2–20 (default 5)
        UpcEanSupplementalRedundancy = 0x30 => "UPC_EAN_SUPPLEMENTAL_REDUNDANCY",
    }
}

/// Either kind of parameter
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    Device(DeviceParameter),
    Symbology(SymbologyParameter),
}

impl Parameter {
    pub fn id(self) -> u8 {
        match self {
            Self::Device(p) => p.id(),
            Self::Symbology(p) => p.id(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Device(p) => p.name(),
            Self::Symbology(p) => p.name(),
        }
    }
}

impl From<DeviceParameter> for Parameter {
    fn from(p: DeviceParameter) -> Self {
        Self::Device(p)
    }
}

impl From<SymbologyParameter> for Parameter {
    fn from(p: SymbologyParameter) -> Self {
        Self::Symbology(p)
    }
}

impl From<Parameter> for u8 {
    fn from(p: Parameter) -> u8 {
        p.id()
    }
}

impl FromStr for Parameter {
    type Err = Error;

    /// Look the name up in the device table, then the symbology table
    fn from_str(s: &str) -> Result<Self> {
        s.parse::<DeviceParameter>()
            .map(Self::Device)
            .or_else(|_| s.parse::<SymbologyParameter>().map(Self::Symbology))
            .map_err(|_| Error::Parse(format!("unknown parameter {:?}", s)))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(p) => fmt::Display::fmt(p, f),
            Self::Symbology(p) => fmt::Display::fmt(p, f),
        }
    }
}
