//! Typed requests and responses carried inside frames
//!
//! Every exchange is one [`Request`] followed by one [`Response`] with the
//! same [`Opcode`]. Fixed-size responses are ordinary frames whose payload is
//! decoded after the checksum passes. GetData responses have their own body
//! layout and are read record by record:
//!
//! ```text
//! ┌────────┬──────┬─────────┬───────────┬──────────────────┬─────┬────────┐
//! │ Opcode │ Flag │ Len/Rsv │ Device ID │ Record ...       │ 0x00│ CRC-16 │
//! │   1    │  1   │    1    │  8 (BE)   │ L, sym, data, ts │  1  │ 2 (BE) │
//! └────────┴──────┴─────────┴───────────┴──────────────────┴─────┴────────┘
//!
//! Record: L (1) │ symbology (1) │ data (L - 5) │ packed timestamp (4, BE)
//! ```

use std::borrow::Cow;
use std::fmt;
use std::io::Read;
use std::ops::Range;

use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, Bytes, BytesMut};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::{
    constants::{FIRMWARE_VERSION_SIZE, RECORD_OVERHEAD, RECORD_TERMINATOR},
    error::{Error, Result},
    frame::{Frame, FrameHeader, FrameReader},
    opcode::Opcode,
    timestamp,
};

/// Requests sent to the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Ask for device id and firmware version
    Interrogate,

    /// Set the real-time clock
    SetTime(NaiveDateTime),

    /// Read one parameter
    GetParam { param: u8 },

    /// Write one parameter
    SetParam { param: u8, value: u8 },

    /// Download stored barcodes
    GetData,
}

impl Request {
    /// Opcode the request is sent with
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Interrogate => Opcode::Interrogate,
            Self::SetTime(_) => Opcode::SetTime,
            Self::GetParam { .. } => Opcode::GetParam,
            Self::SetParam { .. } => Opcode::SetParam,
            Self::GetData => Opcode::GetData,
        }
    }

    /// Encode the request payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`] if a SetTime date is outside the
    /// years the device can store.
    pub fn payload(&self) -> Result<Bytes> {
        Ok(match self {
            Self::Interrogate | Self::GetData => Bytes::new(),
            Self::SetTime(date) => Bytes::copy_from_slice(&timestamp::encode_wire(date)?),
            Self::GetParam { param } => Bytes::copy_from_slice(&[*param]),
            Self::SetParam { param, value } => Bytes::copy_from_slice(&[*param, *value]),
        })
    }

    /// Wrap the request in a frame
    pub fn to_frame(&self) -> Result<Frame> {
        Frame::with_payload(self.opcode(), self.payload()?)
    }

    /// Encode the request as it goes on the wire
    ///
    /// # Examples
    ///
    /// ```
    /// use opnrust_core::Request;
    ///
    /// let bytes = Request::GetParam { param: 0x4F }.encode().unwrap();
    /// assert_eq!(&bytes[..4], &[0x08, 0x02, 0x01, 0x4F]);
    /// ```
    pub fn encode(&self) -> Result<BytesMut> {
        self.to_frame()?.encode()
    }
}

/// Answer to [`Request::Interrogate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterrogateResponse {
    /// Device serial identifier
    pub device_id: u64,

    /// Firmware version, NUL padded
    pub firmware_version: [u8; FIRMWARE_VERSION_SIZE],
}

impl InterrogateResponse {
    /// Firmware version with trailing NULs and whitespace removed
    pub fn firmware(&self) -> String {
        String::from_utf8_lossy(&self.firmware_version)
            .trim_end_matches(['\0', ' '])
            .to_string()
    }

    fn decode(mut payload: Bytes) -> Result<Self> {
        expect_len(Opcode::Interrogate, &payload)?;

        // Leading byte has no known meaning
        payload.advance(1);
        let device_id = payload.get_u64();

        let mut firmware_version = [0u8; FIRMWARE_VERSION_SIZE];
        payload.copy_to_slice(&mut firmware_version);

        Ok(Self {
            device_id,
            firmware_version,
        })
    }
}

/// Answer to [`Request::SetTime`]: the clock as the device stored it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTimeResponse {
    pub date: NaiveDateTime,
}

impl SetTimeResponse {
    fn decode(payload: Bytes) -> Result<Self> {
        expect_len(Opcode::SetTime, &payload)?;

        let mut bytes = [0u8; timestamp::WIRE_SIZE];
        bytes.copy_from_slice(&payload);

        Ok(Self {
            date: timestamp::decode_wire(bytes)?,
        })
    }
}

/// Answer to [`Request::GetParam`] and [`Request::SetParam`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamResponse {
    /// Parameter the device reports on
    pub param: u8,

    /// Current value after the request
    pub value: u8,
}

impl ParamResponse {
    fn decode(opcode: Opcode, payload: Bytes) -> Result<Self> {
        expect_len(opcode, &payload)?;

        Ok(Self {
            param: payload[0],
            value: payload[1],
        })
    }
}

/// One scanned barcode stored on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    /// Symbology (barcode standard) identifier
    pub symbology: u8,

    /// Barcode contents
    pub data: Bytes,

    /// When the barcode was scanned
    pub timestamp: NaiveDateTime,
}

impl Barcode {
    /// Barcode contents as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.symbology, self.text(), self.timestamp)
    }
}

/// Answer to [`Request::GetData`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataResponse {
    /// Header as received; the length field does not size this body
    pub header: FrameHeader,

    /// Device serial identifier
    pub device_id: u64,

    /// Stored barcodes in the order the device sent them
    pub barcodes: Vec<Barcode>,
}

impl GetDataResponse {
    fn read_from<R: Read + ?Sized>(stream: &mut R) -> Result<Self> {
        let mut reader = FrameReader::new(stream);

        let header = reader.read_header()?;
        let device_id = reader.read_device_id()?;

        // Record bodies are located first and decoded after the checksum passes
        let mut records: Vec<Range<usize>> = Vec::new();
        loop {
            let len = reader.read_u8()?;
            if len == RECORD_TERMINATOR {
                break;
            }

            records.push(reader.fill(len as usize)?);
        }

        let raw = reader.finish()?;

        // Short records are reported only after the checksum passes
        if let Some((index, range)) = records
            .iter()
            .enumerate()
            .find(|(_, range)| range.len() < RECORD_OVERHEAD)
        {
            return Err(Error::malformed(
                Opcode::GetData,
                format!(
                    "record {} is {} bytes, shorter than the {} byte minimum",
                    index,
                    range.len(),
                    RECORD_OVERHEAD
                ),
            ));
        }

        let barcodes = records
            .into_iter()
            .map(|range| decode_record(raw.slice(range)))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            device_id = %format!("{:016X}", device_id),
            count = barcodes.len(),
            "Received barcode records"
        );

        Ok(Self {
            header,
            device_id,
            barcodes,
        })
    }
}

fn decode_record(record: Bytes) -> Result<Barcode> {
    let ts_start = record.len() - 4;
    let timestamp = timestamp::decode_packed(BigEndian::read_u32(&record[ts_start..]))?;

    Ok(Barcode {
        symbology: record[0],
        data: record.slice(1..ts_start),
        timestamp,
    })
}

/// Responses received from the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Device id and firmware version
    Interrogate(InterrogateResponse),

    /// Clock as stored
    SetTime(SetTimeResponse),

    /// Current parameter value
    GetParam(ParamResponse),

    /// Parameter value after the write
    SetParam(ParamResponse),

    /// Stored barcodes
    GetData(GetDataResponse),
}

impl Response {
    /// Opcode of the request this answers
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Interrogate(_) => Opcode::Interrogate,
            Self::SetTime(_) => Opcode::SetTime,
            Self::GetParam(_) => Opcode::GetParam,
            Self::SetParam(_) => Opcode::SetParam,
            Self::GetData(_) => Opcode::GetData,
        }
    }

    /// Read the response to a request with the given opcode
    ///
    /// The expected opcode selects the body layout; the opcode byte actually
    /// received is only compared and logged.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the stream ends or fails mid-frame
    /// - [`Error::InvalidFrame`] on checksum mismatch
    /// - [`Error::MalformedPayload`] if the payload has the wrong shape
    /// - [`Error::InvalidTimestamp`] if a date in the response is invalid
    pub fn read_from<R: Read + ?Sized>(expected: Opcode, stream: &mut R) -> Result<Self> {
        match expected {
            Opcode::GetData => {
                let response = GetDataResponse::read_from(stream)?;
                check_opcode(expected, response.header.opcode);
                Ok(Self::GetData(response))
            }
            _ => {
                let frame = Frame::read_from(stream)?;
                check_opcode(expected, frame.opcode);
                Self::from_frame(expected, frame)
            }
        }
    }

    /// Decode the payload of a received fixed-size response frame
    pub fn from_frame(expected: Opcode, frame: Frame) -> Result<Self> {
        let payload = frame.payload;

        match expected {
            Opcode::Interrogate => InterrogateResponse::decode(payload).map(Self::Interrogate),
            Opcode::SetTime => SetTimeResponse::decode(payload).map(Self::SetTime),
            Opcode::GetParam => ParamResponse::decode(expected, payload).map(Self::GetParam),
            Opcode::SetParam => ParamResponse::decode(expected, payload).map(Self::SetParam),
            Opcode::GetData => Err(Error::malformed(
                expected,
                "record list cannot be carried in a single-payload frame",
            )),
        }
    }
}

fn expect_len(opcode: Opcode, payload: &[u8]) -> Result<()> {
    match opcode.response_payload_len() {
        Some(len) if len != payload.len() => Err(Error::malformed(
            opcode,
            format!("expected {} bytes, got {}", len, payload.len()),
        )),
        _ => Ok(()),
    }
}

fn check_opcode(expected: Opcode, received: u8) {
    if received != u8::from(expected) {
        warn!(
            expected = %expected,
            received = %format!("0x{:02X}", received),
            "Response opcode differs from request"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checksum, constants::FLAG_BYTE};
    use bytes::BufMut;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn response_bytes(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
        Frame::with_payload(opcode, payload.to_vec())
            .unwrap()
            .encode()
            .unwrap()
            .to_vec()
    }

    /// GetData body with a valid trailing checksum
    fn get_data_bytes(device_id: u64, records: &[(u8, &[u8], u32)]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u8(Opcode::GetData.into());
        buf.put_u8(FLAG_BYTE);
        buf.put_u8(records.len() as u8);
        buf.put_u64(device_id);
        for (symbology, data, ts) in records {
            buf.put_u8((data.len() + RECORD_OVERHEAD) as u8);
            buf.put_u8(*symbology);
            buf.put_slice(data);
            buf.put_u32(*ts);
        }
        buf.put_u8(RECORD_TERMINATOR);
        let crc = checksum::calculate(&buf);
        buf.put_u16(crc);
        buf.to_vec()
    }

    #[test]
    fn test_request_opcodes_and_payloads() {
        assert_eq!(Request::Interrogate.payload().unwrap().len(), 0);
        assert_eq!(Request::GetData.opcode(), Opcode::GetData);
        let set_param = Request::SetParam {
            param: 0x02,
            value: 0,
        };
        assert_eq!(set_param.payload().unwrap().as_ref(), &[0x02, 0x00]);
        assert_eq!(
            Request::GetParam { param: 0x4F }.payload().unwrap().as_ref(),
            &[0x4F]
        );
    }

    #[test]
    fn test_set_time_request() {
        let bytes = Request::SetTime(datetime(2013, 7, 21, 18, 5, 9)).encode().unwrap();
        assert_eq!(&bytes[..3], &[0x09, 0x02, 0x06]);
        assert_eq!(&bytes[3..9], &[9, 5, 18, 21, 7, 13]);
        assert_eq!(bytes[9], 0x00);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn test_set_time_request_year_out_of_range() {
        let result = Request::SetTime(datetime(1999, 1, 1, 0, 0, 0)).encode();
        assert!(matches!(result, Err(Error::InvalidTimestamp(_))));
    }

    #[test]
    fn test_interrogate_response() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(&0xAABB_CCDD_EEFF_0011u64.to_be_bytes());
        payload.extend_from_slice(b"V1.00\0\0\0");

        let bytes = response_bytes(Opcode::Interrogate, &payload);
        let response = Response::read_from(Opcode::Interrogate, &mut &bytes[..]).unwrap();

        match response {
            Response::Interrogate(r) => {
                assert_eq!(r.device_id, 0xAABB_CCDD_EEFF_0011);
                assert_eq!(&r.firmware_version, b"V1.00\0\0\0");
                assert_eq!(r.firmware(), "V1.00");
            }
            other => panic!("Expected Interrogate, got {:?}", other),
        }
    }

    #[test]
    fn test_interrogate_wrong_length() {
        let bytes = response_bytes(Opcode::Interrogate, &[0; 9]);
        let result = Response::read_from(Opcode::Interrogate, &mut &bytes[..]);

        assert!(matches!(
            result,
            Err(Error::MalformedPayload {
                opcode: Opcode::Interrogate,
                ..
            })
        ));
    }

    #[test]
    fn test_set_time_response() {
        let bytes = response_bytes(Opcode::SetTime, &[45, 30, 14, 15, 3, 24]);
        let response = Response::read_from(Opcode::SetTime, &mut &bytes[..]).unwrap();

        assert_eq!(
            response,
            Response::SetTime(SetTimeResponse {
                date: datetime(2024, 3, 15, 14, 30, 45)
            })
        );
    }

    #[test]
    fn test_set_time_response_invalid_date() {
        let bytes = response_bytes(Opcode::SetTime, &[0, 0, 0, 0, 0, 24]);
        let result = Response::read_from(Opcode::SetTime, &mut &bytes[..]);
        assert!(matches!(result, Err(Error::InvalidTimestamp(_))));
    }

    #[test]
    fn test_param_responses() {
        let bytes = response_bytes(Opcode::GetParam, &[0x4F, 0x01]);
        let response = Response::read_from(Opcode::GetParam, &mut &bytes[..]).unwrap();
        assert_eq!(
            response,
            Response::GetParam(ParamResponse {
                param: 0x4F,
                value: 1,
            })
        );

        let bytes = response_bytes(Opcode::SetParam, &[0x02, 0x00]);
        let response = Response::read_from(Opcode::SetParam, &mut &bytes[..]).unwrap();
        assert_eq!(response.opcode(), Opcode::SetParam);

        let bytes = response_bytes(Opcode::GetParam, &[0x4F]);
        assert!(matches!(
            Response::read_from(Opcode::GetParam, &mut &bytes[..]),
            Err(Error::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_get_data_single_record() {
        let scanned = datetime(2024, 3, 15, 14, 30, 45);
        let packed = timestamp::encode_packed(&scanned).unwrap();
        let bytes = get_data_bytes(0x0102_0304_0506_0708, &[(0x09, b"12345", packed)]);

        let mut stream = &bytes[..];
        let response = Response::read_from(Opcode::GetData, &mut stream).unwrap();
        assert!(stream.is_empty());

        let Response::GetData(data) = response else {
            panic!("Expected GetData response");
        };

        assert_eq!(data.device_id, 0x0102_0304_0506_0708);
        assert_eq!(data.barcodes.len(), 1);

        let barcode = &data.barcodes[0];
        assert_eq!(barcode.symbology, 9);
        assert_eq!(barcode.data.as_ref(), b"12345");
        assert_eq!(barcode.timestamp, scanned);
        assert_eq!(barcode.to_string(), "[9] 12345 2024-03-15 14:30:45");
    }

    #[test]
    fn test_get_data_preserves_order() {
        let ts = timestamp::encode_packed(&datetime(2020, 1, 2, 3, 4, 5)).unwrap();
        let bytes = get_data_bytes(
            42,
            &[(0x1F, b"A1", ts), (0x08, b"", ts), (0x09, b"0123456789012", ts)],
        );

        let Response::GetData(data) = Response::read_from(Opcode::GetData, &mut &bytes[..]).unwrap()
        else {
            panic!("Expected GetData response");
        };

        let contents: Vec<&[u8]> = data.barcodes.iter().map(|b| b.data.as_ref()).collect();
        assert_eq!(contents, vec![&b"A1"[..], &b""[..], &b"0123456789012"[..]]);
        assert_eq!(data.header.length, 3);
    }

    #[test]
    fn test_get_data_empty() {
        let bytes = get_data_bytes(7, &[]);
        let Response::GetData(data) = Response::read_from(Opcode::GetData, &mut &bytes[..]).unwrap()
        else {
            panic!("Expected GetData response");
        };
        assert_eq!(data.device_id, 7);
        assert!(data.barcodes.is_empty());
    }

    #[test]
    fn test_get_data_checksum_mismatch() {
        let ts = timestamp::encode_packed(&datetime(2020, 1, 2, 3, 4, 5)).unwrap();
        let mut bytes = get_data_bytes(42, &[(0x09, b"12345", ts)]);

        // Corrupt one barcode byte
        bytes[13] ^= 0x01;

        assert!(matches!(
            Response::read_from(Opcode::GetData, &mut &bytes[..]),
            Err(Error::InvalidFrame { .. })
        ));
    }

    /// GetData stream around a hand-built record list, terminator included
    fn get_data_raw(records: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u8(Opcode::GetData.into());
        buf.put_u8(FLAG_BYTE);
        buf.put_u8(0);
        buf.put_u64(42);
        buf.put_slice(records);
        let crc = checksum::calculate(&buf);
        buf.put_u16(crc);
        buf.to_vec()
    }

    #[test]
    fn test_get_data_record_too_short() {
        // Second record claims 3 bytes: symbology plus two data bytes, no timestamp
        let ts = timestamp::encode_packed(&datetime(2020, 1, 2, 3, 4, 5)).unwrap();
        let mut records = vec![6u8, 0x09, b'A'];
        records.extend_from_slice(&ts.to_be_bytes());
        records.extend_from_slice(&[3, 0x09, b'4', b'2', RECORD_TERMINATOR]);

        let bytes = get_data_raw(&records);
        let mut stream = &bytes[..];

        match Response::read_from(Opcode::GetData, &mut stream) {
            Err(Error::MalformedPayload { opcode, reason }) => {
                assert_eq!(opcode, Opcode::GetData);
                assert!(reason.starts_with("record 1 is 3 bytes"), "{}", reason);
            }
            other => panic!("Expected MalformedPayload, got {:?}", other),
        }

        // The whole frame was consumed before the record was rejected
        assert!(stream.is_empty());
    }

    #[test]
    fn test_get_data_short_record_with_bad_checksum() {
        let mut bytes = get_data_raw(&[2, 0x09, b'7', RECORD_TERMINATOR]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert!(matches!(
            Response::read_from(Opcode::GetData, &mut &bytes[..]),
            Err(Error::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_get_data_truncated() {
        let ts = timestamp::encode_packed(&datetime(2020, 1, 2, 3, 4, 5)).unwrap();
        let bytes = get_data_bytes(42, &[(0x09, b"12345", ts)]);

        let result = Response::read_from(Opcode::GetData, &mut &bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_get_data_invalid_record_timestamp() {
        let bytes = get_data_bytes(42, &[(0x09, b"12345", 0)]);
        assert!(matches!(
            Response::read_from(Opcode::GetData, &mut &bytes[..]),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_get_data_not_from_frame() {
        let frame = Frame::new(Opcode::GetData);
        assert!(Response::from_frame(Opcode::GetData, frame).is_err());
    }
}
