//! OPN-2001 frame structure and encoding/decoding

use std::fmt;
use std::io::Read;
use std::ops::Range;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::{
    checksum,
    constants::{
        CHECKSUM_SIZE, DEVICE_ID_SIZE, FLAG_BYTE, HEADER_SIZE, MAX_PAYLOAD_SIZE, PAD_BYTE,
    },
    error::{Error, Result},
    opcode::Opcode,
};

/// The three bytes that open every frame
///
/// ```text
/// ┌──────────┬──────────┬─────────────────────────────┐
/// │  Opcode  │   Flag   │ Reserved (3) │ Length (5)   │
/// │  1 byte  │  1 byte  │           1 byte            │
/// └──────────┴──────────┴─────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Raw opcode byte
    pub opcode: u8,

    /// Marker byte, 2 on every frame observed so far
    pub flag: u8,

    /// High three bits of the length byte, meaning unknown
    pub reserved: u8,

    /// Low five bits of the length byte
    pub length: u8,
}

impl FrameHeader {
    /// Split the three header bytes into their fields
    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            opcode: bytes[0],
            flag: bytes[1],
            reserved: (bytes[2] >> 5) & 0x07,
            length: bytes[2] & 0x1F,
        }
    }

    /// Pack reserved bits and length into the third header byte
    pub fn length_byte(&self) -> u8 {
        ((self.reserved & 0x07) << 5) | (self.length & 0x1F)
    }
}

/// OPN-2001 protocol frame
///
/// # Frame Structure
///
/// ```text
/// ┌────────┬──────┬─────────┬───────────┬──────────┬──────────┐
/// │ Opcode │ Flag │ Len/Rsv │  Payload  │   Pad    │  CRC-16  │
/// │   1    │  1   │    1    │  0..=31   │  0 or 1  │    2     │
/// │        │      │         │           │  (0x00)  │  (BE)    │
/// └────────┴──────┴─────────┴───────────┴──────────┴──────────┘
/// ```
///
/// The pad byte is present only when the payload is non-empty. The checksum
/// covers every byte before it, pad included.
///
/// # Examples
///
/// ```
/// use opnrust_core::{Frame, Opcode};
///
/// let frame = Frame::with_payload(Opcode::GetParam, vec![0x4Fu8]).unwrap();
/// let encoded = frame.encode().unwrap();
///
/// let decoded = Frame::read_from(&mut &encoded[..]).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw opcode byte
    pub opcode: u8,

    /// Marker byte, passed through untouched
    pub flag: u8,

    /// Reserved length-byte bits, passed through untouched
    pub reserved: u8,

    /// Frame payload (opcode-specific data)
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame with empty payload
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode: opcode.into(),
            flag: FLAG_BYTE,
            reserved: 0,
            payload: Bytes::new(),
        }
    }

    /// Create a frame with payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload is longer than 31 bytes.
    pub fn with_payload(opcode: Opcode, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        check_length(payload.len())?;

        Ok(Self {
            payload,
            ..Self::new(opcode)
        })
    }

    /// Override the flag byte
    pub fn with_flag(mut self, flag: u8) -> Self {
        self.flag = flag;
        self
    }

    /// Override the reserved bits (only the low three bits are kept)
    pub fn with_reserved(mut self, reserved: u8) -> Self {
        self.reserved = reserved & 0x07;
        self
    }

    /// Typed opcode, if the raw byte is one the protocol defines
    pub fn opcode(&self) -> Result<Opcode> {
        Opcode::try_from(self.opcode)
    }

    /// Header for this frame
    ///
    /// Lengths above 31 are truncated here; [`Frame::encode`] rejects them.
    pub fn header(&self) -> FrameHeader {
        FrameHeader {
            opcode: self.opcode,
            flag: self.flag,
            reserved: self.reserved,
            length: (self.payload.len() & MAX_PAYLOAD_SIZE) as u8,
        }
    }

    /// Calculate checksum for this frame
    pub fn checksum(&self) -> u16 {
        checksum::calculate(&self.body())
    }

    /// Encode frame to bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload was grown past
    /// 31 bytes after construction.
    ///
    /// # Examples
    ///
    /// ```
    /// use opnrust_core::{Frame, Opcode};
    ///
    /// let bytes = Frame::new(Opcode::Interrogate).encode().unwrap();
    /// assert_eq!(&bytes[..], &[0x01, 0x02, 0x00, 0x9F, 0xDE]);
    /// ```
    pub fn encode(&self) -> Result<BytesMut> {
        check_length(self.payload.len())?;

        let mut buf = self.body();
        let crc = checksum::calculate(&buf);
        buf.put_u16(crc);

        trace!("Encoded frame: {}", hex::encode(&buf));

        Ok(buf)
    }

    /// Read one frame from a blocking byte stream
    ///
    /// Consumes exactly the bytes of one frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the stream ends or fails mid-frame
    /// - [`Error::InvalidFrame`] if the checksum does not match
    pub fn read_from<R: Read + ?Sized>(stream: &mut R) -> Result<Self> {
        let mut reader = FrameReader::new(stream);

        let header = reader.read_header()?;
        let payload = reader.fill(header.length as usize)?;
        if header.length > 0 {
            reader.read_u8()?;
        }

        let raw = reader.finish()?;

        let frame = Self {
            opcode: header.opcode,
            flag: header.flag,
            reserved: header.reserved,
            payload: raw.slice(payload),
        };

        debug!("Received {}", frame);

        Ok(frame)
    }

    /// Get total encoded frame size
    pub fn size(&self) -> usize {
        let pad = usize::from(!self.payload.is_empty());
        HEADER_SIZE + self.payload.len() + pad + CHECKSUM_SIZE
    }

    /// Every byte covered by the checksum
    fn body(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        let header = self.header();
        buf.put_u8(header.opcode);
        buf.put_u8(header.flag);
        buf.put_u8(header.length_byte());
        buf.put_slice(&self.payload);

        if !self.payload.is_empty() {
            buf.put_u8(PAD_BYTE);
        }

        buf
    }
}

fn check_length(size: usize) -> Result<()> {
    if size > MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge {
            size,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(())
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("opcode", &format!("0x{:02X}", self.opcode))
            .field("flag", &self.flag)
            .field("reserved", &self.reserved)
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode() {
            Ok(op) => write!(f, "Frame[{}](len={})", op, self.payload.len()),
            Err(_) => write!(
                f,
                "Frame[0x{:02X}](len={})",
                self.opcode,
                self.payload.len()
            ),
        }
    }
}

/// Exact-length reader that keeps every byte it consumes
///
/// The checksum of a frame covers everything read before it, including
/// bodies like the GetData record list whose size is not known up front.
/// `FrameReader` records the bytes as they arrive so [`FrameReader::finish`]
/// can verify the trailer against them.
pub struct FrameReader<'a, R: ?Sized> {
    inner: &'a mut R,
    raw: BytesMut,
}

impl<'a, R: Read + ?Sized> FrameReader<'a, R> {
    /// Wrap a stream positioned at the start of a frame
    pub fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            raw: BytesMut::with_capacity(64),
        }
    }

    /// Read exactly `len` bytes, returning their position in the frame
    pub fn fill(&mut self, len: usize) -> Result<Range<usize>> {
        let start = self.raw.len();
        self.raw.resize(start + len, 0);

        if let Err(e) = self.inner.read_exact(&mut self.raw[start..]) {
            trace!(
                "Short read after {} bytes: {}",
                start,
                hex::encode(&self.raw[..start])
            );
            return Err(e.into());
        }

        Ok(start..start + len)
    }

    /// Read opcode, flag byte and length byte
    pub fn read_header(&mut self) -> Result<FrameHeader> {
        let range = self.fill(HEADER_SIZE)?;
        let bytes = &self.raw[range];
        let header = FrameHeader::from_bytes([bytes[0], bytes[1], bytes[2]]);

        if header.flag != FLAG_BYTE {
            debug!(flag = header.flag, "Unexpected flag byte, passing through");
        }

        Ok(header)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        let range = self.fill(1)?;
        Ok(self.raw[range.start])
    }

    /// Read a big-endian device id
    pub fn read_device_id(&mut self) -> Result<u64> {
        let range = self.fill(DEVICE_ID_SIZE)?;
        Ok(BigEndian::read_u64(&self.raw[range]))
    }

    /// Bytes consumed so far
    pub fn consumed(&self) -> &[u8] {
        &self.raw
    }

    /// Read the checksum trailer and verify it
    ///
    /// Returns every byte the checksum covers.
    pub fn finish(self) -> Result<Bytes> {
        let received = self.inner.read_u16::<BigEndian>()?;
        let expected = checksum::calculate(&self.raw);

        trace!(
            "Frame bytes: {} crc={:04x}",
            hex::encode(&self.raw),
            received
        );

        if expected != received {
            return Err(Error::InvalidFrame { expected, received });
        }

        Ok(self.raw.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io;

    fn decode(bytes: &[u8]) -> Result<Frame> {
        Frame::read_from(&mut &bytes[..])
    }

    #[test]
    fn test_frame_new() {
        let frame = Frame::new(Opcode::Interrogate);
        assert_eq!(frame.opcode, 1);
        assert_eq!(frame.flag, FLAG_BYTE);
        assert_eq!(frame.reserved, 0);
        assert_eq!(frame.payload.len(), 0);
    }

    #[test]
    fn test_empty_frame_has_no_pad() {
        let encoded = Frame::new(Opcode::GetData).encode().unwrap();
        assert_eq!(&encoded[..], &[0x07, 0x02, 0x00, 0x9E, 0x3E]);
    }

    #[test]
    fn test_frame_layout_with_payload() {
        let frame = Frame::with_payload(Opcode::SetParam, vec![0x4Fu8, 0x01]).unwrap();
        let encoded = frame.encode().unwrap();

        assert_eq!(encoded.len(), frame.size());
        assert_eq!(&encoded[..6], &[0x03, 0x02, 0x02, 0x4F, 0x01, 0x00]);

        let crc = checksum::calculate(&encoded[..6]);
        assert_eq!(&encoded[6..], &crc.to_be_bytes());
    }

    #[test]
    fn test_frame_encode_decode() {
        let original = Frame::with_payload(Opcode::SetTime, vec![1u8, 2, 3, 4, 5, 6]).unwrap();

        let encoded = original.encode().unwrap();
        let decoded = decode(&encoded).unwrap();

        assert_eq!(original, decoded);
        assert_eq!(decoded.opcode().unwrap(), Opcode::SetTime);
    }

    #[test]
    fn test_reserved_bits_and_flag_pass_through() {
        let original = Frame::with_payload(Opcode::GetParam, vec![0x22u8])
            .unwrap()
            .with_reserved(0b101)
            .with_flag(7);

        let encoded = original.encode().unwrap();
        assert_eq!(encoded[1], 7);
        assert_eq!(encoded[2], 0b101_00001);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.reserved, 0b101);
        assert_eq!(decoded.flag, 7);
    }

    #[test]
    fn test_max_payload() {
        let payload = vec![0xAB; MAX_PAYLOAD_SIZE];
        let frame = Frame::with_payload(Opcode::GetParam, payload.clone()).unwrap();

        let decoded = decode(&frame.encode().unwrap()).unwrap();
        assert_eq!(decoded.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn test_payload_too_large() {
        let result = Frame::with_payload(Opcode::GetParam, vec![0u8; MAX_PAYLOAD_SIZE + 1]);
        assert!(matches!(
            result,
            Err(Error::PayloadTooLarge { size: 32, max: 31 })
        ));

        // Grown after construction
        let mut frame = Frame::new(Opcode::GetParam);
        frame.payload = Bytes::from(vec![0; 40]);
        assert!(matches!(frame.encode(), Err(Error::PayloadTooLarge { size: 40, .. })));
    }

    #[test]
    fn test_frame_checksum_verification() {
        let frame = Frame::with_payload(Opcode::GetParam, vec![0x4Fu8]).unwrap();
        let mut encoded = frame.encode().unwrap();

        // Corrupt checksum
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;

        match decode(&encoded) {
            Err(Error::InvalidFrame { expected, received }) => assert_ne!(expected, received),
            other => panic!("Expected InvalidFrame, got {:?}", other),
        }
    }

    #[test]
    fn test_single_bit_flips_detected() {
        let frame = Frame::with_payload(Opcode::SetTime, vec![9u8, 5, 18, 21, 7, 13]).unwrap();
        let encoded = frame.encode().unwrap();

        for pos in 0..encoded.len() {
            for bit in 0..8 {
                let mut tampered = encoded.clone();
                tampered[pos] ^= 1 << bit;

                let result = decode(&tampered);
                if pos == 2 && bit < 5 {
                    // Length changed: either a short read or a checksum failure
                    assert!(result.is_err(), "byte {pos} bit {bit} accepted");
                } else {
                    assert!(
                        matches!(result, Err(Error::InvalidFrame { .. })),
                        "byte {pos} bit {bit}: {:?}",
                        result
                    );
                }
            }
        }
    }

    #[test]
    fn test_short_read() {
        let frame = Frame::with_payload(Opcode::GetParam, vec![0x4Fu8]).unwrap();
        let encoded = frame.encode().unwrap();

        for cut in 0..encoded.len() {
            match decode(&encoded[..cut]) {
                Err(Error::Transport(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
                other => panic!("cut at {cut}: expected Transport error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_reads_exactly_one_frame() {
        let first = Frame::with_payload(Opcode::GetParam, vec![0x4Fu8, 0x01]).unwrap();
        let second = Frame::new(Opcode::Interrogate);

        let mut stream = Vec::new();
        stream.extend_from_slice(&first.encode().unwrap());
        stream.extend_from_slice(&second.encode().unwrap());

        let mut cursor = &stream[..];
        assert_eq!(Frame::read_from(&mut cursor).unwrap(), first);
        assert_eq!(Frame::read_from(&mut cursor).unwrap(), second);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_header_length_byte() {
        let header = FrameHeader::from_bytes([0x07, 0x02, 0xE3]);
        assert_eq!(header.reserved, 0b111);
        assert_eq!(header.length, 3);
        assert_eq!(header.length_byte(), 0xE3);
    }

    #[test]
    fn test_frame_reader_finish_returns_body() {
        let encoded = Frame::with_payload(Opcode::GetParam, vec![0x4Fu8])
            .unwrap()
            .encode()
            .unwrap();
        let mut cursor = &encoded[..];

        let mut reader = FrameReader::new(&mut cursor);
        reader.read_header().unwrap();
        assert_eq!(reader.read_u8().unwrap(), 0x4F);
        assert_eq!(reader.read_u8().unwrap(), PAD_BYTE);
        assert_eq!(reader.consumed().len(), 5);

        let body = reader.finish().unwrap();
        assert_eq!(&body[..], &encoded[..5]);
    }

    #[test]
    fn test_frame_reader_device_id() {
        let bytes = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0xFF];
        let mut cursor = &bytes[..];

        let mut reader = FrameReader::new(&mut cursor);
        assert_eq!(reader.read_device_id().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(reader.consumed().len(), DEVICE_ID_SIZE);
        assert_eq!(cursor, &[0xFF]);
    }

    proptest! {
        #[test]
        fn prop_frame_round_trip(
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
            reserved in 0u8..8,
        ) {
            let frame = Frame::with_payload(Opcode::GetParam, payload.clone())
                .unwrap()
                .with_reserved(reserved);

            let decoded = decode(&frame.encode().unwrap()).unwrap();
            prop_assert_eq!(decoded.payload.as_ref(), payload.as_slice());
            prop_assert_eq!(decoded.reserved, reserved);
        }
    }
}
