//! BER decoding.
//!
//! [`Decoder`] is a bounds-checked cursor over a `Bytes` buffer. Every read
//! validates tag, length and available data before touching the payload, so
//! decoding is total over arbitrary input: malformed bytes produce an
//! `Error::Decode` with the offending offset, never a panic or OOB read.

use bytes::Bytes;

use super::length::{DecodedLength, decode_length};
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;

/// Cursor over BER-encoded bytes.
pub struct Decoder {
    data: Bytes,
    pos: usize,
    /// Offset of `data[0]` in the original datagram, for error reporting
    /// from nested sequence decoders.
    base: usize,
}

impl Decoder {
    /// Create a decoder over a byte buffer.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True when all input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Absolute offset in the original input (for error reporting).
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn err(&self, kind: DecodeErrorKind) -> Error {
        Error::decode(self.offset(), kind)
    }

    /// Look at the next tag byte without consuming it.
    pub fn peek_tag(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.err(DecodeErrorKind::TruncatedData))
    }

    /// Read one TLV header, returning `(tag, content_length)`.
    fn read_header(&mut self) -> Result<(u8, usize)> {
        let tag = self.peek_tag()?;
        let after_tag = self.pos + 1;

        let length = match decode_length(&self.data[after_tag..]) {
            DecodedLength::Definite { length, octets } => {
                self.pos = after_tag + octets;
                length
            }
            DecodedLength::Indefinite => {
                self.pos = after_tag;
                return Err(self.err(DecodeErrorKind::IndefiniteLength));
            }
            DecodedLength::Invalid => {
                self.pos = after_tag;
                return Err(self.err(DecodeErrorKind::InvalidLength));
            }
        };

        if length > self.remaining() {
            return Err(self.err(DecodeErrorKind::TlvOverflow));
        }
        Ok((tag, length))
    }

    /// Read a TLV expecting a specific tag; returns the content bytes.
    fn read_expected(&mut self, expected: u8) -> Result<Bytes> {
        let start = self.offset();
        let (actual, length) = self.read_header()?;
        if actual != expected {
            return Err(Error::decode(
                start,
                DecodeErrorKind::UnexpectedTag { expected, actual },
            ));
        }
        let content = self.data.slice(self.pos..self.pos + length);
        self.pos += length;
        Ok(content)
    }

    /// Read any TLV, returning its tag and content bytes.
    pub fn read_any(&mut self) -> Result<(u8, Bytes)> {
        let (tag, length) = self.read_header()?;
        let content = self.data.slice(self.pos..self.pos + length);
        self.pos += length;
        Ok((tag, content))
    }

    /// Read a SEQUENCE header and return a sub-decoder over its content.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed TLV with the given tag (SEQUENCE or PDU) and
    /// return a sub-decoder over its content.
    pub fn read_constructed(&mut self, expected: u8) -> Result<Decoder> {
        let before = self.pos;
        let content = self.read_expected(expected)?;
        let header_len = (self.pos - before) - content.len();
        Ok(Decoder {
            base: self.base + before + header_len,
            data: content,
            pos: 0,
        })
    }

    /// Read an INTEGER as i32.
    pub fn read_integer(&mut self) -> Result<i32> {
        let start = self.offset();
        let content = self.read_expected(tag::universal::INTEGER)?;
        decode_signed(&content, start)
    }

    /// Read an unsigned 32-bit application type (Counter32, Gauge32,
    /// TimeTicks) with the given tag.
    pub fn read_unsigned32(&mut self, expected: u8) -> Result<u32> {
        let start = self.offset();
        let content = self.read_expected(expected)?;
        decode_unsigned32(&content, start)
    }

    /// Read a Counter64.
    pub fn read_unsigned64(&mut self) -> Result<u64> {
        let start = self.offset();
        let content = self.read_expected(tag::application::COUNTER64)?;
        decode_unsigned64(&content, start)
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        if self.peek_tag()? == tag::universal::OCTET_STRING_CONSTRUCTED {
            return Err(self.err(DecodeErrorKind::ConstructedOctetString));
        }
        self.read_expected(tag::universal::OCTET_STRING)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let start = self.offset();
        let content = self.read_expected(tag::universal::NULL)?;
        if !content.is_empty() {
            return Err(Error::decode(start, DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let start = self.offset();
        let content = self.read_expected(tag::universal::OBJECT_IDENTIFIER)?;
        Oid::from_ber(&content).map_err(|e| match e {
            Error::Decode { offset, kind } => Error::decode(start + offset, kind),
            other => other,
        })
    }

    /// Read an IpAddress (application tag, exactly 4 octets).
    pub fn read_ip_address(&mut self) -> Result<[u8; 4]> {
        let start = self.offset();
        let content = self.read_expected(tag::application::IP_ADDRESS)?;
        let octets: [u8; 4] = content[..].try_into().map_err(|_| {
            Error::decode(
                start,
                DecodeErrorKind::InvalidIpAddressLength {
                    length: content.len(),
                },
            )
        })?;
        Ok(octets)
    }
}

/// Decode two's-complement content octets into i32.
fn decode_signed(content: &[u8], offset: usize) -> Result<i32> {
    if content.is_empty() {
        return Err(Error::decode(offset, DecodeErrorKind::ZeroLengthInteger));
    }
    if content.len() > 4 {
        return Err(Error::decode(offset, DecodeErrorKind::IntegerOverflow));
    }
    let mut value: i32 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in content {
        value = (value << 8) | i32::from(b);
    }
    Ok(value)
}

/// Decode unsigned content octets into u32.
///
/// Accepts an optional leading 0x00 sign octet (5 octets total), matching
/// how agents encode values with the high bit set.
fn decode_unsigned32(content: &[u8], offset: usize) -> Result<u32> {
    if content.is_empty() {
        return Err(Error::decode(offset, DecodeErrorKind::ZeroLengthInteger));
    }
    let content = match content {
        [0x00, rest @ ..] if rest.len() == 4 => rest,
        _ if content.len() > 4 => {
            return Err(Error::decode(offset, DecodeErrorKind::IntegerOverflow));
        }
        _ => content,
    };
    let mut value: u32 = 0;
    for &b in content {
        value = (value << 8) | u32::from(b);
    }
    Ok(value)
}

/// Decode unsigned content octets into u64 (Counter64).
fn decode_unsigned64(content: &[u8], offset: usize) -> Result<u64> {
    if content.is_empty() {
        return Err(Error::decode(offset, DecodeErrorKind::ZeroLengthInteger));
    }
    let content = match content {
        [0x00, rest @ ..] if rest.len() == 8 => rest,
        _ if content.len() > 8 => {
            return Err(Error::decode(
                offset,
                DecodeErrorKind::Integer64TooLong {
                    length: content.len(),
                },
            ));
        }
        _ => content,
    };
    let mut value: u64 = 0;
    for &b in content {
        value = (value << 8) | u64::from(b);
    }
    Ok(value)
}
