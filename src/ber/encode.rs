//! BER encoding.
//!
//! Uses a reverse buffer: content is written back-to-front so constructed
//! types can prepend their length and tag once the content size is known,
//! without a pre-pass to compute lengths.

use super::length::encode_length;
use super::tag;
use bytes::Bytes;

/// Buffer for BER encoding that writes backwards.
///
/// Callers emit fields in REVERSE field order; [`EncodeBuf::finish`] flips
/// the buffer into wire order.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Prepend raw bytes (stored reversed internally).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Prepend a BER length field.
    pub fn push_length(&mut self, len: usize) {
        let (octets, count) = encode_length(len);
        // encode_length already returns octets in reverse order
        self.buf.extend_from_slice(&octets[..count]);
    }

    /// Prepend a tag byte.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Current number of encoded bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU).
    ///
    /// Runs the closure to emit contents, then wraps them with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start = self.len();
        f(self);
        let content_len = self.len() - start;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode an INTEGER in minimal two's-complement form.
    pub fn push_integer(&mut self, value: i32) {
        let bytes = value.to_be_bytes();
        let content = trim_signed(&bytes);
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag::universal::INTEGER);
    }

    /// Encode an unsigned 32-bit value with the given application tag
    /// (Counter32, Gauge32, TimeTicks).
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let mut bytes = [0u8; 5];
        bytes[1..].copy_from_slice(&value.to_be_bytes());
        let content = trim_unsigned(&bytes);
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag);
    }

    /// Encode a Counter64.
    pub fn push_unsigned64(&mut self, value: u64) {
        let mut bytes = [0u8; 9];
        bytes[1..].copy_from_slice(&value.to_be_bytes());
        let content = trim_unsigned(&bytes);
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag::application::COUNTER64);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Encode a zero-length value with an arbitrary tag (exception values).
    pub fn push_empty(&mut self, tag: u8) {
        self.push_length(0);
        self.push_tag(tag);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &crate::oid::Oid) {
        let ber = oid.to_ber();
        self.push_bytes(&ber);
        self.push_length(ber.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Encode an IpAddress.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_bytes(&addr);
        self.push_length(4);
        self.push_tag(tag::application::IP_ADDRESS);
    }

    /// Encode bytes under an arbitrary primitive tag (Opaque).
    pub fn push_primitive(&mut self, tag: u8, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag);
    }

    /// Finalize and return the encoded bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip redundant leading octets from a big-endian two's-complement value.
///
/// A leading 0x00 (or 0xFF) octet is redundant when the next octet repeats
/// the sign bit. At least one octet always remains.
fn trim_signed(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let (cur, next) = (bytes[start], bytes[start + 1]);
        let redundant = (cur == 0x00 && next & 0x80 == 0) || (cur == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}

/// Strip leading zero octets from an unsigned value, keeping one 0x00 when
/// the first significant octet has its high bit set (sign disambiguation).
fn trim_unsigned(bytes: &[u8]) -> &[u8] {
    debug_assert_eq!(bytes[0], 0);
    let mut start = 0;
    while start + 1 < bytes.len() && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0 {
        start += 1;
    }
    // All zero: keep a single 0x00
    if bytes[start..].iter().all(|&b| b == 0) {
        return &bytes[bytes.len() - 1..];
    }
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer_content(value: i32) -> Vec<u8> {
        trim_signed(&value.to_be_bytes()).to_vec()
    }

    fn unsigned_content(value: u32) -> Vec<u8> {
        let mut bytes = [0u8; 5];
        bytes[1..].copy_from_slice(&value.to_be_bytes());
        trim_unsigned(&bytes).to_vec()
    }

    #[test]
    fn test_minimal_integer_content() {
        assert_eq!(integer_content(0), vec![0x00]);
        assert_eq!(integer_content(1), vec![0x01]);
        assert_eq!(integer_content(127), vec![0x7F]);
        assert_eq!(integer_content(128), vec![0x00, 0x80]);
        assert_eq!(integer_content(-1), vec![0xFF]);
        assert_eq!(integer_content(-128), vec![0x80]);
        assert_eq!(integer_content(-129), vec![0xFF, 0x7F]);
        assert_eq!(integer_content(i32::MAX), vec![0x7F, 0xFF, 0xFF, 0xFF]);
        assert_eq!(integer_content(i32::MIN), vec![0x80, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_unsigned_content_sign_octet() {
        assert_eq!(unsigned_content(0), vec![0x00]);
        assert_eq!(unsigned_content(127), vec![0x7F]);
        // MSB set needs a 0x00 prefix to stay non-negative
        assert_eq!(unsigned_content(128), vec![0x00, 0x80]);
        assert_eq!(unsigned_content(256), vec![0x01, 0x00]);
        assert_eq!(
            unsigned_content(u32::MAX),
            vec![0x00, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_encode_null() {
        let mut buf = EncodeBuf::new();
        buf.push_null();
        assert_eq!(&buf.finish()[..], &[0x05, 0x00]);
    }

    #[test]
    fn test_encode_integer_tlv() {
        let mut buf = EncodeBuf::new();
        buf.push_integer(42);
        assert_eq!(&buf.finish()[..], &[0x02, 0x01, 0x2A]);
    }

    #[test]
    fn test_encode_octet_string() {
        let mut buf = EncodeBuf::new();
        buf.push_octet_string(b"hi");
        assert_eq!(&buf.finish()[..], &[0x04, 0x02, b'h', b'i']);
    }

    #[test]
    fn test_encode_sequence() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            // Reverse buffer: last field first
            buf.push_integer(2);
            buf.push_integer(1);
        });
        assert_eq!(
            &buf.finish()[..],
            &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]
        );
    }

    #[test]
    fn test_encode_long_form_length() {
        let payload = vec![0xAB; 200];
        let mut buf = EncodeBuf::new();
        buf.push_octet_string(&payload);
        let bytes = buf.finish();
        assert_eq!(&bytes[..3], &[0x04, 0x81, 200]);
        assert_eq!(bytes.len(), 3 + 200);
    }
}
