//! BER definite-form length encoding and decoding.
//!
//! Short form for lengths below 128, long form with up to 4 length octets
//! otherwise. Indefinite form (0x80) is not used by SNMP and is rejected.

/// Maximum number of long-form length octets accepted.
///
/// Four octets already describe lengths far beyond any UDP datagram.
pub const MAX_LENGTH_OCTETS: usize = 4;

/// Encode a length in definite form.
///
/// Returns the octets in REVERSE order (for the reverse-buffer encoder)
/// together with the count of valid octets.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    if len < 0x80 {
        ([len as u8, 0, 0, 0, 0], 1)
    } else {
        let mut out = [0u8; 5];
        let mut n = 0;
        let mut v = len;
        while v > 0 {
            out[n] = (v & 0xFF) as u8;
            v >>= 8;
            n += 1;
        }
        // Reverse order: length octets first (low byte first), then the
        // initial octet 0x80 | count.
        out[n] = 0x80 | n as u8;
        (out, n + 1)
    }
}

/// Result of decoding a length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedLength {
    /// Definite length with the number of octets consumed from the input.
    Definite { length: usize, octets: usize },
    /// Indefinite form (initial octet 0x80). SNMP never uses this.
    Indefinite,
    /// Length field itself is truncated or over-long.
    Invalid,
}

/// Decode a BER length field from the start of `data`.
pub fn decode_length(data: &[u8]) -> DecodedLength {
    let Some(&first) = data.first() else {
        return DecodedLength::Invalid;
    };

    if first < 0x80 {
        return DecodedLength::Definite {
            length: first as usize,
            octets: 1,
        };
    }
    if first == 0x80 {
        return DecodedLength::Indefinite;
    }

    let count = (first & 0x7F) as usize;
    if count > MAX_LENGTH_OCTETS || data.len() < 1 + count {
        return DecodedLength::Invalid;
    }

    let mut length: usize = 0;
    for &b in &data[1..1 + count] {
        length = (length << 8) | b as usize;
    }
    DecodedLength::Definite {
        length,
        octets: 1 + count,
    }
}
