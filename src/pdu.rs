//! SNMP PDU and message envelope codec.
//!
//! Wire layout (RFC 3416, community framing per RFC 1901):
//!
//! ```text
//! Message ::= SEQUENCE {
//!     version   INTEGER,
//!     community OCTET STRING,
//!     data      PDU          -- context-constructed, tag selects the type
//! }
//! PDU ::= SEQUENCE-like {
//!     request-id   INTEGER,
//!     error-status INTEGER,  -- non-repeaters for GETBULK
//!     error-index  INTEGER,  -- max-repetitions for GETBULK
//!     varbinds     SEQUENCE OF SEQUENCE { OID, value }
//! }
//! ```

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};
use crate::version::Version;

/// PDU type discriminant.
///
/// The SNMPv1 trap (0xA4) carries a different body layout and is not part
/// of this enum; it decodes to `UnknownPduType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    Response,
    SetRequest,
    GetBulkRequest,
    TrapV2,
}

impl PduType {
    /// The context-constructed BER tag for this PDU type.
    pub const fn as_tag(self) -> u8 {
        match self {
            PduType::GetRequest => tag::pdu::GET_REQUEST,
            PduType::GetNextRequest => tag::pdu::GET_NEXT_REQUEST,
            PduType::Response => tag::pdu::RESPONSE,
            PduType::SetRequest => tag::pdu::SET_REQUEST,
            PduType::GetBulkRequest => tag::pdu::GET_BULK_REQUEST,
            PduType::TrapV2 => tag::pdu::TRAP_V2,
        }
    }

    /// Classify a tag byte.
    pub const fn from_tag(value: u8) -> Option<Self> {
        match value {
            tag::pdu::GET_REQUEST => Some(PduType::GetRequest),
            tag::pdu::GET_NEXT_REQUEST => Some(PduType::GetNextRequest),
            tag::pdu::RESPONSE => Some(PduType::Response),
            tag::pdu::SET_REQUEST => Some(PduType::SetRequest),
            tag::pdu::GET_BULK_REQUEST => Some(PduType::GetBulkRequest),
            tag::pdu::TRAP_V2 => Some(PduType::TrapV2),
            _ => None,
        }
    }

    /// True for the request types an agent answers.
    pub const fn is_request(self) -> bool {
        matches!(
            self,
            PduType::GetRequest
                | PduType::GetNextRequest
                | PduType::SetRequest
                | PduType::GetBulkRequest
        )
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PduType::GetRequest => "GetRequest",
            PduType::GetNextRequest => "GetNextRequest",
            PduType::Response => "Response",
            PduType::SetRequest => "SetRequest",
            PduType::GetBulkRequest => "GetBulkRequest",
            PduType::TrapV2 => "SNMPv2-Trap",
        };
        write!(f, "{}", name)
    }
}

/// One SNMP protocol data unit.
///
/// For GETBULK requests `error_status` holds non-repeaters and
/// `error_index` holds max-repetitions; accessors below make that explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Create a request/trap PDU with zeroed error fields.
    pub fn new(pdu_type: PduType, request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// GETBULK non-repeaters, clamped to non-negative (RFC 3416 §4.2.3).
    pub fn non_repeaters(&self) -> usize {
        self.error_status.max(0) as usize
    }

    /// GETBULK max-repetitions, clamped to non-negative.
    pub fn max_repetitions(&self) -> usize {
        self.error_index.max(0) as usize
    }

    /// Encode this PDU into the buffer.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.as_tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    /// Decode a PDU (tag through varbind list).
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let offset = decoder.offset();
        let tag_byte = decoder.peek_tag()?;
        let Some(pdu_type) = PduType::from_tag(tag_byte) else {
            return Err(Error::decode(
                offset,
                DecodeErrorKind::UnknownPduType(tag_byte),
            ));
        };

        let mut body = decoder.read_constructed(tag_byte)?;
        let request_id = body.read_integer()?;
        let error_status = body.read_integer()?;
        let error_index = body.read_integer()?;
        let varbinds = decode_varbind_list(&mut body)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

/// The SNMP message envelope: version, community, PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub version: Version,
    pub community: Bytes,
    pub pdu: Pdu,
}

impl Message {
    /// Create a message.
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Encode the full message to wire bytes. Infallible for well-formed
    /// in-memory messages.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });
        buf.finish()
    }

    /// Decode a datagram into a message.
    ///
    /// Trailing bytes after the envelope are rejected: a datagram carries
    /// exactly one message.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut envelope = decoder.read_sequence()?;

        let version_raw = envelope.read_integer()?;
        let Some(version) = Version::from_i32(version_raw) else {
            return Err(Error::decode(
                0,
                DecodeErrorKind::UnknownVersion(version_raw),
            ));
        };

        let community = envelope.read_octet_string()?;
        let pdu = Pdu::decode(&mut envelope)?;

        if !envelope.is_empty() {
            return Err(Error::decode(
                envelope.offset(),
                DecodeErrorKind::TrailingData {
                    remaining: envelope.remaining(),
                },
            ));
        }
        if !decoder.is_empty() {
            return Err(Error::decode(
                decoder.offset(),
                DecodeErrorKind::TrailingData {
                    remaining: decoder.remaining(),
                },
            ));
        }

        Ok(Message {
            version,
            community,
            pdu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;
    use proptest::prelude::*;

    fn sample_request() -> Message {
        Message::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::new(
                PduType::GetRequest,
                0x1234,
                vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
            ),
        )
    }

    #[test]
    fn test_message_roundtrip() {
        let msg = sample_request();
        assert_eq!(Message::decode(msg.encode()).unwrap(), msg);
    }

    #[test]
    fn test_known_wire_encoding() {
        // SNMPv2c GetRequest for 1.3.6.1.2.1.1.1.0, community "public",
        // request-id 1, cross-checked against net-snmp output.
        let msg = Message::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::new(
                PduType::GetRequest,
                1,
                vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
            ),
        );
        let expected: &[u8] = &[
            0x30, 0x26, // Message SEQUENCE
            0x02, 0x01, 0x01, // version = 1 (v2c)
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
            0xA0, 0x19, // GetRequest PDU
            0x02, 0x01, 0x01, // request-id = 1
            0x02, 0x01, 0x00, // error-status = 0
            0x02, 0x01, 0x00, // error-index = 0
            0x30, 0x0E, // varbind list
            0x30, 0x0C, // varbind
            0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, // OID
            0x05, 0x00, // NULL
        ];
        assert_eq!(&msg.encode()[..], expected);
    }

    #[test]
    fn test_length_fields_match_payload() {
        let bytes = sample_request().encode();
        // Outer SEQUENCE length must describe the rest of the datagram exactly
        assert_eq!(bytes[1] as usize, bytes.len() - 2);
    }

    #[test]
    fn test_decode_rejects_v1_trap() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_constructed(tag::pdu::TRAP_V1, |buf| {
                buf.push_integer(0);
            });
            buf.push_octet_string(b"public");
            buf.push_integer(0);
        });
        assert!(matches!(
            Message::decode(buf.finish()),
            Err(Error::Decode {
                kind: DecodeErrorKind::UnknownPduType(0xA4),
                ..
            })
        ));
    }

    #[test]
    fn test_decode_rejects_v3() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_octet_string(b"");
            buf.push_integer(3);
        });
        assert!(matches!(
            Message::decode(buf.finish()),
            Err(Error::Decode {
                kind: DecodeErrorKind::UnknownVersion(3),
                ..
            })
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_garbage() {
        let mut bytes = sample_request().encode().to_vec();
        bytes.push(0x00);
        // Outer length no longer covers the datagram
        assert!(Message::decode(Bytes::from(bytes)).is_err());
    }

    #[test]
    fn test_decode_truncated_prefixes_never_panic() {
        let bytes = sample_request().encode();
        for n in 0..bytes.len() {
            let _ = Message::decode(bytes.slice(..n));
        }
    }

    #[test]
    fn test_getbulk_field_aliasing() {
        let pdu = Pdu {
            pdu_type: PduType::GetBulkRequest,
            request_id: 7,
            error_status: 1,  // non-repeaters
            error_index: 10,  // max-repetitions
            varbinds: vec![],
        };
        assert_eq!(pdu.non_repeaters(), 1);
        assert_eq!(pdu.max_repetitions(), 10);

        // Negative values clamp to zero
        let pdu = Pdu {
            error_status: -5,
            error_index: -1,
            ..pdu
        };
        assert_eq!(pdu.non_repeaters(), 0);
        assert_eq!(pdu.max_repetitions(), 0);
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i32>().prop_map(Value::Integer),
            proptest::collection::vec(any::<u8>(), 0..64)
                .prop_map(|v| Value::OctetString(Bytes::from(v))),
            Just(Value::Null),
            any::<u32>().prop_map(Value::Counter32),
            any::<u32>().prop_map(Value::Gauge32),
            any::<u32>().prop_map(Value::TimeTicks),
            any::<u64>().prop_map(Value::Counter64),
            any::<[u8; 4]>().prop_map(Value::IpAddress),
            Just(Value::NoSuchObject),
            Just(Value::EndOfMibView),
        ]
    }

    fn arb_pdu() -> impl Strategy<Value = Pdu> {
        (
            any::<i32>(),
            0i32..19,
            0i32..16,
            proptest::collection::vec(arb_value(), 0..8),
        )
            .prop_map(|(request_id, error_status, error_index, values)| Pdu {
                pdu_type: PduType::Response,
                request_id,
                error_status,
                error_index,
                varbinds: values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, i as u32, 0), v))
                    .collect(),
            })
    }

    proptest! {
        #[test]
        fn prop_message_roundtrip(pdu in arb_pdu()) {
            let msg = Message::new(Version::V2c, Bytes::from_static(b"public"), pdu);
            let decoded = Message::decode(msg.encode()).unwrap();
            prop_assert_eq!(decoded, msg);
        }

        #[test]
        fn prop_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = Message::decode(Bytes::from(data));
        }
    }
}
