//! SNMP typed values.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;

/// An SNMP value as carried in a variable binding.
///
/// Includes the SNMPv2c exception placeholders, which travel in the value
/// position of a varbind rather than as top-level PDU errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// INTEGER (signed 32-bit).
    Integer(i32),
    /// OCTET STRING.
    OctetString(Bytes),
    /// NULL. Also the placeholder value in request varbinds.
    Null,
    /// OBJECT IDENTIFIER.
    ObjectIdentifier(Oid),
    /// IpAddress (4 octets).
    IpAddress([u8; 4]),
    /// Counter32: monotonically increasing, wraps at 2^32.
    Counter32(u32),
    /// Gauge32 / Unsigned32.
    Gauge32(u32),
    /// TimeTicks: hundredths of a second.
    TimeTicks(u32),
    /// Counter64.
    Counter64(u64),
    /// Opaque: uninterpreted bytes.
    Opaque(Bytes),
    /// noSuchObject exception (v2c responses only).
    NoSuchObject,
    /// noSuchInstance exception (v2c responses only).
    NoSuchInstance,
    /// endOfMibView exception (v2c responses only).
    EndOfMibView,
}

/// Discriminant of a [`Value`], used for SET type checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    OctetString,
    Null,
    ObjectIdentifier,
    IpAddress,
    Counter32,
    Gauge32,
    TimeTicks,
    Counter64,
    Opaque,
    Exception,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Integer => "INTEGER",
            Self::OctetString => "OCTET STRING",
            Self::Null => "NULL",
            Self::ObjectIdentifier => "OBJECT IDENTIFIER",
            Self::IpAddress => "IpAddress",
            Self::Counter32 => "Counter32",
            Self::Gauge32 => "Gauge32",
            Self::TimeTicks => "TimeTicks",
            Self::Counter64 => "Counter64",
            Self::Opaque => "Opaque",
            Self::Exception => "exception",
        };
        write!(f, "{}", name)
    }
}

impl Value {
    /// The BER tag byte for this value.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Integer(_) => tag::universal::INTEGER,
            Value::OctetString(_) => tag::universal::OCTET_STRING,
            Value::Null => tag::universal::NULL,
            Value::ObjectIdentifier(_) => tag::universal::OBJECT_IDENTIFIER,
            Value::IpAddress(_) => tag::application::IP_ADDRESS,
            Value::Counter32(_) => tag::application::COUNTER32,
            Value::Gauge32(_) => tag::application::GAUGE32,
            Value::TimeTicks(_) => tag::application::TIMETICKS,
            Value::Counter64(_) => tag::application::COUNTER64,
            Value::Opaque(_) => tag::application::OPAQUE,
            Value::NoSuchObject => tag::context::NO_SUCH_OBJECT,
            Value::NoSuchInstance => tag::context::NO_SUCH_INSTANCE,
            Value::EndOfMibView => tag::context::END_OF_MIB_VIEW,
        }
    }

    /// The kind discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::OctetString(_) => ValueKind::OctetString,
            Value::Null => ValueKind::Null,
            Value::ObjectIdentifier(_) => ValueKind::ObjectIdentifier,
            Value::IpAddress(_) => ValueKind::IpAddress,
            Value::Counter32(_) => ValueKind::Counter32,
            Value::Gauge32(_) => ValueKind::Gauge32,
            Value::TimeTicks(_) => ValueKind::TimeTicks,
            Value::Counter64(_) => ValueKind::Counter64,
            Value::Opaque(_) => ValueKind::Opaque,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                ValueKind::Exception
            }
        }
    }

    /// True for the v2c exception placeholders.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Counter64(v) => buf.push_unsigned64(*v),
            Value::Opaque(data) => buf.push_primitive(tag::application::OPAQUE, data),
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                buf.push_empty(self.tag())
            }
        }
    }

    /// Decode from BER, dispatching on the next tag.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let next = decoder.peek_tag()?;
        match next {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer()?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_octet_string()?)),
            tag::universal::NULL => {
                decoder.read_null()?;
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => Ok(Value::ObjectIdentifier(decoder.read_oid()?)),
            tag::application::IP_ADDRESS => Ok(Value::IpAddress(decoder.read_ip_address()?)),
            tag::application::COUNTER32 => Ok(Value::Counter32(
                decoder.read_unsigned32(tag::application::COUNTER32)?,
            )),
            tag::application::GAUGE32 => Ok(Value::Gauge32(
                decoder.read_unsigned32(tag::application::GAUGE32)?,
            )),
            tag::application::TIMETICKS => Ok(Value::TimeTicks(
                decoder.read_unsigned32(tag::application::TIMETICKS)?,
            )),
            tag::application::COUNTER64 => Ok(Value::Counter64(decoder.read_unsigned64()?)),
            tag::application::OPAQUE => {
                let (_, content) = decoder.read_any()?;
                Ok(Value::Opaque(content))
            }
            tag::universal::OCTET_STRING_CONSTRUCTED => {
                let offset = decoder.offset();
                Err(Error::decode(
                    offset,
                    DecodeErrorKind::ConstructedOctetString,
                ))
            }
            tag::context::NO_SUCH_OBJECT
            | tag::context::NO_SUCH_INSTANCE
            | tag::context::END_OF_MIB_VIEW => {
                let offset = decoder.offset();
                let (tag_byte, content) = decoder.read_any()?;
                if !content.is_empty() {
                    return Err(Error::decode(offset, DecodeErrorKind::InvalidLength));
                }
                Ok(match tag_byte {
                    tag::context::NO_SUCH_OBJECT => Value::NoSuchObject,
                    tag::context::NO_SUCH_INSTANCE => Value::NoSuchInstance,
                    _ => Value::EndOfMibView,
                })
            }
            other => {
                let offset = decoder.offset();
                Err(Error::decode(
                    offset,
                    DecodeErrorKind::UnexpectedTag {
                        expected: tag::universal::NULL,
                        actual: other,
                    },
                ))
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "INTEGER: {}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "STRING: {}", s),
                Err(_) => {
                    write!(f, "Hex-STRING:")?;
                    for b in data.iter() {
                        write!(f, " {:02X}", b)?;
                    }
                    Ok(())
                }
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "OID: .{}", oid),
            Value::IpAddress([a, b, c, d]) => write!(f, "IpAddress: {}.{}.{}.{}", a, b, c, d),
            Value::Counter32(v) => write!(f, "Counter32: {}", v),
            Value::Gauge32(v) => write!(f, "Gauge32: {}", v),
            Value::TimeTicks(v) => write!(f, "Timeticks: ({})", v),
            Value::Counter64(v) => write!(f, "Counter64: {}", v),
            Value::Opaque(data) => {
                write!(f, "Opaque:")?;
                for b in data.iter() {
                    write!(f, " {:02X}", b)?;
                }
                Ok(())
            }
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn roundtrip(value: Value) -> Value {
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        let decoded = Value::decode(&mut decoder).unwrap();
        assert!(decoder.is_empty());
        decoded
    }

    #[test]
    fn test_roundtrip_all_variants() {
        let values = [
            Value::Integer(-42),
            Value::OctetString(Bytes::from_static(b"simulated device")),
            Value::Null,
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1)),
            Value::IpAddress([10, 0, 0, 1]),
            Value::Counter32(u32::MAX),
            Value::Gauge32(1_000_000_000),
            Value::TimeTicks(559299),
            Value::Counter64(u64::MAX),
            Value::Opaque(Bytes::from_static(&[0x9F, 0x78, 0x04])),
            Value::NoSuchObject,
            Value::NoSuchInstance,
            Value::EndOfMibView,
        ];
        for v in values {
            assert_eq!(roundtrip(v.clone()), v);
        }
    }

    #[test]
    fn test_exception_with_content_rejected() {
        // noSuchObject must be zero-length
        let mut decoder = Decoder::new(Bytes::from_static(&[0x80, 0x01, 0x00]));
        assert!(Value::decode(&mut decoder).is_err());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut decoder = Decoder::new(Bytes::from_static(&[0x47, 0x01, 0x00]));
        assert!(matches!(
            Value::decode(&mut decoder),
            Err(Error::Decode {
                kind: DecodeErrorKind::UnexpectedTag { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_kind_and_exception() {
        assert_eq!(Value::Integer(1).kind(), ValueKind::Integer);
        assert_eq!(Value::Gauge32(1).kind(), ValueKind::Gauge32);
        assert!(Value::EndOfMibView.is_exception());
        assert!(!Value::Null.is_exception());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(7).to_string(), "INTEGER: 7");
        assert_eq!(Value::from("up").to_string(), "STRING: up");
        assert_eq!(
            Value::ObjectIdentifier(oid!(1, 3, 6, 1)).to_string(),
            "OID: .1.3.6.1"
        );
        assert_eq!(Value::NoSuchObject.to_string(), "noSuchObject");
    }
}
