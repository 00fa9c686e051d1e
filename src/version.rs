//! SNMP version enumeration.

/// SNMP protocol version.
///
/// The simulator speaks the community-based versions only; SNMPv3 messages
/// are rejected at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// SNMPv1 (RFC 1157)
    V1,
    /// SNMPv2c (RFC 1901)
    #[default]
    V2c,
}

impl Version {
    /// Get the BER-encoded version number.
    pub const fn as_i32(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
        }
    }

    /// Create from BER-encoded version number.
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            _ => None,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(Version::V1.as_i32(), 0);
        assert_eq!(Version::V2c.as_i32(), 1);
        assert_eq!(Version::from_i32(0), Some(Version::V1));
        assert_eq!(Version::from_i32(1), Some(Version::V2c));
        // v3 (3) and garbage are rejected
        assert_eq!(Version::from_i32(3), None);
        assert_eq!(Version::from_i32(2), None);
    }
}
