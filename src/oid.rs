//! Object identifier type with SNMP lexicographic ordering.
//!
//! OIDs are stored as a flat sequence of `u32` arcs. Ordering compares
//! arc-by-arc, and a strict prefix sorts before its extensions, which is the
//! order GETNEXT/GETBULK traversal depends on: `1.3.6` < `1.3.6.1` < `1.3.7`.

use smallvec::SmallVec;

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};

/// Maximum number of arcs accepted in an OID (RFC 2578 limit).
pub const MAX_OID_LEN: usize = 128;

/// Inline capacity: covers typical MIB-2 instance OIDs without heap allocation.
const INLINE_ARCS: usize = 12;

/// An SNMP object identifier.
///
/// Immutable value type. `Ord` is the canonical SNMP numeric-tuple comparison
/// used for store sorting and tree traversal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; INLINE_ARCS]>,
}

impl Oid {
    /// Create an OID from arcs, validating X.660 constraints.
    pub fn new(arcs: impl Into<SmallVec<[u32; INLINE_ARCS]>>) -> Result<Self> {
        let arcs = arcs.into();
        validate_arcs(&arcs)?;
        Ok(Self { arcs })
    }

    /// Create an OID from arcs without validation.
    ///
    /// Used by the `oid!` macro and internal code paths where the arcs are
    /// known to be well-formed.
    pub fn from_arcs_unchecked(arcs: impl Into<SmallVec<[u32; INLINE_ARCS]>>) -> Self {
        Self { arcs: arcs.into() }
    }

    /// Parse dotted-integer notation, e.g. `1.3.6.1.2.1.1.1.0`.
    ///
    /// A leading dot (net-snmp walk output convention) is accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.strip_prefix('.').unwrap_or(input);
        if text.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, input));
        }

        let mut arcs = SmallVec::new();
        for part in text.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, input))?;
            arcs.push(arc);
        }

        validate_arcs(&arcs).map_err(|e| match e {
            Error::InvalidOid { kind, .. } => Error::invalid_oid_with_input(kind, input),
            other => other,
        })?;
        Ok(Self { arcs })
    }

    /// The arcs as a slice.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    #[allow(clippy::len_without_is_empty)] // a valid OID is never empty
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Whether `self` begins with all arcs of `prefix`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.len() >= prefix.arcs.len() && self.arcs[..prefix.arcs.len()] == prefix.arcs[..]
    }

    /// Encode the arcs in BER content form (no tag/length).
    ///
    /// The first two arcs are packed as `40 * first + second`, the rest are
    /// base-128 with the continuation bit in each non-final octet.
    pub fn to_ber(&self) -> SmallVec<[u8; 32]> {
        let mut out = SmallVec::new();
        debug_assert!(self.arcs.len() >= 2);

        let head = self.arcs[0] * 40 + self.arcs[1];
        push_subidentifier(&mut out, head);
        for &arc in &self.arcs[2..] {
            push_subidentifier(&mut out, arc);
        }
        out
    }

    /// Decode BER content octets (no tag/length) into an OID.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::decode(0, DecodeErrorKind::InvalidOidEncoding));
        }

        let mut arcs: SmallVec<[u32; INLINE_ARCS]> = SmallVec::new();
        let mut value: u32 = 0;
        let mut in_subid = false;

        for (i, &byte) in data.iter().enumerate() {
            // Leading 0x80 octets would be a non-minimal subidentifier.
            if !in_subid && byte == 0x80 {
                return Err(Error::decode(i, DecodeErrorKind::InvalidOidEncoding));
            }
            value = value
                .checked_mul(128)
                .ok_or_else(|| Error::invalid_oid(OidErrorKind::SubidentifierOverflow))?
                .checked_add(u32::from(byte & 0x7F))
                .ok_or_else(|| Error::invalid_oid(OidErrorKind::SubidentifierOverflow))?;

            if byte & 0x80 != 0 {
                in_subid = true;
                continue;
            }

            if arcs.is_empty() {
                // Unpack the combined first subidentifier.
                if value < 40 {
                    arcs.push(0);
                    arcs.push(value);
                } else if value < 80 {
                    arcs.push(1);
                    arcs.push(value - 40);
                } else {
                    arcs.push(2);
                    arcs.push(value - 80);
                }
            } else {
                arcs.push(value);
            }
            if arcs.len() > MAX_OID_LEN {
                return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                }));
            }
            value = 0;
            in_subid = false;
        }

        if in_subid {
            // Last subidentifier had its continuation bit set.
            return Err(Error::decode(
                data.len(),
                DecodeErrorKind::InvalidOidEncoding,
            ));
        }
        Ok(Self { arcs })
    }
}

fn validate_arcs(arcs: &[u32]) -> Result<()> {
    match arcs {
        [] => Err(Error::invalid_oid(OidErrorKind::Empty)),
        [_] => Err(Error::invalid_oid(OidErrorKind::TooShort)),
        [first, ..] if *first > 2 => Err(Error::invalid_oid(OidErrorKind::InvalidFirstArc(*first))),
        [first @ (0 | 1), second, ..] if *second >= 40 => {
            Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                first: *first,
                second: *second,
            }))
        }
        // The packed first subidentifier 80 + second must fit in u32, which
        // is also the most a decoded subidentifier can hold.
        [2, second, ..] if *second > u32::MAX - 80 => {
            Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                first: 2,
                second: *second,
            }))
        }
        _ if arcs.len() > MAX_OID_LEN => Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
            count: arcs.len(),
            max: MAX_OID_LEN,
        })),
        _ => Ok(()),
    }
}

fn push_subidentifier(out: &mut SmallVec<[u8; 32]>, value: u32) {
    if value < 0x80 {
        out.push(value as u8);
        return;
    }
    let mut chunks = [0u8; 5];
    let mut n = 0;
    let mut v = value;
    while v > 0 {
        chunks[n] = (v & 0x7F) as u8;
        v >>= 7;
        n += 1;
    }
    for i in (0..n).rev() {
        let cont = if i == 0 { 0 } else { 0x80 };
        out.push(chunks[i] | cont);
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

/// Construct an [`Oid`] from literal arcs.
///
/// ```
/// use simsnmp::prelude::*;
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),+ $(,)?) => {
        $crate::oid::Oid::from_arcs_unchecked(
            ::smallvec::smallvec![$($arc as u32),+]
        )
    };
}
