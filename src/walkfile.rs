//! Walkfile parsing.
//!
//! A walkfile is a flat text dump of the object tree, one record per line
//! in the rendering `snmpwalk -On` produces:
//!
//! ```text
//! .1.3.6.1.2.1.1.1.0 = STRING: Simulated device
//! .1.3.6.1.2.1.1.2.0 = OID: .1.3.6.1.4.1
//! .1.3.6.1.2.1.1.3.0 = Timeticks: (559299) 1:33:12.99
//! .1.3.6.1.2.1.1.4.0 = ""
//! ```
//!
//! The last form is a present OID with a NULL value. Blank lines and lines
//! starting with `#` are ignored. Records may appear in any order; the
//! resulting store is sorted either way. Duplicate OIDs are an error.

use bytes::Bytes;

use crate::error::{Error, Result, WalkfileErrorKind};
use crate::oid::Oid;
use crate::store::ObjectStore;
use crate::value::Value;

/// Parse walkfile text into a populated [`ObjectStore`].
///
/// Pure transform: no I/O, no network. Errors carry the 1-based line number
/// of the offending record.
pub fn parse_walkfile(text: &str) -> Result<ObjectStore> {
    let mut store = ObjectStore::new();
    parse_into(text, &mut store)?;
    Ok(store)
}

/// Parse walkfile text into an existing store.
///
/// Lets several walkfiles merge into one simulated tree; an OID already
/// present in `store` counts as a duplicate.
pub fn parse_into(text: &str, store: &mut ObjectStore) -> Result<()> {
    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let (oid, value) = parse_record(line).map_err(|kind| Error::walkfile(lineno, kind))?;
        if store.contains(&oid) {
            return Err(Error::walkfile(lineno, WalkfileErrorKind::DuplicateOid));
        }
        store.insert(oid, value);
    }
    Ok(())
}

fn parse_record(line: &str) -> std::result::Result<(Oid, Value), WalkfileErrorKind> {
    let (oid_text, var) = line
        .split_once(" = ")
        .ok_or(WalkfileErrorKind::InvalidLine)?;

    let oid = Oid::parse(oid_text.trim()).map_err(|e| match e {
        Error::InvalidOid { kind, .. } => WalkfileErrorKind::InvalidOid(kind),
        _ => WalkfileErrorKind::InvalidLine,
    })?;

    // A record with no `TYPE:` part is a present OID with a NULL value
    // (snmpwalk renders these as `= ""` or nothing at all).
    let Some((type_name, rest)) = var.split_once(':') else {
        return Ok((oid, Value::Null));
    };
    let value_text = rest.strip_prefix(' ').unwrap_or(rest);

    let value = coerce_value(type_name, value_text)?;
    Ok((oid, value))
}

fn coerce_value(type_name: &str, text: &str) -> std::result::Result<Value, WalkfileErrorKind> {
    match type_name {
        "STRING" => Ok(Value::OctetString(Bytes::copy_from_slice(text.as_bytes()))),
        "Hex-STRING" => Ok(Value::OctetString(parse_hex_octets(text, "Hex-STRING")?)),
        "BITS" => Ok(Value::OctetString(parse_hex_octets(text, "BITS")?)),
        "INTEGER" => text
            .parse::<i32>()
            .map(Value::Integer)
            .map_err(|_| mismatch("INTEGER")),
        "OID" => Oid::parse(text.trim())
            .map(Value::ObjectIdentifier)
            .map_err(|_| mismatch("OID")),
        "IpAddress" => parse_ip(text).map(Value::IpAddress).ok_or(mismatch("IpAddress")),
        "Counter32" => text
            .parse::<u32>()
            .map(Value::Counter32)
            .map_err(|_| mismatch("Counter32")),
        "Gauge32" | "Unsigned32" => text
            .parse::<u32>()
            .map(Value::Gauge32)
            .map_err(|_| mismatch("Gauge32")),
        "Counter64" => text
            .parse::<u64>()
            .map(Value::Counter64)
            .map_err(|_| mismatch("Counter64")),
        "Timeticks" => parse_timeticks(text)
            .map(Value::TimeTicks)
            .ok_or(mismatch("Timeticks")),
        "Opaque" => Ok(Value::Opaque(parse_hex_octets(text, "Opaque")?)),
        other => Err(WalkfileErrorKind::UnknownType(other.to_string())),
    }
}

fn mismatch(type_name: &'static str) -> WalkfileErrorKind {
    WalkfileErrorKind::ValueTypeMismatch { type_name }
}

/// Parse `(559299) 1:33:12.99` or a bare tick count. The parenthesised
/// number is authoritative; the human-readable remainder is ignored.
fn parse_timeticks(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix('(') {
        let (ticks, _) = rest.split_once(')')?;
        return ticks.trim().parse().ok();
    }
    text.parse().ok()
}

/// Parse space-separated hex octets, e.g. `48 45 4C 4C 4F`.
fn parse_hex_octets(
    text: &str,
    type_name: &'static str,
) -> std::result::Result<Bytes, WalkfileErrorKind> {
    let mut out = Vec::new();
    for chunk in text.split_whitespace() {
        let byte = u8::from_str_radix(chunk, 16).map_err(|_| mismatch(type_name))?;
        out.push(byte);
    }
    Ok(Bytes::from(out))
}

fn parse_ip(text: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = text.trim().split('.');
    for slot in &mut octets {
        *slot = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}
