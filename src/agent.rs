//! Request dispatcher for the simulated agent.
//!
//! One inbound datagram is one unit of work: decode, authorize, execute
//! against the store, encode the response. Per-packet failures (undecodable
//! bytes, bad communities) drop the packet without a reply and surface only
//! through tracing. Trap emission is a separate entry point; it never runs
//! in response to a client request.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::ErrorStatus;
use crate::oid;
use crate::oid::Oid;
use crate::pdu::{Message, Pdu, PduType};
use crate::store::{ObjectStore, SetError};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Upper bound on GETBULK repetitions actually honored, regardless of what
/// the request asks for. Caps response size against amplification abuse.
pub const MAX_BULK_REPETITIONS: usize = 256;

fn sys_uptime_oid() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}

fn snmp_trap_oid() -> Oid {
    oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
}

/// The simulated SNMP agent: an object store plus community authorization.
///
/// GET-family requests take the store's read lock; SET takes the write lock
/// for the full validate-then-commit pass. No I/O happens under either lock.
pub struct Agent {
    store: RwLock<ObjectStore>,
    read_community: Bytes,
    write_community: Bytes,
    trap_community: Bytes,
    trap_request_id: AtomicI32,
}

impl Agent {
    /// Create an agent over a populated store.
    pub fn new(
        store: ObjectStore,
        read_community: impl Into<Bytes>,
        write_community: impl Into<Bytes>,
        trap_community: impl Into<Bytes>,
    ) -> Self {
        Self {
            store: RwLock::new(store),
            read_community: read_community.into(),
            write_community: write_community.into(),
            trap_community: trap_community.into(),
            trap_request_id: AtomicI32::new(1),
        }
    }

    /// Handle one request datagram, producing the response datagram.
    ///
    /// `None` means no response is sent: undecodable bytes, a non-request
    /// PDU, or a community mismatch. Never panics on hostile input.
    pub fn handle_datagram(&self, data: Bytes) -> Option<Bytes> {
        let message = match Message::decode(data) {
            Ok(message) => message,
            Err(error) => {
                debug!(%error, "dropping undecodable datagram");
                return None;
            }
        };

        if !message.pdu.pdu_type.is_request() {
            debug!(pdu_type = %message.pdu.pdu_type, "dropping non-request PDU");
            return None;
        }
        if !self.authorize(&message) {
            // Real agents stay silent on bad communities rather than
            // acknowledging that the target exists.
            debug!(pdu_type = %message.pdu.pdu_type, "dropping request with bad community");
            return None;
        }

        trace!(
            version = %message.version,
            pdu_type = %message.pdu.pdu_type,
            request_id = message.pdu.request_id,
            varbinds = message.pdu.varbinds.len(),
            "dispatching request"
        );

        let response = self.execute(&message)?;
        Some(Message::new(message.version, message.community.clone(), response).encode())
    }

    fn authorize(&self, message: &Message) -> bool {
        let community = &message.community;
        match message.pdu.pdu_type {
            PduType::SetRequest => *community == self.write_community,
            _ => *community == self.read_community || *community == self.write_community,
        }
    }

    fn execute(&self, message: &Message) -> Option<Pdu> {
        let pdu = &message.pdu;
        let response = match pdu.pdu_type {
            PduType::GetRequest => self.execute_get(message.version, pdu),
            PduType::GetNextRequest => self.execute_get_next(message.version, pdu),
            PduType::GetBulkRequest => {
                if message.version == Version::V1 {
                    // GETBULK does not exist in SNMPv1 and endOfMibView is
                    // not expressible there; drop rather than guess.
                    debug!("dropping GETBULK in an SNMPv1 message");
                    return None;
                }
                self.execute_get_bulk(pdu)
            }
            PduType::SetRequest => self.execute_set(message.version, pdu),
            PduType::Response | PduType::TrapV2 => unreachable!("filtered by is_request"),
        };
        Some(response)
    }

    fn execute_get(&self, version: Version, pdu: &Pdu) -> Pdu {
        let store = self.read_store();
        let resolved: Vec<VarBind> = pdu
            .varbinds
            .iter()
            .map(|vb| {
                let value = store
                    .get(&vb.oid)
                    .cloned()
                    .unwrap_or(Value::NoSuchObject);
                VarBind::new(vb.oid.clone(), value)
            })
            .collect();

        match version {
            Version::V2c => response(pdu, ErrorStatus::NoError, 0, resolved),
            // v1 cannot carry per-varbind exceptions: the first missing OID
            // fails the whole PDU with noSuchName.
            Version::V1 => match first_exception_index(&resolved) {
                Some(idx) => response(
                    pdu,
                    ErrorStatus::NoSuchName,
                    idx as i32 + 1,
                    pdu.varbinds.clone(),
                ),
                None => response(pdu, ErrorStatus::NoError, 0, resolved),
            },
        }
    }

    fn execute_get_next(&self, version: Version, pdu: &Pdu) -> Pdu {
        let store = self.read_store();
        let resolved: Vec<VarBind> = pdu
            .varbinds
            .iter()
            .map(|vb| match store.get_next(&vb.oid) {
                Some((oid, value)) => VarBind::new(oid.clone(), value.clone()),
                None => VarBind::new(vb.oid.clone(), Value::EndOfMibView),
            })
            .collect();

        match version {
            Version::V2c => response(pdu, ErrorStatus::NoError, 0, resolved),
            Version::V1 => match first_exception_index(&resolved) {
                Some(idx) => response(
                    pdu,
                    ErrorStatus::NoSuchName,
                    idx as i32 + 1,
                    pdu.varbinds.clone(),
                ),
                None => response(pdu, ErrorStatus::NoError, 0, resolved),
            },
        }
    }

    fn execute_get_bulk(&self, pdu: &Pdu) -> Pdu {
        let store = self.read_store();
        let non_repeaters = pdu.non_repeaters().min(pdu.varbinds.len());
        let max_repetitions = pdu.max_repetitions().min(MAX_BULK_REPETITIONS);

        let mut resolved = Vec::new();

        // Non-repeaters resolve exactly like GETNEXT.
        for vb in &pdu.varbinds[..non_repeaters] {
            resolved.push(match store.get_next(&vb.oid) {
                Some((oid, value)) => VarBind::new(oid.clone(), value.clone()),
                None => VarBind::new(vb.oid.clone(), Value::EndOfMibView),
            });
        }

        // Repeaters walk forward up to max-repetitions each, flattened into
        // the response in request order.
        for vb in &pdu.varbinds[non_repeaters..] {
            let entries = store.get_bulk(&vb.oid, max_repetitions);
            if entries.is_empty() && max_repetitions > 0 {
                resolved.push(VarBind::new(vb.oid.clone(), Value::EndOfMibView));
                continue;
            }
            for (oid, value) in entries {
                resolved.push(VarBind::new(oid.clone(), value.clone()));
            }
        }

        response(pdu, ErrorStatus::NoError, 0, resolved)
    }

    fn execute_set(&self, version: Version, pdu: &Pdu) -> Pdu {
        let mut store = self.write_store();

        // Validate pass: find the first varbind the store would refuse.
        for (idx, vb) in pdu.varbinds.iter().enumerate() {
            if let Err(error) = store.check_set(&vb.oid, &vb.value) {
                let status = set_error_status(version, error);
                debug!(oid = %vb.oid, index = idx + 1, status = %status, "rejecting SET");
                return response(pdu, status, idx as i32 + 1, pdu.varbinds.clone());
            }
        }

        // Commit pass: every varbind already validated, still under the same
        // write lock, so this cannot partially apply.
        for vb in &pdu.varbinds {
            let committed = store.set(&vb.oid, vb.value.clone());
            debug_assert!(committed.is_ok(), "validated SET must commit");
        }

        response(pdu, ErrorStatus::NoError, 0, pdu.varbinds.clone())
    }

    /// Build an encoded SNMPv2c trap datagram under the trap community.
    ///
    /// Prepends the two bindings every v2c trap starts with: `sysUpTime.0`
    /// and `snmpTrapOID.0` (RFC 3416 §4.2.6). The caller decides where and
    /// when to send it.
    pub fn build_trap(&self, trap_oid: Oid, uptime: u32, varbinds: Vec<VarBind>) -> Bytes {
        let mut bindings = Vec::with_capacity(varbinds.len() + 2);
        bindings.push(VarBind::new(sys_uptime_oid(), Value::TimeTicks(uptime)));
        bindings.push(VarBind::new(
            snmp_trap_oid(),
            Value::ObjectIdentifier(trap_oid),
        ));
        bindings.extend(varbinds);

        let request_id = self.trap_request_id.fetch_add(1, Ordering::Relaxed);
        let pdu = Pdu::new(PduType::TrapV2, request_id, bindings);
        Message::new(Version::V2c, self.trap_community.clone(), pdu).encode()
    }

    fn read_store(&self) -> std::sync::RwLockReadGuard<'_, ObjectStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> std::sync::RwLockWriteGuard<'_, ObjectStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn response(request: &Pdu, status: ErrorStatus, error_index: i32, varbinds: Vec<VarBind>) -> Pdu {
    Pdu {
        pdu_type: PduType::Response,
        request_id: request.request_id,
        error_status: status.as_i32(),
        error_index,
        varbinds,
    }
}

fn first_exception_index(varbinds: &[VarBind]) -> Option<usize> {
    varbinds.iter().position(|vb| vb.value.is_exception())
}

fn set_error_status(version: Version, error: SetError) -> ErrorStatus {
    match (version, error) {
        (Version::V1, SetError::NoSuchObject) => ErrorStatus::NoSuchName,
        (Version::V1, SetError::WrongType { .. }) => ErrorStatus::BadValue,
        (Version::V2c, SetError::NoSuchObject) => ErrorStatus::NotWritable,
        (Version::V2c, SetError::WrongType { .. }) => ErrorStatus::WrongType,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn test_agent() -> Agent {
        let mut store = ObjectStore::new();
        store.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("simulated device"));
        store.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(559299));
        store.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("sim01"));
        store.insert(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(2));
        store.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4, 1), Value::Integer(1500));
        Agent::new(store, "public", "private", "public")
    }

    fn request(
        version: Version,
        community: &'static str,
        pdu_type: PduType,
        varbinds: Vec<VarBind>,
    ) -> Bytes {
        Message::new(
            version,
            Bytes::from_static(community.as_bytes()),
            Pdu::new(pdu_type, 42, varbinds),
        )
        .encode()
    }

    fn dispatch(agent: &Agent, datagram: Bytes) -> Message {
        Message::decode(agent.handle_datagram(datagram).expect("expected a response")).unwrap()
    }

    #[test]
    fn test_get_returns_exact_value() {
        let agent = test_agent();
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "public",
                PduType::GetRequest,
                vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
            ),
        );
        assert_eq!(reply.pdu.pdu_type, PduType::Response);
        assert_eq!(reply.pdu.request_id, 42);
        assert_eq!(reply.pdu.error_status, 0);
        assert_eq!(reply.pdu.varbinds[0].value, Value::from("simulated device"));
    }

    #[test]
    fn test_get_absent_oid_marks_no_such_object() {
        let agent = test_agent();
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "public",
                PduType::GetRequest,
                vec![
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)),
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)),
                ],
            ),
        );
        // Soft per-varbind failure: top-level status stays 0
        assert_eq!(reply.pdu.error_status, 0);
        assert_eq!(reply.pdu.varbinds[0].value, Value::from("simulated device"));
        assert_eq!(reply.pdu.varbinds[1].value, Value::NoSuchObject);
    }

    #[test]
    fn test_get_absent_oid_v1_fails_whole_pdu() {
        let agent = test_agent();
        let reply = dispatch(
            &agent,
            request(
                Version::V1,
                "public",
                PduType::GetRequest,
                vec![
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)),
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)),
                ],
            ),
        );
        assert_eq!(
            ErrorStatus::from_i32(reply.pdu.error_status),
            ErrorStatus::NoSuchName
        );
        assert_eq!(reply.pdu.error_index, 2);
        // Request varbinds echoed untouched, no exception values in v1
        assert_eq!(reply.pdu.varbinds[1].value, Value::Null);
    }

    #[test]
    fn test_get_next_walks_in_order() {
        let agent = test_agent();
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "public",
                PduType::GetNextRequest,
                vec![VarBind::null(oid!(1, 3, 6))],
            ),
        );
        assert_eq!(reply.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
    }

    #[test]
    fn test_get_next_past_end_marks_end_of_mib_view() {
        let agent = test_agent();
        let last = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4, 1);
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "public",
                PduType::GetNextRequest,
                vec![VarBind::null(last.clone())],
            ),
        );
        assert_eq!(reply.pdu.error_status, 0);
        assert_eq!(reply.pdu.varbinds[0].oid, last);
        assert_eq!(reply.pdu.varbinds[0].value, Value::EndOfMibView);
    }

    #[test]
    fn test_get_bulk_two_repetitions_over_five_entries() {
        let agent = test_agent();
        let mut datagram = Message::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::new(
                PduType::GetBulkRequest,
                42,
                vec![VarBind::null(oid!(1, 3, 6))],
            ),
        );
        datagram.pdu.error_status = 0; // non-repeaters
        datagram.pdu.error_index = 2; // max-repetitions
        let reply = dispatch(&agent, datagram.encode());

        assert_eq!(reply.pdu.varbinds.len(), 2);
        assert_eq!(reply.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
        assert_eq!(reply.pdu.varbinds[1].oid, oid!(1, 3, 6, 1, 2, 1, 1, 3, 0));
        assert!(reply.pdu.varbinds[0].oid < reply.pdu.varbinds[1].oid);
    }

    #[test]
    fn test_get_bulk_non_repeaters_and_repeaters() {
        let agent = test_agent();
        let mut datagram = Message::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::new(
                PduType::GetBulkRequest,
                7,
                vec![
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)), // non-repeater
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 2)),       // repeater
                ],
            ),
        );
        datagram.pdu.error_status = 1;
        datagram.pdu.error_index = 3;
        let reply = dispatch(&agent, datagram.encode());

        // One GETNEXT result, then up to 3 walked entries (only 2 exist)
        assert_eq!(reply.pdu.varbinds.len(), 3);
        assert_eq!(reply.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 3, 0));
        assert_eq!(reply.pdu.varbinds[1].oid, oid!(1, 3, 6, 1, 2, 1, 2, 1, 0));
        assert_eq!(reply.pdu.varbinds[2].oid, oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4, 1));
    }

    #[test]
    fn test_get_bulk_past_end_yields_end_of_mib_view() {
        let agent = test_agent();
        let mut datagram = Message::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::new(
                PduType::GetBulkRequest,
                8,
                vec![VarBind::null(oid!(1, 3, 7))],
            ),
        );
        datagram.pdu.error_index = 5;
        let reply = dispatch(&agent, datagram.encode());
        assert_eq!(reply.pdu.varbinds.len(), 1);
        assert_eq!(reply.pdu.varbinds[0].value, Value::EndOfMibView);
    }

    #[test]
    fn test_set_replaces_value_with_write_community() {
        let agent = test_agent();
        let target = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "private",
                PduType::SetRequest,
                vec![VarBind::new(target.clone(), Value::from("renamed"))],
            ),
        );
        assert_eq!(reply.pdu.error_status, 0);
        assert_eq!(reply.pdu.varbinds[0].value, Value::from("renamed"));

        // Subsequent GET observes the committed value
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "public",
                PduType::GetRequest,
                vec![VarBind::null(target)],
            ),
        );
        assert_eq!(reply.pdu.varbinds[0].value, Value::from("renamed"));
    }

    #[test]
    fn test_set_atomicity_on_middle_failure() {
        let agent = test_agent();
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "private",
                PduType::SetRequest,
                vec![
                    VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("a")),
                    VarBind::new(oid!(1, 3, 6, 1, 9, 9, 9), Value::from("b")), // absent
                    VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("c")),
                ],
            ),
        );
        assert_eq!(
            ErrorStatus::from_i32(reply.pdu.error_status),
            ErrorStatus::NotWritable
        );
        assert_eq!(reply.pdu.error_index, 2);

        // Nothing applied, including the varbind before the failing one
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "public",
                PduType::GetRequest,
                vec![
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)),
                    VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)),
                ],
            ),
        );
        assert_eq!(reply.pdu.varbinds[0].value, Value::from("simulated device"));
        assert_eq!(reply.pdu.varbinds[1].value, Value::from("sim01"));
    }

    #[test]
    fn test_set_type_mismatch_reports_wrong_type() {
        let agent = test_agent();
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "private",
                PduType::SetRequest,
                vec![VarBind::new(
                    oid!(1, 3, 6, 1, 2, 1, 2, 1, 0),
                    Value::from("not an integer"),
                )],
            ),
        );
        assert_eq!(
            ErrorStatus::from_i32(reply.pdu.error_status),
            ErrorStatus::WrongType
        );
        assert_eq!(reply.pdu.error_index, 1);
    }

    #[test]
    fn test_unknown_community_is_silent() {
        let agent = test_agent();
        let datagram = request(
            Version::V2c,
            "wrong",
            PduType::GetRequest,
            vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
        );
        assert!(agent.handle_datagram(datagram).is_none());
    }

    #[test]
    fn test_read_community_cannot_set() {
        let agent = test_agent();
        let datagram = request(
            Version::V2c,
            "public",
            PduType::SetRequest,
            vec![VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 5, 0),
                Value::from("nope"),
            )],
        );
        assert!(agent.handle_datagram(datagram).is_none());
        assert_eq!(
            dispatch(
                &agent,
                request(
                    Version::V2c,
                    "public",
                    PduType::GetRequest,
                    vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))],
                ),
            )
            .pdu
            .varbinds[0]
                .value,
            Value::from("sim01")
        );
    }

    #[test]
    fn test_write_community_can_read() {
        let agent = test_agent();
        let reply = dispatch(
            &agent,
            request(
                Version::V2c,
                "private",
                PduType::GetRequest,
                vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
            ),
        );
        assert_eq!(reply.pdu.error_status, 0);
    }

    #[test]
    fn test_undecodable_datagram_is_dropped() {
        let agent = test_agent();
        assert!(agent.handle_datagram(Bytes::from_static(&[0xFF, 0x00, 0x41])).is_none());
        assert!(agent.handle_datagram(Bytes::new()).is_none());
    }

    #[test]
    fn test_response_pdu_is_not_answered() {
        let agent = test_agent();
        let datagram = request(Version::V2c, "public", PduType::Response, vec![]);
        assert!(agent.handle_datagram(datagram).is_none());
    }

    #[test]
    fn test_v1_getbulk_is_dropped() {
        let agent = test_agent();
        let datagram = request(
            Version::V1,
            "public",
            PduType::GetBulkRequest,
            vec![VarBind::null(oid!(1, 3, 6))],
        );
        assert!(agent.handle_datagram(datagram).is_none());
    }

    #[test]
    fn test_build_trap_prepends_standard_bindings() {
        let agent = test_agent();
        let trap_oid = oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3); // linkDown
        let datagram = agent.build_trap(
            trap_oid.clone(),
            123456,
            vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 2), Value::Integer(2))],
        );

        let message = Message::decode(datagram).unwrap();
        assert_eq!(message.version, Version::V2c);
        assert_eq!(&message.community[..], b"public");
        assert_eq!(message.pdu.pdu_type, PduType::TrapV2);
        assert_eq!(message.pdu.varbinds.len(), 3);
        assert_eq!(message.pdu.varbinds[0].oid, sys_uptime_oid());
        assert_eq!(message.pdu.varbinds[0].value, Value::TimeTicks(123456));
        assert_eq!(message.pdu.varbinds[1].oid, snmp_trap_oid());
        assert_eq!(
            message.pdu.varbinds[1].value,
            Value::ObjectIdentifier(trap_oid)
        );
    }

    #[test]
    fn test_trap_request_ids_increment() {
        let agent = test_agent();
        let first = Message::decode(agent.build_trap(oid!(1, 3, 6, 1), 0, vec![])).unwrap();
        let second = Message::decode(agent.build_trap(oid!(1, 3, 6, 1), 0, vec![])).unwrap();
        assert_ne!(first.pdu.request_id, second.pdu.request_id);
    }
}
