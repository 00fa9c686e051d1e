//! simsnmp - an SNMP device simulator.
//!
//! Feed it a walkfile (the flat text dump `snmpwalk -On` produces) and it
//! behaves, over UDP, like the device that dump was captured from: GET,
//! GETNEXT and GETBULK answer from the recorded tree, SET mutates it under
//! the write community, and SNMPv2c traps can be built and sent on demand.
//! No real hardware is involved; the intended users are integration tests
//! and network-tooling development.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use simsnmp::prelude::*;
//! use simsnmp::{agent::Agent, transport::Server, walkfile};
//!
//! # async fn run() -> Result<()> {
//! let store = walkfile::parse_walkfile(".1.3.6.1.2.1.1.5.0 = STRING: sim01\n")?;
//! let agent = Arc::new(Agent::new(store, "public", "private", "public"));
//! let server = Server::bind("127.0.0.1:9161".parse().unwrap(), agent).await?;
//! server.run().await
//! # }
//! ```
//!
//! # Protocol coverage
//!
//! SNMPv1 and SNMPv2c over UDP. SNMPv3 messages and SNMPv1 traps (0xA4,
//! which use an incompatible body layout) are rejected at decode time.
//! Responses follow RFC 3416 semantics: v2c reports missing objects with
//! per-varbind exception values, v1 with a whole-PDU `noSuchName`.

pub mod agent;
pub mod ber;
pub mod config;
pub mod error;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod store;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;
pub mod walkfile;

pub use error::{Error, Result};
