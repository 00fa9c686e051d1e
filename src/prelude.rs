//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use simsnmp::prelude::*;
//! ```
//!
//! This imports the core types ([`Oid`], [`Value`], [`VarBind`], [`Pdu`],
//! [`Message`]), error handling ([`Error`], [`Result`]), and the [`oid!`]
//! macro for compile-time OID construction.

pub use crate::config::RuntimeConfig;
pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::pdu::{Message, Pdu, PduType};
pub use crate::store::ObjectStore;
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
