//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Provides the tag constants, definite-form length handling, the reverse
//! buffer encoder and the bounds-checked decoder used by the PDU layer.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
