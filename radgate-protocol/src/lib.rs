//! radgate wire protocol
//!
//! Just enough of RADIUS (RFC 2865/2866) to decode the packets the relay
//! inspects: header validation, attribute walking, Accounting-Request
//! authenticators, and a handful of named attributes used by policy plugins.
//! Relayed bytes are never re-encoded; encoding exists for tests and tools.

pub mod attribute;
pub mod constants;
pub mod packet;

pub use attribute::{Attribute, AttributeType};
pub use packet::{Code, Packet, PacketError};
