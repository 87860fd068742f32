//! Protocol constants

/// Size of the fixed packet header (code, identifier, length, authenticator)
pub const HEADER_LEN: usize = 20;

/// Largest packet permitted by RFC 2865
pub const MAX_PACKET_LEN: usize = 4096;

/// Length of the request/response authenticator
pub const AUTHENTICATOR_LEN: usize = 16;

/// Largest attribute value (attribute length is one byte including 2 header bytes)
pub const MAX_ATTRIBUTE_VALUE_LEN: usize = 253;
