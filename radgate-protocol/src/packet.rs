//! RADIUS packet decoding and encoding
//!
//! Packet format (RFC 2865 §3):
//! ```text
//! ┌──────┬────────────┬────────────┬──────────────────┬────────────┐
//! │ Code │ Identifier │ Length u16 │ Authenticator    │ Attributes │
//! │ 1    │ 1          │ 2 (BE)     │ 16               │ N          │
//! └──────┴────────────┴────────────┴──────────────────┴────────────┘
//! ```
//!
//! Decoding is structural. Accounting-Request packets additionally carry an
//! authenticator derived from the shared secret (RFC 2866 §3), which is
//! verified; a mismatch means the packet was not produced with our secret.

use crate::attribute::{Attribute, AttributeType};
use crate::constants::{AUTHENTICATOR_LEN, HEADER_LEN, MAX_ATTRIBUTE_VALUE_LEN, MAX_PACKET_LEN};
use bytes::{BufMut, Bytes, BytesMut};
use md5::{Digest, Md5};
use std::net::Ipv4Addr;

/// Decode/encode errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("shared secret is empty")]
    EmptySecret,

    #[error("packet too short: {0} bytes")]
    TooShort(usize),

    #[error("invalid packet length: header says {declared}, received {received}")]
    InvalidLength { declared: usize, received: usize },

    #[error("packet too large: {0} bytes exceeds {MAX_PACKET_LEN}")]
    TooLarge(usize),

    #[error("malformed attribute at offset {0}")]
    MalformedAttribute(usize),

    #[error("attribute value too long: {0} bytes")]
    AttributeTooLong(usize),

    #[error("request authenticator does not match the shared secret")]
    BadAuthenticator,
}

/// Packet codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    AccessRequest,
    AccessAccept,
    AccessReject,
    AccountingRequest,
    AccountingResponse,
    AccessChallenge,
    StatusServer,
    StatusClient,
    Other(u8),
}

impl From<u8> for Code {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::AccessRequest,
            2 => Self::AccessAccept,
            3 => Self::AccessReject,
            4 => Self::AccountingRequest,
            5 => Self::AccountingResponse,
            11 => Self::AccessChallenge,
            12 => Self::StatusServer,
            13 => Self::StatusClient,
            other => Self::Other(other),
        }
    }
}

impl From<Code> for u8 {
    fn from(code: Code) -> Self {
        match code {
            Code::AccessRequest => 1,
            Code::AccessAccept => 2,
            Code::AccessReject => 3,
            Code::AccountingRequest => 4,
            Code::AccountingResponse => 5,
            Code::AccessChallenge => 11,
            Code::StatusServer => 12,
            Code::StatusClient => 13,
            Code::Other(other) => other,
        }
    }
}

/// A decoded packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub code: Code,
    pub identifier: u8,
    pub authenticator: [u8; AUTHENTICATOR_LEN],
    pub attributes: Vec<Attribute>,
    secret: Bytes,
}

impl Packet {
    /// Create an empty packet bound to `secret`
    pub fn new(code: Code, identifier: u8, secret: impl Into<Bytes>) -> Self {
        Self {
            code,
            identifier,
            authenticator: [0u8; AUTHENTICATOR_LEN],
            attributes: Vec::new(),
            secret: secret.into(),
        }
    }

    /// Set the request authenticator (ignored for Accounting-Request, which is derived)
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: [u8; AUTHENTICATOR_LEN]) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Decode `buf` with the shared `secret`.
    pub fn decode(buf: &[u8], secret: &[u8]) -> Result<Self, PacketError> {
        if secret.is_empty() {
            return Err(PacketError::EmptySecret);
        }
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TooShort(buf.len()));
        }

        let declared = u16::from_be_bytes([buf[2], buf[3]]) as usize;
        if declared < HEADER_LEN || declared > MAX_PACKET_LEN || declared != buf.len() {
            return Err(PacketError::InvalidLength {
                declared,
                received: buf.len(),
            });
        }

        let mut attributes = Vec::new();
        let mut offset = HEADER_LEN;
        while offset < buf.len() {
            if buf.len() - offset < 2 {
                return Err(PacketError::MalformedAttribute(offset));
            }
            let attr_len = buf[offset + 1] as usize;
            if attr_len < 2 || offset + attr_len > buf.len() {
                return Err(PacketError::MalformedAttribute(offset));
            }
            attributes.push(Attribute {
                kind: buf[offset],
                value: Bytes::copy_from_slice(&buf[offset + 2..offset + attr_len]),
            });
            offset += attr_len;
        }

        let mut authenticator = [0u8; AUTHENTICATOR_LEN];
        authenticator.copy_from_slice(&buf[4..HEADER_LEN]);
        let code = Code::from(buf[0]);

        if code == Code::AccountingRequest
            && accounting_authenticator(buf, secret) != authenticator
        {
            return Err(PacketError::BadAuthenticator);
        }

        Ok(Self {
            code,
            identifier: buf[1],
            authenticator,
            attributes,
            secret: Bytes::copy_from_slice(secret),
        })
    }

    /// Encode to wire format.
    pub fn encode(&self) -> Result<Bytes, PacketError> {
        let length = HEADER_LEN
            + self
                .attributes
                .iter()
                .map(|a| 2 + a.value.len())
                .sum::<usize>();
        if length > MAX_PACKET_LEN {
            return Err(PacketError::TooLarge(length));
        }

        let mut buf = BytesMut::with_capacity(length);
        buf.put_u8(self.code.into());
        buf.put_u8(self.identifier);
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u16(length as u16);
        buf.put_slice(&self.authenticator);
        for attribute in &self.attributes {
            if attribute.value.len() > MAX_ATTRIBUTE_VALUE_LEN {
                return Err(PacketError::AttributeTooLong(attribute.value.len()));
            }
            buf.put_u8(attribute.kind);
            buf.put_u8((attribute.value.len() + 2) as u8);
            buf.put_slice(&attribute.value);
        }

        if self.code == Code::AccountingRequest {
            if self.secret.is_empty() {
                return Err(PacketError::EmptySecret);
            }
            let authenticator = accounting_authenticator(&buf, &self.secret);
            buf[4..HEADER_LEN].copy_from_slice(&authenticator);
        }

        Ok(buf.freeze())
    }

    /// Append an attribute
    pub fn add(
        &mut self,
        kind: AttributeType,
        value: impl Into<Bytes>,
    ) -> Result<(), PacketError> {
        let value = value.into();
        if value.len() > MAX_ATTRIBUTE_VALUE_LEN {
            return Err(PacketError::AttributeTooLong(value.len()));
        }
        self.attributes.push(Attribute::new(kind, value));
        Ok(())
    }

    /// First value of the given attribute type
    pub fn get(&self, kind: AttributeType) -> Option<&Bytes> {
        let kind = u8::from(kind);
        self.attributes
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| &a.value)
    }

    /// First value of the given attribute type as (lossy) text
    pub fn string(&self, kind: AttributeType) -> Option<String> {
        self.get(kind)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn user_name(&self) -> Option<String> {
        self.string(AttributeType::UserName)
    }

    pub fn calling_station_id(&self) -> Option<String> {
        self.string(AttributeType::CallingStationId)
    }

    pub fn nas_identifier(&self) -> Option<String> {
        self.string(AttributeType::NasIdentifier)
    }

    pub fn nas_ip_address(&self) -> Option<Ipv4Addr> {
        let value = self.get(AttributeType::NasIpAddress)?;
        let octets: [u8; 4] = value.as_ref().try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }

    pub fn nas_port(&self) -> Option<u32> {
        let value = self.get(AttributeType::NasPort)?;
        let bytes: [u8; 4] = value.as_ref().try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// Attribute dump for diagnostics, one `Type:` line followed by a `Value:` line per attribute
    pub fn attribute_strings(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.attributes.len() * 2);
        for attribute in &self.attributes {
            match AttributeType::from_u8(attribute.kind) {
                Some(kind) => lines.push(format!("Type: {} ({kind})", attribute.kind)),
                None => lines.push(format!("Type: {}", attribute.kind)),
            }
            lines.push(format!("Value: {}", attribute.display_value()));
        }
        lines
    }
}

/// MD5(Code + Identifier + Length + 16 zero octets + Attributes + Secret)
fn accounting_authenticator(packet: &[u8], secret: &[u8]) -> [u8; AUTHENTICATOR_LEN] {
    let mut hasher = Md5::new();
    hasher.update(&packet[..4]);
    hasher.update([0u8; AUTHENTICATOR_LEN]);
    hasher.update(&packet[HEADER_LEN..]);
    hasher.update(secret);
    let mut out = [0u8; AUTHENTICATOR_LEN];
    out.copy_from_slice(&hasher.finalize());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret";

    fn access_request() -> Packet {
        let mut packet = Packet::new(Code::AccessRequest, 7, SECRET)
            .with_authenticator([0xab; AUTHENTICATOR_LEN]);
        packet.add(AttributeType::UserName, "test").unwrap();
        packet
            .add(AttributeType::CallingStationId, "11-22-33-44-55-66")
            .unwrap();
        packet
    }

    #[test]
    fn test_access_request_decodes() {
        let bytes = access_request().encode().unwrap();
        let decoded = Packet::decode(&bytes, SECRET).unwrap();
        assert_eq!(decoded.code, Code::AccessRequest);
        assert_eq!(decoded.identifier, 7);
        assert_eq!(decoded.user_name().as_deref(), Some("test"));
        assert_eq!(
            decoded.calling_station_id().as_deref(),
            Some("11-22-33-44-55-66")
        );
        assert!(decoded.nas_identifier().is_none());
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(Packet::decode(&[], SECRET), Err(PacketError::TooShort(0)));
        assert!(Packet::decode(&[1u8; 19], SECRET).is_err());

        let mut bytes = access_request().encode().unwrap().to_vec();
        bytes.push(0);
        assert!(matches!(
            Packet::decode(&bytes, SECRET),
            Err(PacketError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_attribute() {
        let mut bytes = access_request().encode().unwrap().to_vec();
        // Claim the first attribute runs past the end of the packet.
        bytes[HEADER_LEN + 1] = 250;
        assert_eq!(
            Packet::decode(&bytes, SECRET),
            Err(PacketError::MalformedAttribute(HEADER_LEN))
        );
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let bytes = access_request().encode().unwrap();
        assert_eq!(Packet::decode(&bytes, b""), Err(PacketError::EmptySecret));
    }

    #[test]
    fn test_accounting_authenticator_is_verified() {
        let mut packet = Packet::new(Code::AccountingRequest, 1, SECRET);
        packet.add(AttributeType::AcctStatusType, vec![0, 0, 0, 1]).unwrap();
        packet.add(AttributeType::UserName, "test").unwrap();
        let bytes = packet.encode().unwrap();

        assert!(Packet::decode(&bytes, SECRET).is_ok());
        assert_eq!(
            Packet::decode(&bytes, b"other"),
            Err(PacketError::BadAuthenticator)
        );
    }

    #[test]
    fn test_nas_details() {
        let mut packet = access_request();
        packet
            .add(AttributeType::NasIpAddress, vec![192u8, 168, 1, 10])
            .unwrap();
        packet.add(AttributeType::NasPort, vec![0u8, 0, 0, 42]).unwrap();
        let decoded = Packet::decode(&packet.encode().unwrap(), SECRET).unwrap();
        assert_eq!(decoded.nas_ip_address(), Some(Ipv4Addr::new(192, 168, 1, 10)));
        assert_eq!(decoded.nas_port(), Some(42));
    }

    #[test]
    fn test_attribute_too_long() {
        let mut packet = Packet::new(Code::AccessRequest, 1, SECRET);
        let err = packet.add(AttributeType::UserName, vec![b'a'; 254]).unwrap_err();
        assert_eq!(err, PacketError::AttributeTooLong(254));
    }

    #[test]
    fn test_attribute_strings() {
        let lines = access_request().attribute_strings();
        assert_eq!(lines[0], "Type: 1 (User-Name)");
        assert_eq!(lines[1], "Value: test");
        assert_eq!(lines.len(), 4);
    }
}
