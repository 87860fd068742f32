//! Attribute types and values
//!
//! Only the attributes the relay needs for policy and diagnostics are named;
//! everything else is carried as an opaque type number.

use bytes::Bytes;
use std::fmt;

/// Named attribute types (RFC 2865 / RFC 2866 subset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeType {
    UserName = 1,
    UserPassword = 2,
    NasIpAddress = 4,
    NasPort = 5,
    ServiceType = 6,
    FramedIpAddress = 8,
    ReplyMessage = 18,
    State = 24,
    Class = 25,
    CalledStationId = 30,
    CallingStationId = 31,
    NasIdentifier = 32,
    AcctStatusType = 40,
    AcctSessionId = 44,
    NasPortType = 61,
    EapMessage = 79,
    MessageAuthenticator = 80,
}

impl AttributeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::UserName,
            2 => Self::UserPassword,
            4 => Self::NasIpAddress,
            5 => Self::NasPort,
            6 => Self::ServiceType,
            8 => Self::FramedIpAddress,
            18 => Self::ReplyMessage,
            24 => Self::State,
            25 => Self::Class,
            30 => Self::CalledStationId,
            31 => Self::CallingStationId,
            32 => Self::NasIdentifier,
            40 => Self::AcctStatusType,
            44 => Self::AcctSessionId,
            61 => Self::NasPortType,
            79 => Self::EapMessage,
            80 => Self::MessageAuthenticator,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UserName => "User-Name",
            Self::UserPassword => "User-Password",
            Self::NasIpAddress => "NAS-IP-Address",
            Self::NasPort => "NAS-Port",
            Self::ServiceType => "Service-Type",
            Self::FramedIpAddress => "Framed-IP-Address",
            Self::ReplyMessage => "Reply-Message",
            Self::State => "State",
            Self::Class => "Class",
            Self::CalledStationId => "Called-Station-Id",
            Self::CallingStationId => "Calling-Station-Id",
            Self::NasIdentifier => "NAS-Identifier",
            Self::AcctStatusType => "Acct-Status-Type",
            Self::AcctSessionId => "Acct-Session-Id",
            Self::NasPortType => "NAS-Port-Type",
            Self::EapMessage => "EAP-Message",
            Self::MessageAuthenticator => "Message-Authenticator",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<AttributeType> for u8 {
    fn from(kind: AttributeType) -> Self {
        kind as u8
    }
}

/// A single type-length-value attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: u8,
    pub value: Bytes,
}

impl Attribute {
    pub fn new(kind: impl Into<u8>, value: impl Into<Bytes>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Value rendered for diagnostics: text when printable, hex otherwise.
    pub fn display_value(&self) -> String {
        match std::str::from_utf8(&self.value) {
            Ok(text) if text.chars().all(|c| !c.is_control()) => text.to_string(),
            _ => {
                let hex: String = self.value.iter().map(|b| format!("{b:02x}")).collect();
                format!("(hex) {hex}")
            }
        }
    }
}
