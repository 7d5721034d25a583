use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use ulid::Ulid;

use crate::error::DecodeError;

/// Server-assigned identifier of an event record. Opaque to the client: it is only ever compared
/// and echoed back. Fresh ids are `evt_` followed by the URL-safe base64 of a ULID.
#[derive(PartialEq, Eq, Hash, Clone, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(Arc<str>);

impl EventId {
    pub const PREFIX: &'static str = "evt_";
    const MAX_LEN: usize = 64;

    pub fn generate() -> Self { EventId(format!("{}{}", Self::PREFIX, general_purpose::URL_SAFE_NO_PAD.encode(Ulid::new().to_bytes())).into()) }

    /// Accepts any non-empty identifier made of ASCII alphanumerics, `_` and `-`.
    pub fn parse(input: &str) -> Result<Self, DecodeError> {
        if input.is_empty() {
            return Err(DecodeError::Empty);
        }
        if input.len() > Self::MAX_LEN {
            return Err(DecodeError::InvalidLength);
        }
        if let Some(c) = input.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-')) {
            return Err(DecodeError::InvalidCharacter(c));
        }
        Ok(EventId(input.into()))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// The ULID inside a generated id, if this id was generated by [`EventId::generate`].
    pub fn ulid(&self) -> Result<Ulid, DecodeError> {
        let encoded = self.0.strip_prefix(Self::PREFIX).ok_or(DecodeError::MissingPrefix)?;
        let decoded = general_purpose::URL_SAFE_NO_PAD.decode(encoded)?;
        let bytes: [u8; 16] = decoded[..].try_into().map_err(|_| DecodeError::InvalidLength)?;
        Ok(Ulid::from_bytes(bytes))
    }

    pub fn to_short(&self) -> String {
        let value = self.as_str();
        value[value.len().saturating_sub(6)..].to_string()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if f.alternate() {
            write!(f, "{}", self.to_short())
        } else {
            write!(f, "{}", self.as_str())
        }
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

impl TryFrom<&str> for EventId {
    type Error = DecodeError;
    fn try_from(id: &str) -> Result<Self, Self::Error> { Self::parse(id) }
}

impl TryFrom<String> for EventId {
    type Error = DecodeError;
    fn try_from(id: String) -> Result<Self, Self::Error> { Self::parse(&id) }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self { id.0.to_string() }
}

impl std::str::FromStr for EventId {
    type Err = DecodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

/// Locally generated stand-in identifier for a record the server has not confirmed yet.
/// Never sent to the server.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TempId(Ulid);

impl TempId {
    pub fn new() -> Self { TempId(Ulid::new()) }

    pub fn to_base64(&self) -> String { general_purpose::URL_SAFE_NO_PAD.encode(self.0.to_bytes()) }
}

impl Default for TempId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_base64();
        write!(f, "tmp_{}", &value[value.len() - 6..])
    }
}

impl fmt::Debug for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "TempId({})", self.0) }
}
