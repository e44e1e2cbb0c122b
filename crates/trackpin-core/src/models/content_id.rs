//! Content identifiers for stored audio bytes.
//!
//! A [`ContentId`] is either a genuine content-addressed IPFS hash produced
//! by the pinning service, or a locally synthesized identifier scoped to the
//! local blob store. Callers branch on the variant instead of sniffing string
//! prefixes; the `local-` prefix exists only at the serialization boundary so
//! ids survive round trips through track records and CLI output.

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier naming stored bytes, remote (content-addressed) or local.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentId {
    /// A content-addressed IPFS hash (e.g. `QmABC123...`).
    Remote(String),
    /// A locally scoped identifier; bytes live in the local blob store only.
    Local(Uuid),
}

/// Serialization prefix for locally scoped identifiers.
const LOCAL_PREFIX: &str = "local-";

impl ContentId {
    /// Generate a fresh local identifier. Each call yields a distinct id:
    /// the local store is not content-addressed.
    pub fn new_local() -> Self {
        ContentId::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ContentId::Local(_))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Remote(hash) => write!(f, "{}", hash),
            ContentId::Local(id) => write!(f, "{}{}", LOCAL_PREFIX, id),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid content id: {0}")]
pub struct ParseContentIdError(String);

impl FromStr for ContentId {
    type Err = ParseContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseContentIdError("empty".to_string()));
        }
        if let Some(rest) = s.strip_prefix(LOCAL_PREFIX) {
            let id = Uuid::parse_str(rest).map_err(|_| ParseContentIdError(s.to_string()))?;
            return Ok(ContentId::Local(id));
        }
        Ok(ContentId::Remote(s.to_string()))
    }
}

impl serde::Serialize for ContentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ContentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
