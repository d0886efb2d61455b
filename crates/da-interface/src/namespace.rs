use core::fmt;
use core::str::FromStr;

use celestia_types::nmt::{NS_ID_V0_SIZE, NS_SIZE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Errors produced while building a [`Namespace`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NamespaceError {
    /// The bytes are not a valid namespace of the DA layer.
    #[error("invalid namespace: {0}")]
    Invalid(String),
    /// The hex representation could not be decoded.
    #[error("invalid namespace hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl From<celestia_types::Error> for NamespaceError {
    fn from(err: celestia_types::Error) -> Self {
        NamespaceError::Invalid(err.to_string())
    }
}

/// A namespace partitions blobs on the DA layer.
///
/// Wraps the Celestia namespace so names are derived exactly the way the DA
/// layer does it, and adds the hex form used in logs, configs and on the command line.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace(celestia_types::nmt::Namespace);

impl Namespace {
    /// Derives the namespace of a human readable name: the first ten bytes of
    /// `sha256(name)` as a version zero namespace.
    pub fn from_string(name: &str) -> Self {
        let hash = Sha256::digest(name.as_bytes());
        let namespace = celestia_types::nmt::Namespace::new_v0(&hash[..NS_ID_V0_SIZE])
            .expect("doesn't exceed size");
        Self(namespace)
    }

    /// Parses raw namespace bytes, as they travel on the wire.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NamespaceError> {
        Ok(Self(celestia_types::nmt::Namespace::from_raw(bytes)?))
    }

    /// All 29 bytes of the namespace.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// `0x` prefixed hex encoding of the namespace bytes.
    pub fn hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.as_bytes()))
    }
}

impl From<celestia_types::nmt::Namespace> for Namespace {
    fn from(namespace: celestia_types::nmt::Namespace) -> Self {
        Self(namespace)
    }
}

impl From<Namespace> for celestia_types::nmt::Namespace {
    fn from(namespace: Namespace) -> Self {
        namespace.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex_string())
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.hex_string())
    }
}

impl FromStr for Namespace {
    type Err = NamespaceError;

    /// Parses the hex form, with or without the `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex_string())
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Namespace::from_str(&s).map_err(serde::de::Error::custom)
    }
}
