//! Record codec.
//!
//! Records are stored as opaque bytes. A [`Codec`] turns any serde type into
//! those bytes and back. Callers must not rely on the byte layout; the only
//! guarantee is that a value written with one type reads back with the same
//! type under the same codec.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Serialization format for stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Compact bincode encoding (default).
    #[default]
    Bincode,
    /// MessagePack with named struct fields.
    MessagePack,
}

impl Codec {
    /// Encode a value to bytes.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Bincode => bincode::serialize(value).map_err(|e| Error::Codec(e.to_string())),
            Codec::MessagePack => {
                rmp_serde::to_vec_named(value).map_err(|e| Error::Codec(e.to_string()))
            }
        }
    }

    /// Decode bytes produced by [`Codec::encode`].
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Codec::Bincode => bincode::deserialize(bytes).map_err(|e| Error::Codec(e.to_string())),
            Codec::MessagePack => {
                rmp_serde::from_slice(bytes).map_err(|e| Error::Codec(e.to_string()))
            }
        }
    }

    /// Short name, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Bincode => "bincode",
            Codec::MessagePack => "messagepack",
        }
    }
}
