//! Serde adapter for `U256` as a fixed 32-byte big-endian array.
//!
//! The default `primitive-types` serde impls emit hex strings, which is the
//! wrong shape for the binary wire codec and for persisted account records.
//! Encoding as `[u8; 32]` keeps both deterministic and compact.

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    buf.serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let buf = <[u8; 32]>::deserialize(deserializer)?;
    Ok(U256::from_big_endian(&buf))
}
