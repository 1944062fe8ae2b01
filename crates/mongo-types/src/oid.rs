//! 12-byte object identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

use crate::error::TypeError;

/// Random bytes identifying this process: 5 for the id, 4 to seed the counter.
static PROCESS_RANDOM: Lazy<[u8; 16]> = Lazy::new(|| *uuid::Uuid::new_v4().as_bytes());

static COUNTER: Lazy<AtomicU32> = Lazy::new(|| {
    let r = &*PROCESS_RANDOM;
    AtomicU32::new(u32::from_be_bytes([r[8], r[9], r[10], r[11]]) & 0x00FF_FFFF)
});

/// A 12-byte object identifier.
///
/// Layout: 4-byte big-endian seconds timestamp, 5-byte per-process random
/// value, 3-byte big-endian counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Encoded length.
    pub const LEN: usize = 12;

    /// Generate a new identifier for the current time.
    #[must_use]
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&PROCESS_RANDOM[0..5]);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Wrap raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Seconds since the Unix epoch embedded in the id.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Parse a 24-character hex string.
    pub fn parse_str(s: &str) -> Result<Self, TypeError> {
        let raw = s.as_bytes();
        if raw.len() != 24 {
            return Err(TypeError::InvalidObjectId(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_digit(pair[0]).ok_or_else(|| TypeError::InvalidObjectId(s.to_string()))?;
            let lo = hex_digit(pair[1]).ok_or_else(|| TypeError::InvalidObjectId(s.to_string()))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Lowercase hex representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(24);
        for b in self.0 {
            out.push(DIGITS[(b >> 4) as usize] as char);
            out.push(DIGITS[(b & 0x0F) as usize] as char);
        }
        out
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let id: ObjectId = "507f1f77bcf86cd799439011".parse().unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
        assert_eq!(id.timestamp(), 0x507f1f77);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ObjectId::parse_str("507f1f77").is_err());
        assert!(ObjectId::parse_str("zz7f1f77bcf86cd799439011").is_err());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        // same process, same random segment
        assert_eq!(a.bytes()[4..9], b.bytes()[4..9]);
    }

    #[test]
    fn test_timestamp_is_current() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        let id = ObjectId::new();
        assert!(id.timestamp() <= now + 1 && id.timestamp() + 60 >= now);
    }
}
