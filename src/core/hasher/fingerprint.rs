//! The fixed-width fingerprint and its hex text form.
//!
//! Bits are stored most significant first, row-major over the hash grid,
//! so the hex string reads the grid left to right, top to bottom.

use crate::error::FingerprintError;
use hex::FromHexError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Longest input echoed back inside a `Malformed` error.
const MAX_ECHOED_CHARS: usize = 64;

/// A perceptual fingerprint of an image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Width produced by the default hash size of 8
    pub const DEFAULT_BITS: u32 = 64;

    /// Create a fingerprint from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Create a 64-bit fingerprint from an integer (big-endian bit order)
    pub fn from_u64(value: u64) -> Self {
        Self::from_bytes(value.to_be_bytes().to_vec())
    }

    /// The fingerprint as an integer, if it is exactly 64 bits wide
    pub fn as_u64(&self) -> Option<u64> {
        let array: [u8; 8] = self.bytes.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(array))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bits in this fingerprint
    pub fn bit_width(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Hamming distance to another fingerprint of the same width
    pub fn distance(&self, other: &Fingerprint) -> Result<u32, FingerprintError> {
        if self.bit_width() != other.bit_width() {
            return Err(FingerprintError::WidthMismatch {
                left: self.bit_width(),
                right: other.bit_width(),
            });
        }

        Ok(self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }

    /// Encode as a lowercase hex string (two characters per byte)
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Decode a hex string of any whole-byte width.
    ///
    /// Upper- and lowercase digits are accepted.
    pub fn from_hex(text: &str) -> Result<Self, FingerprintError> {
        if text.is_empty() {
            return Err(malformed(text, "empty string".to_string()));
        }

        let bytes = hex::decode(text).map_err(|e| {
            let reason = match e {
                FromHexError::OddLength => "odd number of hex digits".to_string(),
                FromHexError::InvalidHexCharacter { c, index } => {
                    format!("non-hex character {:?} at position {}", c, index)
                }
                other => other.to_string(),
            };
            malformed(text, reason)
        })?;

        Ok(Self { bytes })
    }
}

fn malformed(text: &str, reason: String) -> FingerprintError {
    FingerprintError::Malformed {
        value: text.chars().take(MAX_ECHOED_CHARS).collect(),
        reason,
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
