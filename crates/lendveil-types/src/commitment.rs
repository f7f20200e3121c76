use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScalarWidthError;

/// Width in bits of the ledger's native scalar field.
pub const SCALAR_BITS: u32 = 251;

/// Byte width of the big-endian commitment encoding.
pub const COMMITMENT_BYTES: usize = 32;

/// Mask applied to the most significant byte to keep a value below `2^SCALAR_BITS`.
const TOP_BYTE_MASK: u8 = 0xff >> (COMMITMENT_BYTES as u32 * 8 - SCALAR_BITS);

/// Commitment: a stable, pseudonymous owner identifier.
///
/// Stored as a 32-byte big-endian integer that always fits the ledger scalar
/// (`< 2^251`). Once constructed it is treated as opaque: it is compared,
/// hashed and printed, never re-derived or re-truncated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Commitment([u8; COMMITMENT_BYTES]);

impl Commitment {
    /// Reduce a full-width digest into the scalar field by masking its high bits.
    ///
    /// This is the single truncation point in the system; only the identity
    /// derivation should call it.
    pub fn reduce_digest(mut digest: [u8; COMMITMENT_BYTES]) -> Self {
        digest[0] &= TOP_BYTE_MASK;
        Self(digest)
    }

    /// Accept an externally supplied big-endian value, failing if it does not fit.
    pub fn try_from_be_bytes(bytes: [u8; COMMITMENT_BYTES]) -> Result<Self, ScalarWidthError> {
        let bits = bit_length(&bytes);
        if bits > SCALAR_BITS {
            return Err(ScalarWidthError::Overflow { bits });
        }
        Ok(Self(bytes))
    }

    /// Accept a big-endian value shorter than 32 bytes (left-padded with zeros).
    pub fn try_from_be_slice(bytes: &[u8]) -> Result<Self, ScalarWidthError> {
        if bytes.len() > COMMITMENT_BYTES {
            return Err(ScalarWidthError::InvalidLength {
                expected: COMMITMENT_BYTES,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; COMMITMENT_BYTES];
        buf[COMMITMENT_BYTES - bytes.len()..].copy_from_slice(bytes);
        Self::try_from_be_bytes(buf)
    }

    /// Raw big-endian bytes.
    pub fn as_bytes(&self) -> &[u8; COMMITMENT_BYTES] {
        &self.0
    }

    /// Number of significant bits in the value.
    pub fn bit_length(&self) -> u32 {
        bit_length(&self.0)
    }

    /// Full `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Short display form (first 6 bytes hex).
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

fn bit_length(bytes: &[u8; COMMITMENT_BYTES]) -> u32 {
    for (i, b) in bytes.iter().enumerate() {
        if *b != 0 {
            let remaining_bytes = (COMMITMENT_BYTES - i - 1) as u32;
            return remaining_bytes * 8 + (8 - b.leading_zeros());
        }
    }
    0
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", self.short())
    }
}

impl FromStr for Commitment {
    type Err = ScalarWidthError;

    /// Parse a hex value, with or without `0x`, with or without leading zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix("0x")
            .or_else(|| s.trim().strip_prefix("0X"))
            .unwrap_or_else(|| s.trim());
        if digits.is_empty() {
            return Err(ScalarWidthError::InvalidHex(s.to_string()));
        }
        let padded;
        let digits = if digits.len() % 2 == 1 {
            padded = format!("0{digits}");
            padded.as_str()
        } else {
            digits
        };
        let bytes = hex::decode(digits).map_err(|_| ScalarWidthError::InvalidHex(s.to_string()))?;
        Self::try_from_be_slice(&bytes)
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reduce_digest_clears_high_bits() {
        let c = Commitment::reduce_digest([0xff; COMMITMENT_BYTES]);
        assert_eq!(c.as_bytes()[0], 0x07);
        assert_eq!(c.bit_length(), SCALAR_BITS);
    }

    #[test]
    fn overflowing_value_rejected() {
        let mut bytes = [0u8; COMMITMENT_BYTES];
        bytes[0] = 0x08;
        let err = Commitment::try_from_be_bytes(bytes).unwrap_err();
        assert_eq!(err, ScalarWidthError::Overflow { bits: 252 });
    }

    #[test]
    fn max_scalar_accepted() {
        let mut bytes = [0xff; COMMITMENT_BYTES];
        bytes[0] = 0x07;
        assert!(Commitment::try_from_be_bytes(bytes).is_ok());
    }

    #[test]
    fn parse_accepts_short_and_prefixed_forms() {
        let a: Commitment = "0x1f".parse().unwrap();
        let b: Commitment = "01F".parse().unwrap();
        let c: Commitment = "0x000000000000000000000000000000000000000000000000000000000000001f"
            .parse()
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.bit_length(), 5);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            "0xzz".parse::<Commitment>(),
            Err(ScalarWidthError::InvalidHex(_))
        ));
        assert!("".parse::<Commitment>().is_err());
        let too_long = format!("0x{}", "1".repeat(66));
        assert!(matches!(
            too_long.parse::<Commitment>(),
            Err(ScalarWidthError::InvalidLength { .. })
        ));
    }

    #[test]
    fn odd_digit_counts_pad_on_the_left() {
        let c: Commitment = "0xabc".parse().unwrap();
        assert_eq!(&c.as_bytes()[30..], &[0x0a, 0xbc]);
        assert_eq!(c.short(), "000000000000");
        assert!(c.to_hex().ends_with("0abc"));
        assert!(matches!(
            "0xab g".parse::<Commitment>(),
            Err(ScalarWidthError::InvalidHex(_))
        ));
    }

    #[test]
    fn parse_rejects_values_wider_than_scalar() {
        let wide = format!("0x{}", "f".repeat(64));
        assert!(matches!(
            wide.parse::<Commitment>(),
            Err(ScalarWidthError::Overflow { bits: 256 })
        ));
    }

    #[test]
    fn serializes_as_hex_string() {
        let c: Commitment = "0xabc".parse().unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, format!("\"{}\"", c.to_hex()));
        let back: Commitment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    proptest! {
        #[test]
        fn reduced_digest_always_fits(bytes in any::<[u8; 32]>()) {
            let c = Commitment::reduce_digest(bytes);
            prop_assert!(c.bit_length() <= SCALAR_BITS);
            prop_assert!(Commitment::try_from_be_bytes(*c.as_bytes()).is_ok());
        }

        #[test]
        fn hex_form_parses_back(bytes in any::<[u8; 32]>()) {
            let c = Commitment::reduce_digest(bytes);
            prop_assert_eq!(c.to_hex().parse::<Commitment>().unwrap(), c);
        }
    }
}
