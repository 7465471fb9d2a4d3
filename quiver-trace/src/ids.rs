use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// Error emitted when parsing a trace or span identifier from hex.
#[derive(Debug, thiserror::Error)]
#[error("invalid hex identifier, expected {expected} bytes")]
pub struct ParseIdError {
    expected: usize,
}

macro_rules! impl_id {
    ($name:ident, $len:literal) => {
        impl $name {
            /// The all-zero identifier.
            pub const ZERO: Self = Self([0; $len]);

            /// Creates an identifier from raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Returns `true` if every byte of the identifier is zero.
            pub fn is_zero(&self) -> bool {
                *self == Self::ZERO
            }

            /// Returns the raw bytes of the identifier.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s).map_err(|_| ParseIdError { expected: $len })?;
                <[u8; $len]>::try_from(bytes.as_slice())
                    .map(Self)
                    .map_err(|_| ParseIdError { expected: $len })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let string = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
                string.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// A 16-byte trace identifier shared by all spans of one trace.
///
/// The all-zero value is not a valid identifier; span links carrying it are
/// removed by the link validator.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TraceId([u8; 16]);

impl_id!(TraceId, 16);

impl TraceId {
    /// Creates a trace identifier from an unsigned integer in big-endian order.
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }
}

/// An 8-byte span identifier, unique within a trace.
///
/// The all-zero value in a span's parent field means "no parent".
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SpanId([u8; 8]);

impl_id!(SpanId, 8);

impl SpanId {
    /// Creates a span identifier from an unsigned integer in big-endian order.
    pub const fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    /// Returns the identifier interpreted as a big-endian unsigned integer.
    pub const fn to_u64(self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Returns the next identifier in big-endian counter order, wrapping back
    /// to [`SpanId::ZERO`] at the end of the ID space.
    pub const fn wrapping_next(self) -> Self {
        Self(u64::from_be_bytes(self.0).wrapping_add(1).to_be_bytes())
    }
}
