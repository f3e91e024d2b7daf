//! Fixed-width identifiers observed on chain.
//!
//! All identifiers render as `0x`-prefixed lowercase hex and parse from hex with or
//! without the prefix. Ordering is bytewise so ledgers keyed by these types iterate
//! deterministically.

use bytes::BufMut;
use commonware_codec::{EncodeSize, Write};
use commonware_utils::{from_hex_formatted, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("not a hex string: {value}")]
    InvalidHex { value: String },
    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_hex(value: &str) -> Result<Self, ParseError> {
                let bytes = from_hex_formatted(value).ok_or_else(|| ParseError::InvalidHex {
                    value: value.to_string(),
                })?;
                let bytes: [u8; $len] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| ParseError::InvalidLength {
                            expected: $len,
                            got: bytes.len(),
                        })?;
                Ok(Self(bytes))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// True when every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{})", stringify!($name), hex(&self.0))
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = String::deserialize(deserializer)?;
                Self::from_hex(&value).map_err(serde::de::Error::custom)
            }
        }

        impl Write for $name {
            fn write(&self, writer: &mut impl BufMut) {
                writer.put_slice(&self.0);
            }
        }

        impl EncodeSize for $name {
            fn encode_size(&self) -> usize {
                $len
            }
        }
    };
}

fixed_bytes!(
    /// 32-byte storage node identifier. The player key.
    Overlay,
    32
);

fixed_bytes!(
    /// 20-byte account address owning a node.
    Account,
    20
);

fixed_bytes!(
    /// 32-byte reserve commitment hash disclosed in a reveal.
    RevealHash,
    32
);

fixed_bytes!(
    /// 32-byte per-round seed. The all-zero value means "no anchor".
    Anchor,
    32
);
