//! Byte manipulation utilities shared by the codec, the protocol and the oracle.
//!
//! Provides big-endian word load/store (Ascon lanes are big-endian), XOR
//! helpers used by the share codec, and [`SecretValue`], an owned byte buffer
//! that zeroizes on drop.

use core::fmt;
use core::ops::Deref;
use serde::{Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An immutable secret byte sequence (key, nonce, data, ...) that zeroizes on drop.
///
/// Once constructed the contents cannot be mutated through the public API.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(Vec<u8>);

impl SecretValue {
    /// Wrap an owned buffer.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Copy a slice into a new secret value.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Returns the underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lower-case hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl Deref for SecretValue {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for SecretValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for SecretValue {
    fn from(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }
}

impl From<Vec<u8>> for SecretValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

// Test vectors are not secret in this harness; showing them is what the
// report is for.
impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue({})", self.to_hex())
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Load a 64-bit big-endian integer from a byte slice.
///
/// # Panics
/// Panics if the slice is shorter than 8 bytes.
#[inline]
pub fn load_be64(bytes: &[u8]) -> u64 {
    u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Store a 64-bit integer as big-endian bytes.
///
/// # Panics
/// Panics if the slice is shorter than 8 bytes.
#[inline]
pub fn store_be64(word: u64, bytes: &mut [u8]) {
    bytes[..8].copy_from_slice(&word.to_be_bytes());
}

/// Rotate a 64-bit word right by n bits.
#[inline]
pub const fn rotr64(word: u64, n: u32) -> u64 {
    word.rotate_right(n)
}

/// XOR source bytes into destination bytes.
///
/// # Panics
/// Panics if `dst.len() < src.len()`.
#[inline]
pub fn xor_bytes(src: &[u8], dst: &mut [u8]) {
    for (d, s) in dst[..src.len()].iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Upper-case hex rendering, the form the vector file uses for data lines.
pub fn to_upper_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
