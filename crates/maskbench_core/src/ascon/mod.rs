//! Ascon-128 authenticated encryption and Ascon-Hash on pre-padded input.
//!
//! The test bench applies 10* padding itself (see [`crate::padding`]) before
//! the data is shared and loaded into the hardware core. To compare like with
//! like, these functions absorb the caller's blocks as given and never pad
//! again. Every input they take must therefore be a multiple of
//! [`RATE`] bytes.
//!
//! The result equals standard Ascon-128 / Ascon-Hash on the unpadded data,
//! except that the last ciphertext block is returned in full instead of being
//! truncated to the plaintext length.
//!
//! ## Available Functions
//!
//! - [`aead::encrypt`]: ciphertext ‖ 16-byte tag
//! - [`aead::decrypt`]: plaintext if the tag verifies
//! - [`hash::hash`]: 32-byte digest

use core::fmt;

pub mod aead;
pub mod hash;
pub mod permutation;

pub use aead::{decrypt, encrypt};
pub use hash::hash;
pub use permutation::State;

/// Rate in bytes for both AEAD and hash.
pub const RATE: usize = 8;

/// Key size in bytes.
pub const KEY_SIZE: usize = 16;

/// Nonce size in bytes.
pub const NONCE_SIZE: usize = 16;

/// Tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Digest size in bytes.
pub const HASH_SIZE: usize = 32;

/// Errors from the Ascon functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsconError {
    /// Key is not [`KEY_SIZE`] bytes.
    InvalidKeyLength(usize),
    /// Nonce is not [`NONCE_SIZE`] bytes.
    InvalidNonceLength(usize),
    /// Tag is not [`TAG_SIZE`] bytes.
    InvalidTagLength(usize),
    /// Input is not a multiple of [`RATE`] bytes (or empty where a block is required).
    UnalignedInput {
        /// Which input.
        what: &'static str,
        /// Its length.
        len: usize,
    },
}

impl fmt::Display for AsconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyLength(n) => {
                write!(f, "key must be {} bytes, got {}", KEY_SIZE, n)
            }
            Self::InvalidNonceLength(n) => {
                write!(f, "nonce must be {} bytes, got {}", NONCE_SIZE, n)
            }
            Self::InvalidTagLength(n) => {
                write!(f, "tag must be {} bytes, got {}", TAG_SIZE, n)
            }
            Self::UnalignedInput { what, len } => write!(
                f,
                "{} of {} bytes is not a padded multiple of {} bytes",
                what, len, RATE
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AsconError {}
