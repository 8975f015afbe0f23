//! 10*-padding to the 64-bit Ascon rate.
//!
//! The hardware core consumes whole 8-byte blocks, so every variable-length
//! input is padded before it is shared: one `0x80` byte, then `0x00` up to the
//! next multiple of 8. Padding always adds at least one byte.
//!
//! Associated data is the exception: empty AD stays empty and is not loaded at
//! all (see [`pad_associated_data`]).

use core::fmt;

/// Block size of the padded inputs, in bytes.
pub const BLOCK_SIZE: usize = 8;

/// First byte of the padding trailer.
pub const PAD_BYTE: u8 = 0x80;

/// Errors from [`unpad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingError {
    /// Length is not a positive multiple of [`BLOCK_SIZE`].
    UnalignedLength(usize),
    /// No `0x80` marker followed only by zero bytes.
    InvalidPadding,
}

impl fmt::Display for PaddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnalignedLength(len) => {
                write!(f, "padded length {} is not a multiple of {}", len, BLOCK_SIZE)
            }
            Self::InvalidPadding => write!(f, "missing or malformed 10* padding"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PaddingError {}

/// Length of `pad(data)` for an input of `len` bytes.
#[inline]
pub const fn padded_len(len: usize) -> usize {
    (len / BLOCK_SIZE + 1) * BLOCK_SIZE
}

/// Apply 10*-padding.
pub fn pad(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(padded_len(data.len()));
    out.extend_from_slice(data);
    out.push(PAD_BYTE);
    out.resize(padded_len(data.len()), 0x00);
    out
}

/// Pad associated data; empty input stays empty.
pub fn pad_associated_data(ad: &[u8]) -> Vec<u8> {
    if ad.is_empty() {
        Vec::new()
    } else {
        pad(ad)
    }
}

/// Strip 10*-padding, returning the original data.
pub fn unpad(padded: &[u8]) -> Result<&[u8], PaddingError> {
    if padded.is_empty() || padded.len() % BLOCK_SIZE != 0 {
        return Err(PaddingError::UnalignedLength(padded.len()));
    }
    let marker = padded
        .iter()
        .rposition(|&b| b != 0)
        .ok_or(PaddingError::InvalidPadding)?;
    // The marker must sit in the final block.
    if padded[marker] != PAD_BYTE || padded.len() - marker > BLOCK_SIZE {
        return Err(PaddingError::InvalidPadding);
    }
    Ok(&padded[..marker])
}
