//! Boolean (XOR) secret sharing for masked hardware inputs.
//!
//! A secret is split into `n` shares of the same length: `n - 1` uniformly
//! random masks followed by the secret XORed with every mask. XOR-reducing
//! all shares gives the secret back.
//!
//! ## Share layout
//!
//! [`split`] returns the shares concatenated in a single buffer, mask shares
//! first and the final share last:
//!
//! ```text
//! | mask_0 | mask_1 | ... | mask_{n-2} | secret ^ mask_0 ^ ... ^ mask_{n-2} |
//! ```
//!
//! This is the exact byte order of a `DAT` line in the vector file.
//!
//! ## Randomness
//!
//! Masks come from a [`MaskSource`]. [`OsMaskSource`] draws from the OS CSPRNG;
//! [`FixedMaskSource`] replays a fixed pattern so tests can assert exact share
//! bytes.
//!
//! ```ignore
//! let mut codec = ShareCodec::new(ShareCount::new(2)?, OsMaskSource);
//! let shared = codec.split(&[0x00, 0x01, 0x02, 0x03])?;
//! assert_eq!(codec.combine(&shared)?, [0x00, 0x01, 0x02, 0x03]);
//! ```

use core::fmt;

use getrandom::getrandom;
use zeroize::Zeroize;

use crate::bytes::xor_bytes;

/// Maximum number of shares per secret.
pub const MAX_SHARES: usize = 255;

/// Errors from share operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// Share count outside `1..=MAX_SHARES`.
    InvalidShareCount(usize),
    /// A shared buffer cannot be cut into `shares` equal chunks.
    ShareCountMismatch {
        /// Length of the shared buffer.
        len: usize,
        /// Share count it was decoded with.
        shares: usize,
    },
    /// Random number generation failed.
    RngError,
}

impl fmt::Display for ShareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidShareCount(n) => {
                write!(f, "invalid share count {} (expected 1..={})", n, MAX_SHARES)
            }
            Self::ShareCountMismatch { len, shares } => write!(
                f,
                "shared buffer of {} bytes is not divisible into {} shares",
                len, shares
            ),
            Self::RngError => write!(f, "random number generation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ShareError {}

/// A validated number of shares per secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShareCount(u8);

impl ShareCount {
    /// Two shares: first-order masking, the default for the hardware core.
    pub const TWO: Self = Self(2);

    /// Validate a share count.
    pub fn new(n: usize) -> Result<Self, ShareError> {
        if n == 0 || n > MAX_SHARES {
            return Err(ShareError::InvalidShareCount(n));
        }
        Ok(Self(n as u8))
    }

    /// Number of shares.
    #[inline]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for ShareCount {
    fn default() -> Self {
        Self::TWO
    }
}

impl fmt::Display for ShareCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of mask bytes.
pub trait MaskSource {
    /// Fill `buf` with mask bytes.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), ShareError>;
}

impl<M: MaskSource + ?Sized> MaskSource for &mut M {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), ShareError> {
        (**self).fill(buf)
    }
}

/// Masks from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsMaskSource;

impl MaskSource for OsMaskSource {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), ShareError> {
        getrandom(buf).map_err(|_| ShareError::RngError)
    }
}

/// Deterministic masks that cycle through a fixed byte pattern.
///
/// An empty pattern yields all-zero masks. Only meant for tests and for
/// reproducing a failing vector file.
#[derive(Debug, Clone, Default)]
pub struct FixedMaskSource {
    pattern: Vec<u8>,
    pos: usize,
}

impl FixedMaskSource {
    /// Create a source that replays `pattern` forever.
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
            pos: 0,
        }
    }
}

impl MaskSource for FixedMaskSource {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), ShareError> {
        if self.pattern.is_empty() {
            buf.fill(0);
            return Ok(());
        }
        for b in buf.iter_mut() {
            *b = self.pattern[self.pos];
            self.pos = (self.pos + 1) % self.pattern.len();
        }
        Ok(())
    }
}

/// Split `secret` into `count` shares, concatenated mask-first.
///
/// With a single share no masks are drawn and the output equals the secret.
pub fn split<M: MaskSource + ?Sized>(
    secret: &[u8],
    count: ShareCount,
    masks: &mut M,
) -> Result<Vec<u8>, ShareError> {
    let n = count.get();
    let len = secret.len();
    let mut shares = vec![0u8; len * n];

    // Last share starts as the secret and absorbs every mask.
    let (mask_part, last) = shares.split_at_mut(len * (n - 1));
    last.copy_from_slice(secret);

    let drawn = mask_part
        .chunks_exact_mut(len.max(1))
        .take(n - 1)
        .try_for_each(|mask| {
            masks.fill(mask)?;
            xor_bytes(mask, last);
            Ok::<(), ShareError>(())
        });

    match drawn {
        Ok(()) => Ok(shares),
        Err(e) => {
            shares.zeroize();
            Err(e)
        }
    }
}

/// Reconstruct a secret by XOR-reducing `count` equal chunks of `shared`.
///
/// # Errors
/// [`ShareError::ShareCountMismatch`] if `shared.len()` is not a multiple of
/// the share count. The buffer is never truncated or padded.
pub fn combine(shared: &[u8], count: ShareCount) -> Result<Vec<u8>, ShareError> {
    let n = count.get();
    if shared.len() % n != 0 {
        return Err(ShareError::ShareCountMismatch {
            len: shared.len(),
            shares: n,
        });
    }

    let share_len = shared.len() / n;
    if share_len == 0 {
        return Ok(Vec::new());
    }

    let mut chunks = shared.chunks_exact(share_len);
    let mut secret = chunks.next().map(<[u8]>::to_vec).unwrap_or_default();
    for chunk in chunks {
        xor_bytes(chunk, &mut secret);
    }
    Ok(secret)
}

/// A share count bound to a mask source.
#[derive(Debug, Clone)]
pub struct ShareCodec<M> {
    count: ShareCount,
    masks: M,
}

impl<M: MaskSource> ShareCodec<M> {
    /// Create a codec producing `count` shares per secret.
    pub fn new(count: ShareCount, masks: M) -> Self {
        Self { count, masks }
    }

    /// Configured share count.
    pub fn share_count(&self) -> ShareCount {
        self.count
    }

    /// Split with fresh masks.
    pub fn split(&mut self, secret: &[u8]) -> Result<Vec<u8>, ShareError> {
        split(secret, self.count, &mut self.masks)
    }

    /// Reconstruct with the configured share count.
    pub fn combine(&self, shared: &[u8]) -> Result<Vec<u8>, ShareError> {
        combine(shared, self.count)
    }
}
