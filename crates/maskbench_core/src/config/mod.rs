//! Harness configuration passed explicitly into each component.
//!
//! Nothing here is global: two configurations can drive two benches in the
//! same process without interfering.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::shares::{ShareCount, ShareError};

/// Minimum share count accepted for a bench run (first-order masking).
pub const MIN_BENCH_SHARES: usize = 2;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variant name or number not recognised.
    UnknownVariant(String),
    /// Share count below [`MIN_BENCH_SHARES`].
    TooFewShares(usize),
    /// Share count rejected by the codec.
    Shares(ShareError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVariant(v) => {
                write!(f, "unknown core variant '{}' (expected 1, 2 or 3)", v)
            }
            Self::TooFewShares(n) => write!(
                f,
                "share count {} is below the minimum of {}",
                n, MIN_BENCH_SHARES
            ),
            Self::Shares(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl From<ShareError> for ConfigError {
    fn from(e: ShareError) -> Self {
        Self::Shares(e)
    }
}

/// Hardware core variant selected at build time of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Variant 1.
    #[default]
    V1,
    /// Variant 2.
    V2,
    /// Variant 3.
    V3,
}

impl Variant {
    /// All known variants.
    pub const ALL: [Variant; 3] = [Variant::V1, Variant::V2, Variant::V3];

    /// Variant from its number (1, 2 or 3).
    pub fn from_number(n: u8) -> Result<Self, ConfigError> {
        match n {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }

    /// Name passed to the simulation build (`v1`, `v2`, `v3`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        digits
            .parse::<u8>()
            .map_err(|_| ConfigError::UnknownVariant(s.to_string()))
            .and_then(Self::from_number)
    }
}

/// Which core operations are exercised and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Operations {
    /// Authenticated encryption.
    pub encrypt: bool,
    /// Authenticated decryption.
    pub decrypt: bool,
    /// Hashing.
    pub hash: bool,
}

impl Operations {
    /// Every operation enabled.
    pub const ALL: Self = Self {
        encrypt: true,
        decrypt: true,
        hash: true,
    };

    /// Nothing enabled.
    pub const NONE: Self = Self {
        encrypt: false,
        decrypt: false,
        hash: false,
    };

    /// True if encryption or decryption runs, i.e. a key must be loaded.
    pub const fn needs_key(self) -> bool {
        self.encrypt || self.decrypt
    }

    /// True if at least one operation is enabled.
    pub const fn any(self) -> bool {
        self.encrypt || self.decrypt || self.hash
    }
}

impl Default for Operations {
    fn default() -> Self {
        Self::ALL
    }
}

/// Pure (I/O free) harness settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Shares per 4-byte data chunk.
    pub share_count: ShareCount,
    /// Enabled operations.
    pub operations: Operations,
    /// Let short transcript fields through to the verifier instead of
    /// failing with a missing-marker error.
    pub allow_truncated: bool,
}

impl HarnessConfig {
    /// Configuration with `shares` shares and every operation enabled.
    pub fn new(shares: usize) -> Result<Self, ConfigError> {
        if shares < MIN_BENCH_SHARES {
            return Err(ConfigError::TooFewShares(shares));
        }
        Ok(Self {
            share_count: ShareCount::new(shares)?,
            operations: Operations::ALL,
            allow_truncated: false,
        })
    }

    /// Replace the enabled operations.
    pub fn with_operations(mut self, operations: Operations) -> Self {
        self.operations = operations;
        self
    }

    /// Toggle the legacy truncated-transcript behaviour.
    pub fn with_allow_truncated(mut self, allow: bool) -> Self {
        self.allow_truncated = allow;
        self
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            share_count: ShareCount::TWO,
            operations: Operations::ALL,
            allow_truncated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!("1".parse::<Variant>().unwrap(), Variant::V1);
        assert_eq!("v2".parse::<Variant>().unwrap(), Variant::V2);
        assert_eq!("V3".parse::<Variant>().unwrap(), Variant::V3);
        assert!(matches!(
            "4".parse::<Variant>(),
            Err(ConfigError::UnknownVariant(_))
        ));
        assert!("vx".parse::<Variant>().is_err());
        assert_eq!(Variant::V2.to_string(), "v2");
    }

    #[test]
    fn test_harness_config_share_bounds() {
        assert_eq!(HarnessConfig::new(1), Err(ConfigError::TooFewShares(1)));
        assert!(matches!(
            HarnessConfig::new(300),
            Err(ConfigError::Shares(ShareError::InvalidShareCount(300)))
        ));
        let config = HarnessConfig::new(3).unwrap();
        assert_eq!(config.share_count.get(), 3);
        assert_eq!(config.operations, Operations::ALL);
        assert!(!config.allow_truncated);
    }

    #[test]
    fn test_operations_flags() {
        assert!(Operations::ALL.needs_key());
        assert!(!Operations::NONE.any());
        let hash_only = Operations {
            hash: true,
            ..Operations::NONE
        };
        assert!(!hash_only.needs_key());
        assert!(hash_only.any());
    }
}
