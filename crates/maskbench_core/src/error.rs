//! Unified error types for maskbench_core.
//!
//! `HarnessError` wraps the error of every submodule so callers can use a
//! single `?` across the pipeline.

use core::fmt;

/// Unified harness error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// Share split/combine error
    Shares(crate::shares::ShareError),
    /// Padding error
    Padding(crate::padding::PaddingError),
    /// Configuration error
    Config(crate::config::ConfigError),
    /// Vector protocol error
    Protocol(crate::protocol::ProtocolError),
    /// Transcript parse or completeness error
    Transcript(crate::transcript::TranscriptError),
    /// Oracle error
    Oracle(crate::oracle::OracleError),
    /// Reference model error
    Model(crate::model::ModelError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Shares(e) => write!(f, "shares: {}", e),
            HarnessError::Padding(e) => write!(f, "padding: {}", e),
            HarnessError::Config(e) => write!(f, "config: {}", e),
            HarnessError::Protocol(e) => write!(f, "vector file: {}", e),
            HarnessError::Transcript(e) => write!(f, "{}", e),
            HarnessError::Oracle(e) => write!(f, "oracle: {}", e),
            HarnessError::Model(e) => write!(f, "reference model: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HarnessError {}

impl From<crate::shares::ShareError> for HarnessError {
    fn from(e: crate::shares::ShareError) -> Self {
        HarnessError::Shares(e)
    }
}

impl From<crate::padding::PaddingError> for HarnessError {
    fn from(e: crate::padding::PaddingError) -> Self {
        HarnessError::Padding(e)
    }
}

impl From<crate::config::ConfigError> for HarnessError {
    fn from(e: crate::config::ConfigError) -> Self {
        HarnessError::Config(e)
    }
}

impl From<crate::protocol::ProtocolError> for HarnessError {
    fn from(e: crate::protocol::ProtocolError) -> Self {
        HarnessError::Protocol(e)
    }
}

impl From<crate::transcript::TranscriptError> for HarnessError {
    fn from(e: crate::transcript::TranscriptError) -> Self {
        HarnessError::Transcript(e)
    }
}

impl From<crate::oracle::OracleError> for HarnessError {
    fn from(e: crate::oracle::OracleError) -> Self {
        HarnessError::Oracle(e)
    }
}

impl From<crate::ascon::AsconError> for HarnessError {
    fn from(e: crate::ascon::AsconError) -> Self {
        HarnessError::Oracle(e.into())
    }
}

impl From<crate::model::ModelError> for HarnessError {
    fn from(e: crate::model::ModelError) -> Self {
        HarnessError::Model(e)
    }
}

/// Result type using the unified HarnessError
pub type HarnessResult<T> = Result<T, HarnessError>;
