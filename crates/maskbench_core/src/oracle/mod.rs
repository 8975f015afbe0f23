//! Unshared reference computation of the expected core outputs.

use core::fmt;

use serde::Serialize;

use crate::ascon::{self, AsconError, TAG_SIZE};
use crate::case::PaddedCase;
use crate::config::Operations;

/// Oracle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The built-in Ascon implementation rejected its input.
    Ascon(AsconError),
    /// Some other oracle backend failed.
    Backend(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascon(e) => write!(f, "ascon: {}", e),
            Self::Backend(msg) => write!(f, "oracle backend: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OracleError {}

impl From<AsconError> for OracleError {
    fn from(e: AsconError) -> Self {
        Self::Ascon(e)
    }
}

/// Expected outputs for one case. Fields of disabled operations are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OracleOutputs {
    /// Ciphertext, as long as the padded plaintext.
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
    /// 16-byte tag.
    #[serde(with = "hex_bytes")]
    pub tag: Vec<u8>,
    /// 32-byte digest.
    #[serde(with = "hex_bytes")]
    pub hash: Vec<u8>,
}

/// Computes expected results from padded, unshared inputs.
pub trait Oracle {
    /// Authenticated encryption; returns `ciphertext ‖ tag`.
    fn encrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, OracleError>;

    /// Authenticated decryption; `None` if the tag does not verify.
    fn decrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Option<Vec<u8>>, OracleError>;

    /// Digest of a padded message.
    fn hash(&self, message: &[u8]) -> Result<Vec<u8>, OracleError>;

    /// Outputs the bench compares against.
    ///
    /// Decryption reuses the encryption ciphertext and tag, so they are
    /// computed whenever either operation is enabled.
    fn expected_outputs(
        &self,
        case: &PaddedCase,
        operations: Operations,
    ) -> Result<OracleOutputs, OracleError> {
        let mut out = OracleOutputs::default();

        if operations.needs_key() {
            let mut sealed = self.encrypt(
                &case.key,
                &case.nonce,
                &case.associated_data,
                &case.plaintext,
            )?;
            if sealed.len() < TAG_SIZE {
                return Err(OracleError::Backend(format!(
                    "encryption returned {} bytes, shorter than a tag",
                    sealed.len()
                )));
            }
            out.tag = sealed.split_off(sealed.len() - TAG_SIZE);
            out.ciphertext = sealed;
        }

        if operations.hash {
            out.hash = self.hash(&case.message)?;
        }

        Ok(out)
    }
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn encrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, OracleError> {
        (**self).encrypt(key, nonce, associated_data, plaintext)
    }

    fn decrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Option<Vec<u8>>, OracleError> {
        (**self).decrypt(key, nonce, associated_data, ciphertext, tag)
    }

    fn hash(&self, message: &[u8]) -> Result<Vec<u8>, OracleError> {
        (**self).hash(message)
    }
}

/// Ascon-128 / Ascon-Hash on pre-padded input.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsconOracle;

impl Oracle for AsconOracle {
    fn encrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, OracleError> {
        Ok(ascon::encrypt(key, nonce, associated_data, plaintext)?)
    }

    fn decrypt(
        &self,
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Option<Vec<u8>>, OracleError> {
        Ok(ascon::decrypt(key, nonce, associated_data, ciphertext, tag)?)
    }

    fn hash(&self, message: &[u8]) -> Result<Vec<u8>, OracleError> {
        Ok(ascon::hash(message)?.to_vec())
    }
}

/// Lower-case hex for byte fields in JSON output.
pub(crate) mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}
