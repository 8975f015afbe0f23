//! Test case inputs, before and after padding.

use serde::Serialize;

use crate::bytes::SecretValue;
use crate::padding::{pad, pad_associated_data};

/// Key and nonce used by the reference scenario and the sweep.
pub const REFERENCE_KEY: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];

/// Associated data and plaintext of the reference scenario.
pub const REFERENCE_DATA: [u8; 4] = [0x00, 0x01, 0x02, 0x03];

/// Caller-supplied inputs of one bench run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// 16-byte key.
    pub key: SecretValue,
    /// 16-byte nonce.
    pub nonce: SecretValue,
    /// Associated data (may be empty).
    pub associated_data: SecretValue,
    /// Plaintext.
    pub plaintext: SecretValue,
    /// Hash message.
    pub message: SecretValue,
}

impl TestCase {
    /// Build a case from raw inputs.
    pub fn new(
        key: &[u8],
        nonce: &[u8],
        associated_data: &[u8],
        plaintext: &[u8],
        message: &[u8],
    ) -> Self {
        Self {
            key: key.into(),
            nonce: nonce.into(),
            associated_data: associated_data.into(),
            plaintext: plaintext.into(),
            message: message.into(),
        }
    }

    /// Key = nonce = `000102..0f`, AD = plaintext = `00010203`, message = AD.
    pub fn reference() -> Self {
        Self::new(
            &REFERENCE_KEY,
            &REFERENCE_KEY,
            &REFERENCE_DATA,
            &REFERENCE_DATA,
            &REFERENCE_DATA,
        )
    }

    /// Reference key/nonce with counting-pattern AD and plaintext of the
    /// given lengths. The hash message is the AD.
    pub fn counting(ad_len: usize, pt_len: usize) -> Self {
        let ad: Vec<u8> = (0..ad_len).map(|i| i as u8).collect();
        let pt: Vec<u8> = (0..pt_len).map(|i| i as u8).collect();
        Self::new(&REFERENCE_KEY, &REFERENCE_KEY, &ad, &pt, &ad)
    }

    /// Apply the padding rule to every variable-length input.
    pub fn pad(&self) -> PaddedCase {
        PaddedCase {
            key: self.key.clone(),
            nonce: self.nonce.clone(),
            associated_data: pad_associated_data(&self.associated_data).into(),
            plaintext: pad(&self.plaintext).into(),
            message: pad(&self.message).into(),
        }
    }
}

/// Inputs after padding. These are shared into the vector file and fed,
/// unshared, to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaddedCase {
    /// 16-byte key.
    pub key: SecretValue,
    /// 16-byte nonce.
    pub nonce: SecretValue,
    /// Padded associated data, empty if the input AD was empty.
    pub associated_data: SecretValue,
    /// Padded plaintext.
    pub plaintext: SecretValue,
    /// Padded hash message.
    pub message: SecretValue,
}
