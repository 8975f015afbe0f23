//! Ascon-128 over pre-padded associated data and plaintext.

use super::permutation::State;
use super::{AsconError, KEY_SIZE, NONCE_SIZE, RATE, TAG_SIZE};
use crate::bytes::{load_be64, store_be64};
use crate::ct::ct_eq;

/// Ascon-128 initialization vector (k = 128, r = 64, a = 12, b = 6).
const IV: u64 = 0x8040_0c06_0000_0000;

/// Rounds for initialization and finalization.
const PA_ROUNDS: usize = 12;

/// Rounds between data blocks.
const PB_ROUNDS: usize = 6;

/// Encrypt a padded plaintext; returns `ciphertext ‖ tag`.
///
/// `associated_data` must be empty or block aligned; `plaintext` must be a
/// non-empty multiple of [`RATE`] bytes.
pub fn encrypt(
    key: &[u8],
    nonce: &[u8],
    associated_data: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, AsconError> {
    let key = split_key(key)?;
    check_aligned("associated data", associated_data, true)?;
    check_aligned("plaintext", plaintext, false)?;

    let mut state = initialize(key, nonce)?;
    absorb_associated_data(&mut state, associated_data);

    let blocks = plaintext.len() / RATE;
    let mut out = Vec::with_capacity(plaintext.len() + TAG_SIZE);
    for (i, block) in plaintext.chunks_exact(RATE).enumerate() {
        state.0[0] ^= load_be64(block);
        out.extend_from_slice(&state.0[0].to_be_bytes());
        if i + 1 < blocks {
            state.permute(PB_ROUNDS);
        }
    }

    out.extend_from_slice(&finalize(&mut state, key));
    Ok(out)
}

/// Decrypt a padded ciphertext and check its tag.
///
/// Returns `Ok(None)` when the tag does not verify.
pub fn decrypt(
    key: &[u8],
    nonce: &[u8],
    associated_data: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Option<Vec<u8>>, AsconError> {
    let key = split_key(key)?;
    check_aligned("associated data", associated_data, true)?;
    check_aligned("ciphertext", ciphertext, false)?;
    if tag.len() != TAG_SIZE {
        return Err(AsconError::InvalidTagLength(tag.len()));
    }

    let mut state = initialize(key, nonce)?;
    absorb_associated_data(&mut state, associated_data);

    let blocks = ciphertext.len() / RATE;
    let mut plaintext = Vec::with_capacity(ciphertext.len());
    for (i, block) in ciphertext.chunks_exact(RATE).enumerate() {
        let c = load_be64(block);
        plaintext.extend_from_slice(&(state.0[0] ^ c).to_be_bytes());
        state.0[0] = c;
        if i + 1 < blocks {
            state.permute(PB_ROUNDS);
        }
    }

    let expected = finalize(&mut state, key);
    if ct_eq(&expected, tag) {
        Ok(Some(plaintext))
    } else {
        Ok(None)
    }
}

fn split_key(key: &[u8]) -> Result<(u64, u64), AsconError> {
    if key.len() != KEY_SIZE {
        return Err(AsconError::InvalidKeyLength(key.len()));
    }
    Ok((load_be64(&key[..8]), load_be64(&key[8..])))
}

fn check_aligned(what: &'static str, data: &[u8], may_be_empty: bool) -> Result<(), AsconError> {
    if data.len() % RATE != 0 || (data.is_empty() && !may_be_empty) {
        return Err(AsconError::UnalignedInput {
            what,
            len: data.len(),
        });
    }
    Ok(())
}

fn initialize((k0, k1): (u64, u64), nonce: &[u8]) -> Result<State, AsconError> {
    if nonce.len() != NONCE_SIZE {
        return Err(AsconError::InvalidNonceLength(nonce.len()));
    }
    let mut state = State::new([IV, k0, k1, load_be64(&nonce[..8]), load_be64(&nonce[8..])]);
    state.permute(PA_ROUNDS);
    state.0[3] ^= k0;
    state.0[4] ^= k1;
    Ok(state)
}

fn absorb_associated_data(state: &mut State, associated_data: &[u8]) {
    for block in associated_data.chunks_exact(RATE) {
        state.0[0] ^= load_be64(block);
        state.permute(PB_ROUNDS);
    }
    // Domain separation, applied even without associated data.
    state.0[4] ^= 1;
}

fn finalize(state: &mut State, (k0, k1): (u64, u64)) -> [u8; TAG_SIZE] {
    state.0[1] ^= k0;
    state.0[2] ^= k1;
    state.permute(PA_ROUNDS);
    state.0[3] ^= k0;
    state.0[4] ^= k1;

    let mut tag = [0u8; TAG_SIZE];
    store_be64(state.0[3], &mut tag[..8]);
    store_be64(state.0[4], &mut tag[8..]);
    tag
}
