//! In-process reference model of the masked core.
//!
//! Executes a decoded vector program against an [`Oracle`] and prints the
//! transcript the hardware simulation would print: one `c =>` / `p =>` line
//! per 8-byte block, two `t =>` lines for the tag, four `h =>` lines for the
//! digest and a `v =>` line with the decryption validity.
//!
//! The model is a stand-in for offline runs and end-to-end tests. It knows
//! nothing about masking: the program it runs has already been recombined.

use core::fmt;
use core::fmt::Write as _;

use crate::ascon::{RATE, TAG_SIZE};
use crate::oracle::{Oracle, OracleError};
use crate::protocol::{parse_vector_file, Opcode, ProtocolError, VectorProgram};
use crate::shares::ShareCount;
use crate::transcript::ResultField;

/// Model errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An instruction arrived before the state it depends on.
    MissingState {
        /// Offending instruction.
        opcode: Opcode,
        /// What was missing.
        needs: &'static str,
    },
    /// The oracle failed.
    Oracle(OracleError),
    /// The vector file could not be decoded.
    Protocol(ProtocolError),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingState { opcode, needs } => {
                write!(f, "instruction {} needs {}", opcode, needs)
            }
            Self::Oracle(e) => write!(f, "{}", e),
            Self::Protocol(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ModelError {}

impl From<OracleError> for ModelError {
    fn from(e: OracleError) -> Self {
        Self::Oracle(e)
    }
}

impl From<ProtocolError> for ModelError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Encrypt,
    Decrypt,
    Hash,
}

#[derive(Default)]
struct CoreState<'a> {
    key: Option<&'a [u8]>,
    nonce: Option<&'a [u8]>,
    associated_data: &'a [u8],
    ciphertext: Option<&'a [u8]>,
    mode: Option<Mode>,
}

impl<'a> CoreState<'a> {
    fn select(&mut self, mode: Mode) {
        self.mode = Some(mode);
        self.nonce = None;
        self.associated_data = &[];
        self.ciphertext = None;
    }

    fn require_mode(&self, opcode: Opcode, mode: Mode) -> Result<(), ModelError> {
        if self.mode == Some(mode) {
            return Ok(());
        }
        Err(ModelError::MissingState {
            opcode,
            needs: match mode {
                Mode::Encrypt => "encryption mode",
                Mode::Decrypt => "decryption mode",
                Mode::Hash => "hash mode",
            },
        })
    }

    fn key_and_nonce(&self, opcode: Opcode) -> Result<(&'a [u8], &'a [u8]), ModelError> {
        let key = self.key.ok_or(ModelError::MissingState {
            opcode,
            needs: "a key",
        })?;
        let nonce = self.nonce.ok_or(ModelError::MissingState {
            opcode,
            needs: "a nonce",
        })?;
        Ok((key, nonce))
    }
}

/// Executes programs with an oracle and renders transcripts.
#[derive(Debug, Clone)]
pub struct ReferenceModel<O> {
    oracle: O,
    fault: Option<ResultField>,
}

impl<O: Oracle> ReferenceModel<O> {
    /// Model backed by `oracle`.
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            fault: None,
        }
    }

    /// Flip the lowest bit of the first value reported for `field`.
    ///
    /// Used to check that the bench notices a broken core.
    pub fn with_fault(mut self, field: ResultField) -> Self {
        self.fault = Some(field);
        self
    }

    /// Decode a vector file and run it.
    pub fn run_vector_file(&self, text: &str, count: ShareCount) -> Result<String, ModelError> {
        let program = parse_vector_file(text, count)?;
        self.run(&program)
    }

    /// Run a decoded program and return the transcript.
    pub fn run(&self, program: &VectorProgram) -> Result<String, ModelError> {
        let mut out = String::new();
        let mut state = CoreState::default();
        let mut faulted = false;

        for instruction in program.instructions() {
            let opcode = instruction.opcode;
            let payload = instruction.payload.as_slice();
            match opcode {
                Opcode::SelectEncrypt => state.select(Mode::Encrypt),
                Opcode::SelectDecrypt => state.select(Mode::Decrypt),
                Opcode::SelectHash => state.select(Mode::Hash),
                Opcode::LoadKey => state.key = Some(payload),
                Opcode::LoadNonce => state.nonce = Some(payload),
                Opcode::LoadAssociatedData => state.associated_data = payload,
                Opcode::LoadPlaintext => {
                    state.require_mode(opcode, Mode::Encrypt)?;
                    let (key, nonce) = state.key_and_nonce(opcode)?;
                    let sealed = self
                        .oracle
                        .encrypt(key, nonce, state.associated_data, payload)?;
                    let (ciphertext, tag) = sealed.split_at(sealed.len().saturating_sub(TAG_SIZE));
                    self.emit(&mut out, ResultField::Ciphertext, ciphertext, &mut faulted);
                    self.emit(&mut out, ResultField::Tag, tag, &mut faulted);
                }
                Opcode::LoadCiphertext => {
                    state.require_mode(opcode, Mode::Decrypt)?;
                    state.ciphertext = Some(payload);
                }
                Opcode::LoadTag => {
                    state.require_mode(opcode, Mode::Decrypt)?;
                    let (key, nonce) = state.key_and_nonce(opcode)?;
                    let ciphertext = state.ciphertext.ok_or(ModelError::MissingState {
                        opcode,
                        needs: "a ciphertext",
                    })?;
                    let opened = self.oracle.decrypt(
                        key,
                        nonce,
                        state.associated_data,
                        ciphertext,
                        payload,
                    )?;
                    let valid = match opened {
                        Some(plaintext) => {
                            self.emit(&mut out, ResultField::Plaintext, &plaintext, &mut faulted);
                            1
                        }
                        None => 0,
                    };
                    self.emit(&mut out, ResultField::Validity, &[valid], &mut faulted);
                }
                Opcode::LoadMessage => {
                    state.require_mode(opcode, Mode::Hash)?;
                    let digest = self.oracle.hash(payload)?;
                    self.emit(&mut out, ResultField::Hash, &digest, &mut faulted);
                }
            }
        }

        Ok(out)
    }

    fn emit(&self, out: &mut String, field: ResultField, bytes: &[u8], faulted: &mut bool) {
        let mut bytes = bytes.to_vec();
        if self.fault == Some(field) && !*faulted && !bytes.is_empty() {
            bytes[0] ^= 0x01;
            *faulted = true;
        }

        if field == ResultField::Validity {
            for flag in bytes {
                let _ = writeln!(out, "{} {:x}", field.marker(), flag & 0x0f);
            }
            return;
        }
        for block in bytes.chunks(RATE) {
            let _ = writeln!(out, "{} {}", field.marker(), hex::encode(block));
        }
    }
}
