//! Textual instruction protocol between the bench and the simulated core.
//!
//! A vector file is a sequence of blocks, one per instruction:
//!
//! ```text
//! # Load key
//! INS 30000010
//! DAT 8E1F02A48E1E01A7
//! DAT ...
//!
//! # Specify authenticated encryption
//! INS 00000000
//!
//! ```
//!
//! The header carries the opcode and the length of the *unshared* payload. The
//! payload is cut into 4-byte words; every word is split into shares on its own
//! and written as one `DAT` line (mask shares first, final share last). A blank
//! line ends each block. `#` lines are comments.
//!
//! [`VectorProgram`] holds the unshared instructions in the order the core
//! consumes them. [`VectorWriter`] renders a program with fresh masks and
//! [`reader::parse_vector_file`] recombines a rendered file.

use core::fmt;

use crate::case::PaddedCase;
use crate::config::Operations;
use crate::oracle::OracleOutputs;
use crate::shares::{MaskSource, ShareCodec, ShareCount, ShareError};

pub mod opcode;
pub mod reader;

pub use opcode::Opcode;
pub use reader::parse_vector_file;

/// Bytes per `DAT` line before sharing.
pub const WORD_SIZE: usize = 4;

/// Largest payload length the 24-bit header field can declare.
pub const MAX_PAYLOAD_LEN: usize = 0x00ff_ffff;

/// Header marker.
pub const INS_PREFIX: &str = "INS ";

/// Data line marker.
pub const DAT_PREFIX: &str = "DAT ";

/// Protocol errors (writing and reading).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload length is not a multiple of [`WORD_SIZE`].
    PayloadNotWordAligned {
        /// Instruction opcode.
        opcode: Opcode,
        /// Payload length.
        len: usize,
    },
    /// Payload does not fit the 24-bit length field.
    PayloadTooLong {
        /// Instruction opcode.
        opcode: Opcode,
        /// Payload length.
        len: usize,
    },
    /// Mode select with a payload, or data load without one.
    UnexpectedPayload {
        /// Instruction opcode.
        opcode: Opcode,
        /// Payload length.
        len: usize,
    },
    /// `INS` line that is not `INS <2 hex><6 hex>`.
    MalformedHeader {
        /// 1-based line number.
        line: usize,
    },
    /// Opcode byte outside the catalogue.
    UnknownOpcode {
        /// 1-based line number.
        line: usize,
        /// Opcode byte.
        opcode: u8,
    },
    /// `DAT` line with bad hex or the wrong number of bytes.
    MalformedData {
        /// 1-based line number.
        line: usize,
    },
    /// `DAT` line with no open instruction.
    DataOutsideInstruction {
        /// 1-based line number.
        line: usize,
    },
    /// Line that is neither a header, data, comment nor blank.
    UnrecognizedLine {
        /// 1-based line number.
        line: usize,
    },
    /// Decoded payload length differs from the header.
    PayloadLengthMismatch {
        /// 1-based line number of the header.
        line: usize,
        /// Declared length.
        declared: usize,
        /// Decoded length.
        actual: usize,
    },
    /// Share split or combine failed.
    Shares(ShareError),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadNotWordAligned { opcode, len } => write!(
                f,
                "payload of {} is {} bytes, not a multiple of {}",
                opcode, len, WORD_SIZE
            ),
            Self::PayloadTooLong { opcode, len } => write!(
                f,
                "payload of {} is {} bytes, above the {} byte limit",
                opcode, len, MAX_PAYLOAD_LEN
            ),
            Self::UnexpectedPayload { opcode, len } => {
                write!(f, "{} cannot carry a {} byte payload", opcode, len)
            }
            Self::MalformedHeader { line } => write!(f, "line {}: malformed INS header", line),
            Self::UnknownOpcode { line, opcode } => {
                write!(f, "line {}: unknown opcode {:02x}", line, opcode)
            }
            Self::MalformedData { line } => write!(f, "line {}: malformed DAT line", line),
            Self::DataOutsideInstruction { line } => {
                write!(f, "line {}: DAT line outside an instruction", line)
            }
            Self::UnrecognizedLine { line } => write!(f, "line {}: unrecognized line", line),
            Self::PayloadLengthMismatch {
                line,
                declared,
                actual,
            } => write!(
                f,
                "line {}: header declares {} bytes, data lines carry {}",
                line, declared, actual
            ),
            Self::Shares(e) => write!(f, "share error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

impl From<ShareError> for ProtocolError {
    fn from(e: ShareError) -> Self {
        Self::Shares(e)
    }
}

/// One unshared instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode.
    pub opcode: Opcode,
    /// Unshared payload; empty for mode selects.
    pub payload: Vec<u8>,
}

impl Instruction {
    /// Mode select, no payload.
    pub fn select(opcode: Opcode) -> Self {
        Self {
            opcode,
            payload: Vec::new(),
        }
    }

    /// Data load.
    pub fn load(opcode: Opcode, payload: &[u8]) -> Self {
        Self {
            opcode,
            payload: payload.to_vec(),
        }
    }

    /// Check the payload against the header constraints.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let len = self.payload.len();
        if self.opcode.carries_payload() == (len == 0) {
            return Err(ProtocolError::UnexpectedPayload {
                opcode: self.opcode,
                len,
            });
        }
        if len > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLong {
                opcode: self.opcode,
                len,
            });
        }
        if len % WORD_SIZE != 0 {
            return Err(ProtocolError::PayloadNotWordAligned {
                opcode: self.opcode,
                len,
            });
        }
        Ok(())
    }

    /// The `INS` header line, without newline.
    ///
    /// Plaintext and ciphertext loads print the length in upper case, every
    /// other header in lower case.
    pub fn header(&self) -> String {
        let opcode = self.opcode.byte();
        let len = self.payload.len();
        match self.opcode {
            Opcode::LoadPlaintext | Opcode::LoadCiphertext => {
                format!("{}{:02x}{:06X}", INS_PREFIX, opcode, len)
            }
            _ => format!("{}{:02x}{:06x}", INS_PREFIX, opcode, len),
        }
    }
}

/// Ordered, unshared instruction list for one bench run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorProgram {
    instructions: Vec<Instruction>,
}

impl VectorProgram {
    /// Empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Program from an instruction list.
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Instructions in consumption order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Build the program for a padded case.
    ///
    /// Order: key, encryption (nonce, AD, plaintext), decryption (nonce, AD,
    /// ciphertext, tag), hashing (message). The key is loaded once, before
    /// whichever of encryption and decryption comes first. Empty AD is
    /// omitted. The ciphertext and tag come from the oracle.
    pub fn for_case(case: &PaddedCase, expected: &OracleOutputs, operations: Operations) -> Self {
        let mut program = Self::new();
        let mut key_loaded = false;

        if operations.encrypt {
            program.push(Instruction::load(Opcode::LoadKey, &case.key));
            key_loaded = true;
            program.push(Instruction::select(Opcode::SelectEncrypt));
            program.push_nonce_and_ad(case);
            program.push(Instruction::load(Opcode::LoadPlaintext, &case.plaintext));
        }

        if operations.decrypt {
            if !key_loaded {
                program.push(Instruction::load(Opcode::LoadKey, &case.key));
            }
            program.push(Instruction::select(Opcode::SelectDecrypt));
            program.push_nonce_and_ad(case);
            program.push(Instruction::load(Opcode::LoadCiphertext, &expected.ciphertext));
            program.push(Instruction::load(Opcode::LoadTag, &expected.tag));
        }

        if operations.hash {
            program.push(Instruction::select(Opcode::SelectHash));
            program.push(Instruction::load(Opcode::LoadMessage, &case.message));
        }

        program
    }

    fn push_nonce_and_ad(&mut self, case: &PaddedCase) {
        self.push(Instruction::load(Opcode::LoadNonce, &case.nonce));
        if !case.associated_data.is_empty() {
            self.push(Instruction::load(
                Opcode::LoadAssociatedData,
                &case.associated_data,
            ));
        }
    }
}

/// Renders programs to vector file text, sharing every data word.
#[derive(Debug, Clone)]
pub struct VectorWriter<M> {
    codec: ShareCodec<M>,
    comments: bool,
}

impl<M: MaskSource> VectorWriter<M> {
    /// Writer producing `count` shares per word.
    pub fn new(count: ShareCount, masks: M) -> Self {
        Self {
            codec: ShareCodec::new(count, masks),
            comments: true,
        }
    }

    /// Enable or disable the `#` comment before each block.
    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    /// Share count in use.
    pub fn share_count(&self) -> ShareCount {
        self.codec.share_count()
    }

    /// Render a whole program. Every call draws fresh masks.
    pub fn render(&mut self, program: &VectorProgram) -> Result<String, ProtocolError> {
        let mut out = String::new();
        for instruction in program.instructions() {
            self.write_instruction(&mut out, instruction)?;
        }
        Ok(out)
    }

    /// Append one instruction block to `out`.
    pub fn write_instruction(
        &mut self,
        out: &mut String,
        instruction: &Instruction,
    ) -> Result<(), ProtocolError> {
        instruction.validate()?;

        if self.comments {
            out.push_str("# ");
            out.push_str(instruction.opcode.description());
            out.push('\n');
        }
        out.push_str(&instruction.header());
        out.push('\n');

        for word in instruction.payload.chunks_exact(WORD_SIZE) {
            let shares = self.codec.split(word)?;
            out.push_str(DAT_PREFIX);
            out.push_str(&crate::bytes::to_upper_hex(&shares));
            out.push('\n');
        }
        out.push('\n');
        Ok(())
    }
}
