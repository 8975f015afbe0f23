//! Instruction opcodes understood by the masked core.

use core::fmt;

/// Opcode byte of an `INS` header.
///
/// The low nibble of the data-load opcodes (`0x61`, `0x71`, `0x81`, `0x51`)
/// is carried through unchanged; [`Opcode::is_final_segment`] reports it but
/// nothing else interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Select authenticated encryption.
    SelectEncrypt = 0x00,
    /// Select authenticated decryption.
    SelectDecrypt = 0x10,
    /// Select hashing.
    SelectHash = 0x20,
    /// Load key.
    LoadKey = 0x30,
    /// Load nonce.
    LoadNonce = 0x40,
    /// Load associated data.
    LoadAssociatedData = 0x50,
    /// Load hash message.
    LoadMessage = 0x51,
    /// Load plaintext, final segment.
    LoadPlaintext = 0x61,
    /// Load ciphertext, final segment.
    LoadCiphertext = 0x71,
    /// Load tag, final segment.
    LoadTag = 0x81,
}

impl Opcode {
    /// Every opcode in the catalogue.
    pub const ALL: [Opcode; 10] = [
        Opcode::SelectEncrypt,
        Opcode::SelectDecrypt,
        Opcode::SelectHash,
        Opcode::LoadKey,
        Opcode::LoadNonce,
        Opcode::LoadAssociatedData,
        Opcode::LoadMessage,
        Opcode::LoadPlaintext,
        Opcode::LoadCiphertext,
        Opcode::LoadTag,
    ];

    /// Header byte.
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Opcode from a header byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.byte() == byte)
    }

    /// Mode selects carry no payload; everything else does.
    pub const fn carries_payload(self) -> bool {
        !matches!(
            self,
            Opcode::SelectEncrypt | Opcode::SelectDecrypt | Opcode::SelectHash
        )
    }

    /// Low-nibble flag of the data-load opcodes.
    pub const fn is_final_segment(self) -> bool {
        self.carries_payload() && self.byte() & 0x0f == 0x01
    }

    /// Human-readable description, used for `#` comments in the vector file.
    pub const fn description(self) -> &'static str {
        match self {
            Opcode::SelectEncrypt => "Specify authenticated encryption",
            Opcode::SelectDecrypt => "Specify authenticated decryption",
            Opcode::SelectHash => "Specify hashing",
            Opcode::LoadKey => "Load key",
            Opcode::LoadNonce => "Load nonce",
            Opcode::LoadAssociatedData => "Load associated data",
            Opcode::LoadMessage => "Load message data",
            Opcode::LoadPlaintext => "Load plaintext",
            Opcode::LoadCiphertext => "Load ciphertext",
            Opcode::LoadTag => "Load tag",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x} ({})", self.byte(), self.description())
    }
}
