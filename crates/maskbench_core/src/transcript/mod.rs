//! Simulation transcript parsing.
//!
//! The simulated core reports results as tagged lines on stdout:
//!
//! ```text
//! c => 8e1f02a48e1e01a7
//! t => 3f9c...
//! v => 1
//! ```
//!
//! The field starts one space after the marker and has a fixed width:
//! 16 hex digits (one 8-byte block) for `c`, `t`, `p` and `h`, one hex digit
//! for `v`. Records of the same field accumulate in transcript order. Lines
//! without a marker are build noise and are skipped.

use core::fmt;

use serde::Serialize;

use crate::ascon::{HASH_SIZE, TAG_SIZE};
use crate::case::PaddedCase;
use crate::config::Operations;
use crate::oracle::hex_bytes;

/// Errors from transcript parsing and completeness checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    /// A marker was found but its field is short or not hex.
    MalformedField {
        /// 1-based line number.
        line: usize,
        /// Field the marker belongs to.
        field: ResultField,
    },
    /// Fewer bytes were reported for a field than the operation produces.
    MarkerMissing {
        /// Field that is short.
        field: ResultField,
        /// Expected byte count.
        expected: usize,
        /// Byte count found.
        actual: usize,
    },
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedField { line, field } => write!(
                f,
                "transcript line {}: malformed {} field after '{}'",
                line,
                field.name(),
                field.marker()
            ),
            Self::MarkerMissing {
                field,
                expected,
                actual,
            } => write!(
                f,
                "transcript has {} of {} {} bytes ('{}' lines missing)",
                actual,
                expected,
                field.name(),
                field.marker()
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TranscriptError {}

/// Tagged result fields of the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultField {
    /// `c =>` ciphertext block.
    Ciphertext,
    /// `t =>` tag block.
    Tag,
    /// `p =>` recovered plaintext block.
    Plaintext,
    /// `h =>` hash block.
    Hash,
    /// `v =>` decryption validity flag.
    Validity,
}

impl ResultField {
    /// Every field, in the order the parser checks them.
    pub const ALL: [ResultField; 5] = [
        ResultField::Ciphertext,
        ResultField::Tag,
        ResultField::Plaintext,
        ResultField::Hash,
        ResultField::Validity,
    ];

    /// Marker text.
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Ciphertext => "c =>",
            Self::Tag => "t =>",
            Self::Plaintext => "p =>",
            Self::Hash => "h =>",
            Self::Validity => "v =>",
        }
    }

    /// Field width in hex digits.
    pub const fn hex_width(self) -> usize {
        match self {
            Self::Validity => 1,
            _ => 16,
        }
    }

    /// Short name for messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ciphertext => "ciphertext",
            Self::Tag => "tag",
            Self::Plaintext => "plaintext",
            Self::Hash => "hash",
            Self::Validity => "validity",
        }
    }

    /// Extract this field from a line, if the line carries its marker.
    fn extract(self, line: &str) -> Option<Result<Vec<u8>, ()>> {
        let pos = line.find(self.marker())?;
        let start = pos + self.marker().len() + 1;
        let digits = match line.get(start..start + self.hex_width()) {
            Some(d) if d.bytes().all(|b| b.is_ascii_hexdigit()) => d,
            _ => return Some(Err(())),
        };
        let bytes = if self.hex_width() == 1 {
            u8::from_str_radix(digits, 16).map(|v| vec![v]).map_err(|_| ())
        } else {
            hex::decode(digits).map_err(|_| ())
        };
        Some(bytes)
    }
}

impl fmt::Display for ResultField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded result line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    /// Field the line reports.
    pub field: ResultField,
    /// 1-based line number.
    pub line: usize,
    /// Decoded bytes (one byte holding 0..=15 for the validity flag).
    pub bytes: Vec<u8>,
}

/// The typed result records of one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    records: Vec<TranscriptRecord>,
    lines: usize,
}

impl Transcript {
    /// Parse a transcript. A line may carry several markers.
    pub fn parse(text: &str) -> Result<Self, TranscriptError> {
        let mut records = Vec::new();
        let mut lines = 0;
        for (idx, line) in text.lines().enumerate() {
            lines = idx + 1;
            for field in ResultField::ALL {
                match field.extract(line) {
                    None => {}
                    Some(Ok(bytes)) => records.push(TranscriptRecord {
                        field,
                        line: idx + 1,
                        bytes,
                    }),
                    Some(Err(())) => {
                        return Err(TranscriptError::MalformedField {
                            line: idx + 1,
                            field,
                        })
                    }
                }
            }
        }
        Ok(Self { records, lines })
    }

    /// Records in transcript order.
    pub fn records(&self) -> &[TranscriptRecord] {
        &self.records
    }

    /// Number of lines scanned.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Fold the records into per-field accumulators.
    pub fn outputs(&self) -> SimulationOutputs {
        let mut out = SimulationOutputs::default();
        for record in &self.records {
            out.field_mut(record.field).extend_from_slice(&record.bytes);
        }
        out
    }
}

/// Byte counts a complete transcript reports for a case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpectedLengths {
    /// Ciphertext bytes.
    pub ciphertext: usize,
    /// Tag bytes.
    pub tag: usize,
    /// Recovered plaintext bytes.
    pub plaintext: usize,
    /// Hash bytes.
    pub hash: usize,
    /// Validity flags.
    pub validity: usize,
}

impl ExpectedLengths {
    /// Lengths for a padded case with the given operations enabled.
    pub fn for_case(case: &PaddedCase, operations: Operations) -> Self {
        let mut lengths = Self::default();
        if operations.encrypt {
            lengths.ciphertext = case.plaintext.len();
            lengths.tag = TAG_SIZE;
        }
        if operations.decrypt {
            lengths.plaintext = case.plaintext.len();
            lengths.validity = 1;
        }
        if operations.hash {
            lengths.hash = HASH_SIZE;
        }
        lengths
    }

    /// Expected length of one field.
    pub fn get(&self, field: ResultField) -> usize {
        match field {
            ResultField::Ciphertext => self.ciphertext,
            ResultField::Tag => self.tag,
            ResultField::Plaintext => self.plaintext,
            ResultField::Hash => self.hash,
            ResultField::Validity => self.validity,
        }
    }
}

/// Accumulated simulation results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationOutputs {
    /// Ciphertext.
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
    /// Tag.
    #[serde(with = "hex_bytes")]
    pub tag: Vec<u8>,
    /// Recovered plaintext.
    #[serde(with = "hex_bytes")]
    pub plaintext: Vec<u8>,
    /// Hash.
    #[serde(with = "hex_bytes")]
    pub hash: Vec<u8>,
    /// Validity flags, one byte per `v =>` line.
    #[serde(with = "hex_bytes")]
    pub validity: Vec<u8>,
}

impl SimulationOutputs {
    /// Accumulator of one field.
    pub fn field(&self, field: ResultField) -> &[u8] {
        match field {
            ResultField::Ciphertext => &self.ciphertext,
            ResultField::Tag => &self.tag,
            ResultField::Plaintext => &self.plaintext,
            ResultField::Hash => &self.hash,
            ResultField::Validity => &self.validity,
        }
    }

    fn field_mut(&mut self, field: ResultField) -> &mut Vec<u8> {
        match field {
            ResultField::Ciphertext => &mut self.ciphertext,
            ResultField::Tag => &mut self.tag,
            ResultField::Plaintext => &mut self.plaintext,
            ResultField::Hash => &mut self.hash,
            ResultField::Validity => &mut self.validity,
        }
    }

    /// First reported validity flag.
    pub fn validity_flag(&self) -> Option<u8> {
        self.validity.first().copied()
    }

    /// Fail on the first field that is shorter than expected.
    pub fn check_complete(&self, expected: &ExpectedLengths) -> Result<(), TranscriptError> {
        for field in ResultField::ALL {
            let want = expected.get(field);
            let have = self.field(field).len();
            if have < want {
                return Err(TranscriptError::MarkerMissing {
                    field,
                    expected: want,
                    actual: have,
                });
            }
        }
        Ok(())
    }
}
