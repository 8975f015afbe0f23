//! Comparison of simulated results against the oracle.
//!
//! Every enabled operation contributes exact byte-equality checks. The
//! verifier never stops the process; the caller decides what a failed
//! [`Verdict`] means.

use core::fmt;

use serde::Serialize;

use crate::case::PaddedCase;
use crate::config::Operations;
use crate::ct::ct_eq;
use crate::oracle::{hex_bytes, OracleOutputs};
use crate::transcript::{ResultField, SimulationOutputs};

/// Validity flag a successful decryption reports.
pub const VALID_TAG_FLAG: u8 = 1;

/// Core operation a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Authenticated encryption.
    Encryption,
    /// Authenticated decryption.
    Decryption,
    /// Hashing.
    Hashing,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Encryption => "encryption",
            Self::Decryption => "decryption",
            Self::Hashing => "hashing",
        })
    }
}

/// One expected/actual comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    /// Operation under test.
    pub operation: Operation,
    /// Transcript field compared.
    pub field: ResultField,
    /// Expected bytes.
    #[serde(with = "hex_bytes")]
    pub expected: Vec<u8>,
    /// Simulated bytes.
    #[serde(with = "hex_bytes")]
    pub actual: Vec<u8>,
}

impl Check {
    fn new(operation: Operation, field: ResultField, expected: &[u8], actual: &[u8]) -> Self {
        Self {
            operation,
            field,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// True if both sides are byte-identical.
    pub fn passed(&self) -> bool {
        ct_eq(&self.expected, &self.actual)
    }

    /// Offset of the first differing byte; a length difference counts as a
    /// mismatch at the end of the shorter side.
    pub fn first_mismatch(&self) -> Option<usize> {
        if self.passed() {
            return None;
        }
        self.expected
            .iter()
            .zip(&self.actual)
            .position(|(e, a)| e != a)
            .or(Some(self.expected.len().min(self.actual.len())))
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_mismatch() {
            None => write!(f, "{} {}: ok", self.operation, self.field),
            Some(at) => write!(
                f,
                "{} {}: mismatch at byte {} (expected {}, got {})",
                self.operation,
                self.field,
                at,
                hex::encode(&self.expected),
                hex::encode(&self.actual)
            ),
        }
    }
}

/// Outcome of all checks of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    checks: Vec<Check>,
}

impl Verdict {
    /// True if every check passed. A verdict with no checks passes.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(Check::passed)
    }

    /// All checks, in evaluation order.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Failed checks.
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed())
    }
}

/// Compares simulated outputs with oracle outputs for the enabled operations.
#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    operations: Operations,
}

impl Verifier {
    /// Verifier for the given operations.
    pub fn new(operations: Operations) -> Self {
        Self { operations }
    }

    /// Run every enabled check.
    pub fn verify(
        &self,
        case: &PaddedCase,
        expected: &OracleOutputs,
        simulated: &SimulationOutputs,
    ) -> Verdict {
        let mut checks = Vec::new();

        if self.operations.encrypt {
            checks.push(Check::new(
                Operation::Encryption,
                ResultField::Ciphertext,
                &expected.ciphertext,
                &simulated.ciphertext,
            ));
            checks.push(Check::new(
                Operation::Encryption,
                ResultField::Tag,
                &expected.tag,
                &simulated.tag,
            ));
        }

        if self.operations.decrypt {
            // Only the first reported flag counts.
            let flag: Vec<u8> = simulated.validity_flag().into_iter().collect();
            checks.push(Check::new(
                Operation::Decryption,
                ResultField::Plaintext,
                &case.plaintext,
                &simulated.plaintext,
            ));
            checks.push(Check::new(
                Operation::Decryption,
                ResultField::Validity,
                &[VALID_TAG_FLAG],
                &flag,
            ));
        }

        if self.operations.hash {
            checks.push(Check::new(
                Operation::Hashing,
                ResultField::Hash,
                &expected.hash,
                &simulated.hash,
            ));
        }

        Verdict { checks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::TestCase;
    use crate::oracle::{AsconOracle, Oracle};

    fn matching_run() -> (PaddedCase, OracleOutputs, SimulationOutputs) {
        let case = TestCase::reference().pad();
        let expected = AsconOracle.expected_outputs(&case, Operations::ALL).unwrap();
        let simulated = SimulationOutputs {
            ciphertext: expected.ciphertext.clone(),
            tag: expected.tag.clone(),
            plaintext: case.plaintext.to_vec(),
            hash: expected.hash.clone(),
            validity: vec![1],
        };
        (case, expected, simulated)
    }

    #[test]
    fn test_matching_outputs_pass() {
        let (case, expected, simulated) = matching_run();
        let verdict = Verifier::new(Operations::ALL).verify(&case, &expected, &simulated);
        assert!(verdict.passed());
        assert_eq!(verdict.checks().len(), 5);
        assert_eq!(verdict.failures().count(), 0);
    }

    #[test]
    fn test_single_flipped_byte_fails() {
        let (case, expected, simulated) = matching_run();
        for field in ResultField::ALL {
            let mut broken = simulated.clone();
            let buf = match field {
                ResultField::Ciphertext => &mut broken.ciphertext,
                ResultField::Tag => &mut broken.tag,
                ResultField::Plaintext => &mut broken.plaintext,
                ResultField::Hash => &mut broken.hash,
                ResultField::Validity => &mut broken.validity,
            };
            let last = buf.len() - 1;
            buf[last] ^= 0x01;

            let verdict = Verifier::new(Operations::ALL).verify(&case, &expected, &broken);
            assert!(!verdict.passed(), "{field}");
            let failures: Vec<&Check> = verdict.failures().collect();
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].field, field);
            assert_eq!(failures[0].first_mismatch(), Some(last));
        }
    }

    #[test]
    fn test_disabled_operations_are_not_compared() {
        let (case, expected, mut simulated) = matching_run();
        simulated.hash.clear();
        simulated.validity = vec![0];

        let ops = Operations {
            encrypt: true,
            ..Operations::NONE
        };
        let verdict = Verifier::new(ops).verify(&case, &expected, &simulated);
        assert!(verdict.passed());
        assert!(verdict
            .checks()
            .iter()
            .all(|c| c.operation == Operation::Encryption));
    }

    #[test]
    fn test_short_output_reports_length_mismatch() {
        let (case, expected, mut simulated) = matching_run();
        simulated.tag.truncate(8);
        let verdict = Verifier::new(Operations::ALL).verify(&case, &expected, &simulated);
        let failure = verdict.failures().next().unwrap();
        assert_eq!(failure.field, ResultField::Tag);
        assert_eq!(failure.first_mismatch(), Some(8));
        assert!(failure.to_string().contains("mismatch at byte 8"));
    }

    #[test]
    fn test_only_first_validity_flag_counts() {
        let (case, expected, mut simulated) = matching_run();
        let decrypt = Operations {
            decrypt: true,
            ..Operations::NONE
        };

        simulated.validity = vec![1, 1];
        assert!(Verifier::new(decrypt)
            .verify(&case, &expected, &simulated)
            .passed());

        simulated.validity = vec![0, 1];
        assert!(!Verifier::new(decrypt)
            .verify(&case, &expected, &simulated)
            .passed());

        simulated.validity.clear();
        let verdict = Verifier::new(decrypt).verify(&case, &expected, &simulated);
        assert_eq!(
            verdict.failures().map(|c| c.field).collect::<Vec<_>>(),
            [ResultField::Validity]
        );
    }

    #[test]
    fn test_invalid_tag_flag_fails() {
        let (case, expected, mut simulated) = matching_run();
        simulated.validity = vec![0];
        let verdict = Verifier::new(Operations::ALL).verify(&case, &expected, &simulated);
        assert_eq!(
            verdict.failures().map(|c| c.field).collect::<Vec<_>>(),
            [ResultField::Validity]
        );
    }
}
