//! The test bench pipeline.
//!
//! One run is strictly linear: pad, compute the oracle outputs, build and
//! share the vector program, write the vector file, simulate, parse the
//! transcript, check it is complete, verify.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use maskbench_core::case::{PaddedCase, TestCase};
use maskbench_core::config::HarnessConfig;
use maskbench_core::oracle::{Oracle, OracleOutputs};
use maskbench_core::protocol::{VectorProgram, VectorWriter};
use maskbench_core::shares::MaskSource;
use maskbench_core::transcript::{ExpectedLengths, SimulationOutputs, Transcript};
use maskbench_core::verifier::{Verdict, Verifier};

use crate::simulator::Simulator;
use crate::{write_file_atomic, Result};

/// Vector file location the hardware makefile reads, relative to the workdir.
pub const DEFAULT_VECTOR_FILE: &str = "tv/tv_shared.txt";

/// Paths and harness settings of a bench.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Directory the simulator runs in.
    pub workdir: PathBuf,
    /// Vector file path; relative paths are resolved against `workdir`.
    pub vector_path: PathBuf,
    /// Share count, operations and transcript strictness.
    pub harness: HarnessConfig,
}

impl BenchConfig {
    /// Default vector path and harness settings inside `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            vector_path: PathBuf::from(DEFAULT_VECTOR_FILE),
            harness: HarnessConfig::default(),
        }
    }

    /// Override the vector file path.
    pub fn with_vector_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vector_path = path.into();
        self
    }

    /// Override the harness settings.
    pub fn with_harness(mut self, harness: HarnessConfig) -> Self {
        self.harness = harness;
        self
    }

    /// Resolved vector file path.
    pub fn vector_file(&self) -> PathBuf {
        resolve(&self.workdir, &self.vector_path)
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Padded inputs.
    pub case: PaddedCase,
    /// Oracle outputs.
    pub expected: OracleOutputs,
    /// Parsed simulation outputs.
    pub simulated: SimulationOutputs,
    /// Check outcomes.
    pub verdict: Verdict,
}

impl RunReport {
    /// True if every enabled check passed.
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for failure in self.verdict.failures() {
            writeln!(f, "{}", failure)?;
        }
        writeln!(f, "ad = {}", self.case.associated_data.to_hex())?;
        writeln!(f, "p  = {}", self.case.plaintext.to_hex())?;
        writeln!(f, "c  = {}", hex::encode(&self.expected.ciphertext))?;
        writeln!(f, "t  = {}", hex::encode(&self.expected.tag))?;
        writeln!(f, "m  = {}", self.case.message.to_hex())?;
        writeln!(f, "h  = {}", hex::encode(&self.expected.hash))?;
        if self.passed() {
            write!(f, "PASS")
        } else {
            write!(f, "ERROR")
        }
    }
}

/// Runs test cases through a simulator and checks them against an oracle.
pub struct TestBench<S, O, M> {
    config: BenchConfig,
    simulator: S,
    oracle: O,
    writer: VectorWriter<M>,
}

impl<S: Simulator, O: Oracle, M: MaskSource> TestBench<S, O, M> {
    /// Build a bench. Shares are drawn from `masks`.
    pub fn new(config: BenchConfig, simulator: S, oracle: O, masks: M) -> Self {
        let writer = VectorWriter::new(config.harness.share_count, masks);
        Self {
            config,
            simulator,
            oracle,
            writer,
        }
    }

    /// Bench configuration.
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Write the vector file for `case` without simulating it.
    pub fn write_vectors(&mut self, case: &TestCase) -> Result<PathBuf> {
        let padded = case.pad();
        let expected = self
            .oracle
            .expected_outputs(&padded, self.config.harness.operations)?;
        self.write_program(&padded, &expected)
    }

    fn write_program(&mut self, padded: &PaddedCase, expected: &OracleOutputs) -> Result<PathBuf> {
        let program = VectorProgram::for_case(padded, expected, self.config.harness.operations);
        let text = self.writer.render(&program)?;
        let path = self.config.vector_file();
        write_file_atomic(&path, text.as_bytes())?;
        info!(
            path = %path.display(),
            instructions = program.len(),
            shares = %self.writer.share_count(),
            "vector file written"
        );
        Ok(path)
    }

    /// Run one case end to end.
    ///
    /// Tool failures and incomplete transcripts are errors. A mismatch is not:
    /// it comes back as a failed [`Verdict`] inside the report.
    pub fn run(&mut self, case: &TestCase) -> Result<RunReport> {
        let harness = self.config.harness;
        let padded = case.pad();
        let expected = self.oracle.expected_outputs(&padded, harness.operations)?;

        let path = self.write_program(&padded, &expected)?;
        let stdout = self.simulator.run(&self.config.workdir, &path)?;
        for line in stdout.lines() {
            trace!(target: "maskbench::transcript", "{}", line);
        }

        let transcript = Transcript::parse(&stdout)?;
        debug!(
            lines = transcript.line_count(),
            records = transcript.records().len(),
            "transcript parsed"
        );
        let simulated = transcript.outputs();

        let lengths = ExpectedLengths::for_case(&padded, harness.operations);
        if harness.allow_truncated {
            if let Err(e) = simulated.check_complete(&lengths) {
                warn!(error = %e, "incomplete transcript passed to the verifier");
            }
        } else {
            simulated.check_complete(&lengths)?;
        }

        let verdict = Verifier::new(harness.operations).verify(&padded, &expected, &simulated);
        if verdict.passed() {
            info!(
                simulator = self.simulator.name(),
                checks = verdict.checks().len(),
                "run passed"
            );
        } else {
            warn!(
                simulator = self.simulator.name(),
                failures = verdict.failures().count(),
                "run failed"
            );
        }

        Ok(RunReport {
            case: padded,
            expected,
            simulated,
            verdict,
        })
    }
}

impl<S, O, M> fmt::Debug for TestBench<S, O, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestBench")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Resolve `path` against `base` unless it is absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::ModelSimulator;
    use crate::IoError;
    use maskbench_core::config::Operations;
    use maskbench_core::error::HarnessError;
    use maskbench_core::model::ReferenceModel;
    use maskbench_core::oracle::AsconOracle;
    use maskbench_core::shares::{OsMaskSource, ShareCount};
    use maskbench_core::transcript::{ResultField, TranscriptError};
    use tempfile::TempDir;

    fn model_bench(
        dir: &TempDir,
        harness: HarnessConfig,
        model: ReferenceModel<AsconOracle>,
    ) -> TestBench<ModelSimulator<AsconOracle>, AsconOracle, OsMaskSource> {
        let config = BenchConfig::new(dir.path()).with_harness(harness);
        let simulator = ModelSimulator::new(model, harness.share_count);
        TestBench::new(config, simulator, AsconOracle, OsMaskSource)
    }

    /// Returns a fixed transcript regardless of the vector file.
    struct CannedSimulator(String);

    impl Simulator for CannedSimulator {
        fn name(&self) -> &str {
            "canned"
        }

        fn run(&mut self, _workdir: &Path, vector_path: &Path) -> Result<String> {
            assert!(vector_path.exists());
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_vector_file_resolution() {
        let config = BenchConfig::new("/hw");
        assert_eq!(config.vector_file(), PathBuf::from("/hw/tv/tv_shared.txt"));
        let config = config.with_vector_path("/tmp/v.txt");
        assert_eq!(config.vector_file(), PathBuf::from("/tmp/v.txt"));
        assert_eq!(
            resolve(Path::new("/a"), Path::new("b")),
            PathBuf::from("/a/b")
        );
    }

    #[test]
    fn test_reference_case_passes_with_model() {
        let dir = TempDir::new().unwrap();
        let mut bench = model_bench(
            &dir,
            HarnessConfig::default(),
            ReferenceModel::new(AsconOracle),
        );
        let report = bench.run(&TestCase::reference()).unwrap();
        assert!(report.passed());

        let text = report.to_string();
        assert!(text.contains("ad = 0001020380000000"));
        assert!(text.contains("p  = 0001020380000000"));
        assert!(text.ends_with("PASS"));
        assert!(!text.contains("ERROR"));
        assert!(dir.path().join(DEFAULT_VECTOR_FILE).exists());
    }

    #[test]
    fn test_three_shares_pass() {
        let dir = TempDir::new().unwrap();
        let harness = HarnessConfig::new(3).unwrap();
        let mut bench = model_bench(&dir, harness, ReferenceModel::new(AsconOracle));
        assert!(bench.run(&TestCase::counting(5, 11)).unwrap().passed());
    }

    #[test]
    fn test_faulty_core_reports_error() {
        let dir = TempDir::new().unwrap();
        let mut bench = model_bench(
            &dir,
            HarnessConfig::default(),
            ReferenceModel::new(AsconOracle).with_fault(ResultField::Hash),
        );
        let report = bench.run(&TestCase::reference()).unwrap();
        assert!(!report.passed());
        let text = report.to_string();
        assert!(text.contains("hashing hash: mismatch at byte 0"));
        assert!(text.ends_with("ERROR"));
    }

    #[test]
    fn test_incomplete_transcript_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = BenchConfig::new(dir.path());
        let simulator = CannedSimulator("c => 0000000000000000\n".to_string());
        let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);

        let err = bench.run(&TestCase::reference()).unwrap_err();
        assert!(matches!(
            err,
            IoError::Harness(HarnessError::Transcript(TranscriptError::MarkerMissing {
                field: ResultField::Tag,
                expected: 16,
                actual: 0,
            }))
        ));
    }

    #[test]
    fn test_repeated_validity_lines_use_first_flag() {
        let dir = TempDir::new().unwrap();
        let ops = Operations {
            decrypt: true,
            ..Operations::NONE
        };
        let config = BenchConfig::new(dir.path())
            .with_harness(HarnessConfig::default().with_operations(ops));
        let simulator = CannedSimulator("p => 0001020380000000\nv => 1\nv => 1\n".to_string());
        let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);

        let report = bench.run(&TestCase::reference()).unwrap();
        assert!(report.passed(), "{}", report);
        assert_eq!(report.simulated.validity, [1, 1]);
    }

    #[test]
    fn test_rejected_tag_transcript() {
        let dir = TempDir::new().unwrap();
        let ops = Operations {
            decrypt: true,
            ..Operations::NONE
        };
        let strict = HarnessConfig::default().with_operations(ops);

        let config = BenchConfig::new(dir.path()).with_harness(strict);
        let simulator = CannedSimulator("v => 0\n".to_string());
        let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);
        let err = bench.run(&TestCase::reference()).unwrap_err();
        assert!(matches!(
            err,
            IoError::Harness(HarnessError::Transcript(TranscriptError::MarkerMissing {
                field: ResultField::Plaintext,
                expected: 8,
                actual: 0,
            }))
        ));

        let config = BenchConfig::new(dir.path()).with_harness(strict.with_allow_truncated(true));
        let simulator = CannedSimulator("v => 0\n".to_string());
        let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);
        let report = bench.run(&TestCase::reference()).unwrap();
        assert_eq!(
            report.verdict.failures().map(|c| c.field).collect::<Vec<_>>(),
            [ResultField::Plaintext, ResultField::Validity]
        );
    }

    #[test]
    fn test_allow_truncated_fails_in_verifier() {
        let dir = TempDir::new().unwrap();
        let config = BenchConfig::new(dir.path())
            .with_harness(HarnessConfig::default().with_allow_truncated(true));
        let simulator = CannedSimulator(String::new());
        let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);

        let report = bench.run(&TestCase::reference()).unwrap();
        assert!(!report.passed());
        assert_eq!(report.verdict.failures().count(), 5);
    }

    #[test]
    fn test_disabled_operations_skip_checks() {
        let dir = TempDir::new().unwrap();
        let ops = Operations {
            hash: true,
            ..Operations::NONE
        };
        let config = BenchConfig::new(dir.path())
            .with_harness(HarnessConfig::default().with_operations(ops));
        let simulator = ModelSimulator::new(ReferenceModel::new(AsconOracle), ShareCount::TWO);
        let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);

        let report = bench.run(&TestCase::reference()).unwrap();
        assert!(report.passed());
        assert_eq!(report.verdict.checks().len(), 1);
        assert!(report.simulated.ciphertext.is_empty());

        let vectors = std::fs::read_to_string(dir.path().join(DEFAULT_VECTOR_FILE)).unwrap();
        assert!(!vectors.contains("INS 30"));
        assert!(vectors.contains("INS 51000008"));
    }

    #[test]
    fn test_write_vectors_only() {
        let dir = TempDir::new().unwrap();
        let config = BenchConfig::new(dir.path()).with_vector_path("out/vectors.txt");
        let simulator = CannedSimulator(String::new());
        let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);

        let path = bench.write_vectors(&TestCase::reference()).unwrap();
        assert_eq!(path, dir.path().join("out/vectors.txt"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Load key\nINS 30000010\n"));
    }
}
