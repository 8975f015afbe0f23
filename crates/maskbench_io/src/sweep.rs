//! Length sweep.
//!
//! Runs the bench over every (associated data length, plaintext length) pair
//! of two inclusive ranges, one configuration after the other, on the same
//! vector file.

use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::{error, info, warn};

use maskbench_core::case::TestCase;
use maskbench_core::oracle::Oracle;
use maskbench_core::shares::MaskSource;

use crate::bench::{RunReport, TestBench};
use crate::simulator::Simulator;

/// Default longest associated data of a sweep, in bytes.
pub const DEFAULT_MAX_AD_LEN: usize = 16;

/// Default longest plaintext of a sweep, in bytes.
pub const DEFAULT_MAX_PT_LEN: usize = 16;

/// Which lengths to run and what to do after a failing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    /// Associated data lengths.
    pub ad_lengths: RangeInclusive<usize>,
    /// Plaintext lengths.
    pub pt_lengths: RangeInclusive<usize>,
    /// Continue after a failing configuration instead of stopping.
    pub keep_going: bool,
}

impl SweepPlan {
    /// All lengths from 0 up to the given maxima; stop at the first failure.
    pub fn new(max_ad_len: usize, max_pt_len: usize) -> Self {
        Self {
            ad_lengths: 0..=max_ad_len,
            pt_lengths: 0..=max_pt_len,
            keep_going: false,
        }
    }

    /// Toggle continuing after failures.
    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Configurations in run order (AD length outer, plaintext length inner).
    pub fn configurations(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ad_lengths
            .clone()
            .flat_map(move |ad| self.pt_lengths.clone().map(move |pt| (ad, pt)))
    }

    /// Number of configurations.
    pub fn len(&self) -> usize {
        self.ad_lengths.clone().count() * self.pt_lengths.clone().count()
    }

    /// True if a range is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the sweep.
    ///
    /// `on_report` sees every report, failing ones included, before the sweep
    /// decides whether to continue. A tool or transcript error ends the sweep
    /// and is recorded in [`SweepSummary::aborted`] next to the failures
    /// collected so far.
    pub fn run<S, O, M, F>(&self, bench: &mut TestBench<S, O, M>, mut on_report: F) -> SweepSummary
    where
        S: Simulator,
        O: Oracle,
        M: MaskSource,
        F: FnMut(usize, usize, &RunReport),
    {
        let mut summary = SweepSummary::default();

        for (ad_len, pt_len) in self.configurations() {
            let report = match bench.run(&TestCase::counting(ad_len, pt_len)) {
                Ok(report) => report,
                Err(e) => {
                    error!(ad_len, pt_len, error = %e, "sweep aborted");
                    summary.aborted = Some(SweepAbort {
                        ad_len,
                        pt_len,
                        error: e.to_string(),
                    });
                    break;
                }
            };
            on_report(ad_len, pt_len, &report);
            summary.runs += 1;

            if report.passed() {
                continue;
            }

            warn!(ad_len, pt_len, "sweep configuration failed");
            summary.failures.push(SweepFailure {
                ad_len,
                pt_len,
                report,
            });
            if !self.keep_going {
                summary.stopped_early = true;
                break;
            }
        }

        info!(
            runs = summary.runs,
            failures = summary.failures.len(),
            aborted = summary.aborted.is_some(),
            "sweep finished"
        );
        summary
    }
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AD_LEN, DEFAULT_MAX_PT_LEN)
    }
}

/// A failing sweep configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    /// Associated data length.
    pub ad_len: usize,
    /// Plaintext length.
    pub pt_len: usize,
    /// The failing run.
    pub report: RunReport,
}

/// Configuration whose run ended in an error instead of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepAbort {
    /// Associated data length.
    pub ad_len: usize,
    /// Plaintext length.
    pub pt_len: usize,
    /// Tool, transcript or protocol error.
    pub error: String,
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepSummary {
    /// Configurations that produced a report.
    pub runs: usize,
    /// Failing configurations, in run order.
    pub failures: Vec<SweepFailure>,
    /// True if a failure stopped the sweep.
    pub stopped_early: bool,
    /// Error that ended the sweep, if any.
    pub aborted: Option<SweepAbort>,
}

impl SweepSummary {
    /// True if no configuration failed and nothing aborted the sweep.
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::BenchConfig;
    use crate::simulator::ModelSimulator;
    use crate::IoError;
    use maskbench_core::config::{HarnessConfig, Operations};
    use maskbench_core::model::ReferenceModel;
    use maskbench_core::oracle::AsconOracle;
    use maskbench_core::shares::{OsMaskSource, ShareCount};
    use maskbench_core::transcript::ResultField;
    use std::path::Path;
    use tempfile::TempDir;

    fn bench(
        dir: &TempDir,
        model: ReferenceModel<AsconOracle>,
    ) -> TestBench<ModelSimulator<AsconOracle>, AsconOracle, OsMaskSource> {
        TestBench::new(
            BenchConfig::new(dir.path()),
            ModelSimulator::new(model, ShareCount::TWO),
            AsconOracle,
            OsMaskSource,
        )
    }

    #[test]
    fn test_configurations_order() {
        let plan = SweepPlan::new(1, 2);
        let configs: Vec<_> = plan.configurations().collect();
        assert_eq!(configs, [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(plan.len(), 6);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_sweep_passes_with_model() {
        let dir = TempDir::new().unwrap();
        let mut bench = bench(&dir, ReferenceModel::new(AsconOracle));
        let mut seen = 0;
        let summary = SweepPlan::new(9, 9)
            .run(&mut bench, |_, _, report| {
                assert!(report.passed());
                seen += 1;
            });
        assert!(summary.passed());
        assert_eq!(summary.runs, 100);
        assert_eq!(seen, 100);
        assert!(!summary.stopped_early);
    }

    #[test]
    fn test_sweep_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let mut bench = bench(
            &dir,
            ReferenceModel::new(AsconOracle).with_fault(ResultField::Ciphertext),
        );
        let summary = SweepPlan::new(3, 3).run(&mut bench, |_, _, _| {});
        assert_eq!(summary.runs, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!((summary.failures[0].ad_len, summary.failures[0].pt_len), (0, 0));
        assert!(summary.stopped_early);
    }

    #[test]
    fn test_sweep_keep_going_records_every_failure() {
        let dir = TempDir::new().unwrap();
        let mut bench = bench(
            &dir,
            ReferenceModel::new(AsconOracle).with_fault(ResultField::Validity),
        );
        let summary = SweepPlan::new(1, 1)
            .with_keep_going(true)
            .run(&mut bench, |_, _, _| {});
        assert_eq!(summary.runs, 4);
        assert_eq!(summary.failures.len(), 4);
        assert!(!summary.stopped_early);
        assert!(summary.aborted.is_none());
    }

    /// Fails its first run with a wrong digest, then breaks.
    struct FailThenBreak {
        calls: usize,
    }

    impl Simulator for FailThenBreak {
        fn name(&self) -> &str {
            "fail-then-break"
        }

        fn run(&mut self, _workdir: &Path, _vector_path: &Path) -> crate::Result<String> {
            self.calls += 1;
            if self.calls == 1 {
                Ok("h => 0000000000000000\n".repeat(4))
            } else {
                Err(IoError::SimulationFailed {
                    status: "exit status: 2".to_string(),
                    stderr: "build broke".to_string(),
                })
            }
        }
    }

    #[test]
    fn test_abort_keeps_earlier_failures() {
        let dir = TempDir::new().unwrap();
        let ops = Operations {
            hash: true,
            ..Operations::NONE
        };
        let config = BenchConfig::new(dir.path())
            .with_harness(HarnessConfig::default().with_operations(ops));
        let mut bench = TestBench::new(
            config,
            FailThenBreak { calls: 0 },
            AsconOracle,
            OsMaskSource,
        );

        let mut reported = Vec::new();
        let summary = SweepPlan::new(1, 0)
            .with_keep_going(true)
            .run(&mut bench, |ad, pt, report| reported.push((ad, pt, report.passed())));

        assert_eq!(reported, [(0, 0, false)]);
        assert_eq!(summary.runs, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].ad_len, 0);
        let aborted = summary.aborted.as_ref().unwrap();
        assert_eq!((aborted.ad_len, aborted.pt_len), (1, 0));
        assert!(aborted.error.contains("build broke"));
        assert!(!summary.passed());
    }
}
