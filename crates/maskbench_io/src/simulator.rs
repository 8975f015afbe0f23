//! Simulation backends.
//!
//! A [`Simulator`] consumes the vector file the bench just wrote and returns
//! the transcript text. [`MakeSimulator`] drives the hardware build flow;
//! [`ModelSimulator`] runs the in-process reference model instead.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use maskbench_core::config::Variant;
use maskbench_core::model::ReferenceModel;
use maskbench_core::oracle::Oracle;
use maskbench_core::shares::ShareCount;

use crate::{read_text_file, IoError, Result};

/// Default build tool.
pub const DEFAULT_MAKE_PROGRAM: &str = "make";

/// Default simulation target.
pub const DEFAULT_MAKE_TARGET: &str = "verilator";

/// Bytes of stderr kept in a [`IoError::SimulationFailed`].
const STDERR_TAIL: usize = 4096;

/// Runs one simulation of a vector file.
pub trait Simulator {
    /// Short backend name for logs and reports.
    fn name(&self) -> &str;

    /// Simulate `vector_path` inside `workdir` and return the transcript.
    ///
    /// A failing run is an error; the caller must not compare anything.
    fn run(&mut self, workdir: &Path, vector_path: &Path) -> Result<String>;
}

impl<S: Simulator + ?Sized> Simulator for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&mut self, workdir: &Path, vector_path: &Path) -> Result<String> {
        (**self).run(workdir, vector_path)
    }
}

/// `make VERSION=<variant> VCD=<0|1> <target>` in the working directory.
///
/// The makefile reads the vector file from its own fixed location; the bench
/// must write it there.
#[derive(Debug, Clone)]
pub struct MakeSimulator {
    /// Build tool.
    pub program: String,
    /// Make target.
    pub target: String,
    /// Core variant.
    pub variant: Variant,
    /// Dump a VCD trace.
    pub trace: bool,
}

impl MakeSimulator {
    /// `make ... verilator` for `variant` with tracing on.
    pub fn new(variant: Variant) -> Self {
        Self {
            program: DEFAULT_MAKE_PROGRAM.to_string(),
            target: DEFAULT_MAKE_TARGET.to_string(),
            variant,
            trace: true,
        }
    }

    /// Use another build tool.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Use another make target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Toggle VCD trace capture.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Arguments passed to the build tool.
    pub fn args(&self) -> Vec<String> {
        vec![
            format!("VERSION={}", self.variant),
            format!("VCD={}", u8::from(self.trace)),
            self.target.clone(),
        ]
    }
}

impl Simulator for MakeSimulator {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&mut self, workdir: &Path, vector_path: &Path) -> Result<String> {
        let args = self.args();
        info!(
            program = %self.program,
            args = ?args,
            workdir = %workdir.display(),
            vectors = %vector_path.display(),
            "starting simulation"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| IoError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            warn!(status = %output.status, "simulation failed");
            return Err(IoError::SimulationFailed {
                status: output.status.to_string(),
                stderr: tail(&stderr, STDERR_TAIL).to_string(),
            });
        }

        debug!(
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "simulation finished"
        );
        Ok(stdout)
    }
}

fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Runs the vector file through a [`ReferenceModel`].
#[derive(Debug, Clone)]
pub struct ModelSimulator<O> {
    model: ReferenceModel<O>,
    share_count: ShareCount,
}

impl<O: Oracle> ModelSimulator<O> {
    /// Model that decodes vector files written with `share_count` shares.
    pub fn new(model: ReferenceModel<O>, share_count: ShareCount) -> Self {
        Self { model, share_count }
    }
}

impl<O: Oracle> Simulator for ModelSimulator<O> {
    fn name(&self) -> &str {
        "model"
    }

    fn run(&mut self, _workdir: &Path, vector_path: &Path) -> Result<String> {
        let text = read_text_file(vector_path)?;
        let transcript = self.model.run_vector_file(&text, self.share_count)?;
        debug!(
            vectors = %vector_path.display(),
            lines = transcript.lines().count(),
            "reference model finished"
        );
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maskbench_core::oracle::AsconOracle;
    use tempfile::TempDir;

    #[test]
    fn test_make_args() {
        let sim = MakeSimulator::new(Variant::V2);
        assert_eq!(sim.args(), ["VERSION=v2", "VCD=1", "verilator"]);

        let sim = MakeSimulator::new(Variant::V3)
            .with_trace(false)
            .with_target("sim");
        assert_eq!(sim.args(), ["VERSION=v3", "VCD=0", "sim"]);
    }

    #[test]
    fn test_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let mut sim =
            MakeSimulator::new(Variant::V1).with_program("maskbench-no-such-program-xyz");
        let result = sim.run(dir.path(), &dir.path().join("tv.txt"));
        assert!(matches!(result, Err(IoError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_simulation_failure() {
        let dir = TempDir::new().unwrap();
        // `false` ignores its arguments and exits 1.
        let mut sim = MakeSimulator::new(Variant::V1).with_program("false");
        let result = sim.run(dir.path(), &dir.path().join("tv.txt"));
        assert!(matches!(result, Err(IoError::SimulationFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_is_returned() {
        let dir = TempDir::new().unwrap();
        // `echo` prints its arguments.
        let mut sim = MakeSimulator::new(Variant::V1).with_program("echo");
        let out = sim.run(dir.path(), &dir.path().join("tv.txt")).unwrap();
        assert_eq!(out, "VERSION=v1 VCD=1 verilator\n");
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("abcdef", 2), "ef");
        assert_eq!(tail("aé", 1), "");
    }

    #[test]
    fn test_model_simulator_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut sim = ModelSimulator::new(ReferenceModel::new(AsconOracle), ShareCount::TWO);
        assert_eq!(sim.name(), "model");
        assert!(matches!(
            sim.run(dir.path(), &dir.path().join("missing.txt")),
            Err(IoError::NotFound(_))
        ));
    }
}
