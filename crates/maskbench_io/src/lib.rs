//! I/O layer for maskbench.
//!
//! This crate provides the side-effect operations around the pure harness:
//! - Filesystem operations (atomic vector file writes, bounded reads)
//! - Invocation of the external hardware simulation
//! - The test bench pipeline and the length sweep
//!
//! All codec, protocol and verification logic is in `maskbench_core`; this
//! crate only provides the I/O bridge.
//!
//! # Simulator Integration
//!
//! The hardware core is built and simulated by an external `make` based flow.
//! The bench writes the shared vector file to an agreed path, runs the flow as
//! a blocking subprocess and parses its stdout:
//!
//! ```text
//! TestBench → tv/tv_shared.txt → make VERSION=v1 VCD=1 verilator → stdout → Transcript
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use maskbench_core::prelude::*;
//! use maskbench_io::{BenchConfig, MakeSimulator, TestBench};
//!
//! let config = BenchConfig::new("hw");
//! let simulator = MakeSimulator::new(Variant::V1);
//! let mut bench = TestBench::new(config, simulator, AsconOracle, OsMaskSource);
//!
//! let report = bench.run(&TestCase::reference())?;
//! println!("{}", report);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub use maskbench_core;

use maskbench_core::error::HarnessError;

pub mod bench;
pub mod simulator;
pub mod sweep;

pub use bench::{BenchConfig, RunReport, TestBench, DEFAULT_VECTOR_FILE};
pub use simulator::{MakeSimulator, ModelSimulator, Simulator};
pub use sweep::{SweepAbort, SweepFailure, SweepPlan, SweepSummary};

/// I/O errors.
#[derive(Error, Debug)]
pub enum IoError {
    /// Filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] io::Error),

    /// File not found.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// File too large.
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// File is not UTF-8 text.
    #[error("not a UTF-8 text file: {0}")]
    NotText(PathBuf),

    /// The simulator program could not be started.
    #[error("failed to start simulator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The simulator exited unsuccessfully. No comparison was attempted.
    #[error("simulation failed ({status}){}", stderr_suffix(.stderr))]
    SimulationFailed { status: String, stderr: String },

    /// Harness error (protocol, transcript, oracle, ...).
    #[error(transparent)]
    Harness(#[from] HarnessError),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", stderr.trim_end())
    }
}

macro_rules! harness_from {
    ($($ty:path),* $(,)?) => {
        $(
            impl From<$ty> for IoError {
                fn from(e: $ty) -> Self {
                    IoError::Harness(e.into())
                }
            }
        )*
    };
}

harness_from!(
    maskbench_core::shares::ShareError,
    maskbench_core::config::ConfigError,
    maskbench_core::protocol::ProtocolError,
    maskbench_core::transcript::TranscriptError,
    maskbench_core::oracle::OracleError,
    maskbench_core::model::ModelError,
);

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Maximum file size for read operations (16 MiB).
///
/// Vector files for the sweep lengths are a few kilobytes.
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Read a file completely into a byte vector with default size limit.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    read_file_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file with a custom size limit.
///
/// # Errors
/// * `IoError::NotFound` - File does not exist
/// * `IoError::FileTooLarge` - File exceeds size limit
/// * `IoError::Fs` - Other filesystem errors
pub fn read_file_with_limit(path: impl AsRef<Path>, max_size: u64) -> Result<Vec<u8>> {
    let path = path.as_ref();

    // Size is checked on the open handle, not on the path.
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IoError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(IoError::Fs(e)),
    };

    let size = file.metadata()?.len();
    if size > max_size {
        return Err(IoError::FileTooLarge {
            size,
            limit: max_size,
        });
    }

    let mut contents = Vec::with_capacity(size as usize);
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Read a UTF-8 text file with the default size limit.
pub fn read_text_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    String::from_utf8(read_file(path)?).map_err(|_| IoError::NotText(path.to_path_buf()))
}

/// Write data to a file atomically (temp file + rename).
///
/// Missing parent directories are created.
pub fn write_file_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(".{}.tmp", rand_hex(8)));

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Random hex string for temp file names.
fn rand_hex(len: usize) -> String {
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_err() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        bytes = (nanos ^ u64::from(std::process::id())).to_be_bytes();
    }
    let hex = hex::encode(bytes);
    hex[..len.min(hex.len())].to_string()
}
