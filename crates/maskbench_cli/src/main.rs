//! maskbench CLI
//!
//! Co-verifies a masked Ascon hardware core against the software oracle.
//! Every run pads the inputs, splits them into fresh random shares, writes the
//! vector file, runs the simulation and compares its transcript with the
//! oracle.
//!
//! # Environment Variables
//!
//! - `MASKBENCH_WORKDIR` - Directory the simulation runs in (default: `.`)
//! - `MASKBENCH_VECTOR_FILE` - Vector file path, relative to the workdir
//!   (default: `tv/tv_shared.txt`)
//! - `MASKBENCH_MAKE` - Build tool invoked for the simulation (default: `make`)
//! - `RUST_LOG` - Log filter when no `-v` is given (logs go to stderr)
//!
//! # Backends
//!
//! | Backend | Runs |
//! |---------|------|
//! | `make` | `make VERSION=v<variant> VCD=<0|1> verilator` in the workdir |
//! | `model` | the in-process reference model, no hardware toolchain needed |
//!
//! # Examples
//!
//! ```bash
//! # Reference scenario on core variant 2 with three shares
//! maskbench --variant 2 -d 3 single
//!
//! # All AD/plaintext lengths up to 16 bytes, reporting every failure
//! maskbench sweep --keep-going
//!
//! # Inspect a vector file
//! maskbench decode tv/tv_shared.txt
//! ```

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use maskbench_core::case::TestCase;
use maskbench_core::config::{HarnessConfig, Operations, Variant};
use maskbench_core::model::ReferenceModel;
use maskbench_core::oracle::AsconOracle;
use maskbench_core::padding::unpad;
use maskbench_core::protocol::{parse_vector_file, Instruction, Opcode};
use maskbench_core::shares::OsMaskSource;
use maskbench_io::simulator::{DEFAULT_MAKE_PROGRAM, DEFAULT_MAKE_TARGET};
use maskbench_io::sweep::{DEFAULT_MAX_AD_LEN, DEFAULT_MAX_PT_LEN};
use maskbench_io::{
    read_text_file, BenchConfig, MakeSimulator, ModelSimulator, RunReport, Simulator, SweepPlan,
    SweepSummary, TestBench, DEFAULT_VECTOR_FILE,
};

/// maskbench - Test bench for masked Ascon hardware cores.
#[derive(Parser)]
#[command(name = "maskbench")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output format.
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Core variant: 1, 2 or 3.
    #[arg(long, global = true, default_value = "1")]
    variant: Variant,

    /// Shares per data word (at least 2).
    #[arg(short = 'd', long, global = true, default_value_t = 2, value_parser = parse_share_count)]
    num_shares: usize,

    /// Skip authenticated encryption.
    #[arg(long, global = true)]
    no_enc: bool,

    /// Skip authenticated decryption.
    #[arg(long, global = true)]
    no_dec: bool,

    /// Skip hashing.
    #[arg(long, global = true)]
    no_hash: bool,

    /// Do not capture a VCD trace.
    #[arg(long, global = true)]
    no_trace: bool,

    /// Simulation backend.
    #[arg(long, global = true, value_enum, default_value_t = Backend::Make)]
    backend: Backend,

    /// Directory the simulation runs in.
    #[arg(long, global = true, env = "MASKBENCH_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Vector file path, relative to the workdir unless absolute.
    #[arg(long, global = true, env = "MASKBENCH_VECTOR_FILE", default_value = DEFAULT_VECTOR_FILE)]
    vector_file: PathBuf,

    /// Build tool for the `make` backend.
    #[arg(long, global = true, env = "MASKBENCH_MAKE", default_value = DEFAULT_MAKE_PROGRAM)]
    make_program: String,

    /// Simulation target for the `make` backend.
    #[arg(long, global = true, default_value = DEFAULT_MAKE_TARGET)]
    make_target: String,

    /// Compare short transcripts instead of rejecting them.
    #[arg(long, global = true)]
    allow_truncated: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reference scenario once (key = nonce = 00..0f, AD = PT = 00010203).
    Single,

    /// Run every AD/plaintext length combination.
    Sweep {
        /// Longest associated data, in bytes.
        #[arg(long, default_value_t = DEFAULT_MAX_AD_LEN)]
        max_ad: usize,

        /// Longest plaintext, in bytes.
        #[arg(long, default_value_t = DEFAULT_MAX_PT_LEN)]
        max_pt: usize,

        /// Continue after a failing configuration.
        #[arg(long)]
        keep_going: bool,
    },

    /// Write the vector file for the reference scenario without simulating.
    WriteVectors,

    /// Recombine and print the instructions of a vector file.
    Decode {
        /// Vector file to decode.
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// External build flow.
    Make,
    /// In-process reference model.
    Model,
}

/// Parse and validate the share count argument
fn parse_share_count(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a share count", s))?;
    HarnessConfig::new(n).map_err(|e| e.to_string())?;
    Ok(n)
}

/// JSON output wrapper.
#[derive(Serialize)]
struct JsonOutput<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }

    fn error_with_data(msg: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(msg.into()),
        }
    }
}

/// Error already reported on stdout; only the exit status is left to set.
#[derive(Debug)]
struct Reported(String);

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Reported {}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<Reported>() => {
            if !cli.json {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            if cli.json {
                let output: JsonOutput<()> = JsonOutput::error(e.to_string());
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => println!("{}", json),
                    Err(json_err) => {
                        eprintln!("Error: {} (JSON serialization failed: {})", e, json_err);
                    }
                }
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn run_command(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Single => handle_single(cli),
        Commands::Sweep {
            max_ad,
            max_pt,
            keep_going,
        } => handle_sweep(cli, SweepPlan::new(*max_ad, *max_pt).with_keep_going(*keep_going)),
        Commands::WriteVectors => handle_write_vectors(cli),
        Commands::Decode { file } => handle_decode(cli, file),
    }
}

fn harness_config(cli: &Cli) -> Result<HarnessConfig, Box<dyn std::error::Error>> {
    let operations = Operations {
        encrypt: !cli.no_enc,
        decrypt: !cli.no_dec,
        hash: !cli.no_hash,
    };
    Ok(HarnessConfig::new(cli.num_shares)?
        .with_operations(operations)
        .with_allow_truncated(cli.allow_truncated))
}

fn make_simulator(cli: &Cli, harness: &HarnessConfig) -> Box<dyn Simulator> {
    match cli.backend {
        Backend::Make => Box::new(
            MakeSimulator::new(cli.variant)
                .with_program(cli.make_program.clone())
                .with_target(cli.make_target.clone())
                .with_trace(!cli.no_trace),
        ),
        Backend::Model => Box::new(ModelSimulator::new(
            ReferenceModel::new(AsconOracle),
            harness.share_count,
        )),
    }
}

fn bench_config(cli: &Cli, harness: HarnessConfig) -> BenchConfig {
    debug!(
        variant = %cli.variant,
        shares = harness.share_count.get(),
        backend = backend_name(cli.backend),
        operations = ?harness.operations,
        "bench configuration"
    );
    BenchConfig::new(&cli.workdir)
        .with_vector_path(&cli.vector_file)
        .with_harness(harness)
}

fn require_operations(harness: &HarnessConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !harness.operations.any() {
        return Err("--no-enc, --no-dec and --no-hash leave nothing to run".into());
    }
    Ok(())
}

/// Single result for JSON output.
#[derive(Serialize)]
struct SingleResult<'a> {
    variant: Variant,
    shares: usize,
    backend: &'static str,
    report: &'a RunReport,
}

fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Make => "make",
        Backend::Model => "model",
    }
}

fn handle_single(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let harness = harness_config(cli)?;
    require_operations(&harness)?;

    let case = TestCase::reference();
    let mut simulator = make_simulator(cli, &harness);
    let mut bench = TestBench::new(
        bench_config(cli, harness),
        simulator.as_mut(),
        AsconOracle,
        OsMaskSource,
    );

    if !cli.json {
        println!("{}", cli.variant);
        println!("k  = {}", case.key.to_hex());
        println!("n  = {}", case.nonce.to_hex());
    }

    let report = bench.run(&case)?;

    if cli.json {
        let data = SingleResult {
            variant: cli.variant,
            shares: cli.num_shares,
            backend: backend_name(cli.backend),
            report: &report,
        };
        let output = if report.passed() {
            JsonOutput::success(data)
        } else {
            JsonOutput::error_with_data("comparison failed", data)
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", report);
    }

    if !report.passed() {
        return Err(Reported("comparison failed".to_string()).into());
    }
    if !cli.json {
        println!("ALL PASS");
    }
    Ok(())
}

/// Sweep result for JSON output.
#[derive(Serialize)]
struct SweepResult<'a> {
    variant: Variant,
    shares: usize,
    backend: &'static str,
    max_ad: usize,
    max_pt: usize,
    summary: &'a SweepSummary,
}

fn handle_sweep(cli: &Cli, plan: SweepPlan) -> Result<(), Box<dyn std::error::Error>> {
    let harness = harness_config(cli)?;
    require_operations(&harness)?;

    let mut simulator = make_simulator(cli, &harness);
    let mut bench = TestBench::new(
        bench_config(cli, harness),
        simulator.as_mut(),
        AsconOracle,
        OsMaskSource,
    );

    if !cli.json {
        println!("{}", cli.variant);
        eprintln!("Sweeping {} configurations...", plan.len());
    }

    let json = cli.json;
    let summary = plan.run(&mut bench, |ad_len, pt_len, report| {
        if json {
            return;
        }
        if report.passed() {
            println!("ad_len = {:>3}  pt_len = {:>3}  PASS", ad_len, pt_len);
        } else {
            println!("ad_len = {:>3}  pt_len = {:>3}", ad_len, pt_len);
            println!("{}", report);
        }
    });

    let failed = summary.failures.len();
    let failure = if let Some(abort) = &summary.aborted {
        Some(format!(
            "sweep aborted at ad_len = {}, pt_len = {} after {} configuration(s), {} failed: {}",
            abort.ad_len, abort.pt_len, summary.runs, failed, abort.error
        ))
    } else if summary.stopped_early {
        Some(format!("sweep stopped after {} configuration(s)", summary.runs))
    } else if failed > 0 {
        Some(format!("{} of {} configuration(s) failed", failed, summary.runs))
    } else {
        None
    };

    if cli.json {
        let data = SweepResult {
            variant: cli.variant,
            shares: cli.num_shares,
            backend: backend_name(cli.backend),
            max_ad: *plan.ad_lengths.end(),
            max_pt: *plan.pt_lengths.end(),
            summary: &summary,
        };
        let output = match &failure {
            None => JsonOutput::success(data),
            Some(msg) => JsonOutput::error_with_data(msg.clone(), data),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if let Some(msg) = failure {
        return Err(Reported(msg).into());
    }
    if !cli.json {
        println!("ALL PASS");
    }
    Ok(())
}

/// Write-vectors result for JSON output.
#[derive(Serialize)]
struct WriteResult {
    path: String,
    shares: usize,
}

fn handle_write_vectors(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let harness = harness_config(cli)?;
    let mut simulator = make_simulator(cli, &harness);
    let mut bench = TestBench::new(
        bench_config(cli, harness),
        simulator.as_mut(),
        AsconOracle,
        OsMaskSource,
    );

    let path = bench.write_vectors(&TestCase::reference())?;

    if cli.json {
        let output = JsonOutput::success(WriteResult {
            path: path.display().to_string(),
            shares: cli.num_shares,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Vector file written: {}", path.display());
    }
    Ok(())
}

/// Decoded instruction for JSON output.
#[derive(Serialize)]
struct DecodedInstruction {
    opcode: String,
    description: &'static str,
    length: usize,
    final_segment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unpadded_length: Option<usize>,
    payload: String,
}

/// Length before 10*-padding, for loads the bench pads.
fn unpadded_length(instruction: &Instruction) -> Option<usize> {
    match instruction.opcode {
        Opcode::LoadAssociatedData | Opcode::LoadPlaintext | Opcode::LoadMessage => {
            unpad(&instruction.payload).ok().map(<[u8]>::len)
        }
        _ => None,
    }
}

fn handle_decode(cli: &Cli, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let harness = harness_config(cli)?;
    let text = read_text_file(file)?;
    let program = parse_vector_file(&text, harness.share_count)?;

    let decoded: Vec<DecodedInstruction> = program
        .instructions()
        .iter()
        .map(|i| DecodedInstruction {
            opcode: format!("{:02x}", i.opcode.byte()),
            description: i.opcode.description(),
            length: i.payload.len(),
            final_segment: i.opcode.is_final_segment(),
            unpadded_length: unpadded_length(i),
            payload: hex::encode(&i.payload),
        })
        .collect();

    if cli.json {
        let output = JsonOutput::success(decoded);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for d in &decoded {
            let length = match d.unpadded_length {
                Some(n) => format!("{} ({})", d.length, n),
                None => d.length.to_string(),
            };
            println!(
                "{}  {:<32} {:>8}  {}",
                d.opcode, d.description, length, d.payload
            );
        }
        eprintln!(
            "{} instruction(s), {} share(s) per word",
            decoded.len(),
            harness.share_count
        );
    }
    Ok(())
}
