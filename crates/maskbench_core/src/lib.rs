//! # maskbench_core
//!
//! Pure (I/O free) building blocks for co-verifying a masked Ascon hardware
//! core against a software oracle.
//!
//! ## Pipeline
//!
//! | Step | Module |
//! |------|--------|
//! | 10*-padding of the inputs | [`padding`] |
//! | XOR sharing of every data word | [`shares`] |
//! | `INS`/`DAT` vector file | [`protocol`] |
//! | Expected outputs | [`oracle`], [`ascon`] |
//! | Tagged transcript parsing | [`transcript`] |
//! | Expected vs. simulated comparison | [`verifier`] |
//!
//! [`model`] executes vector files in-process and prints a transcript in the
//! simulator's format, for runs without the hardware toolchain.
//!
//! Running the external simulator and writing files lives in `maskbench_io`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]

pub use zeroize;

/// Unified error types for consistent error handling
pub mod error;

/// Constant-time equality - uses audited `subtle` crate
pub mod ct;

/// Byte manipulation utilities (BE load/store, hex, zeroizing values)
pub mod bytes;

/// Boolean secret sharing codec
pub mod shares;

/// 10*-padding to the 8-byte block
pub mod padding;

/// Share count, core variant and operation selection
pub mod config;

/// Test case inputs
pub mod case;

/// Ascon-128 and Ascon-Hash on pre-padded input
pub mod ascon;

/// Oracle trait and the Ascon oracle
pub mod oracle;

/// Vector file writer and reader
pub mod protocol;

/// Simulation transcript parser
pub mod transcript;

/// Verdict computation
pub mod verifier;

/// In-process reference model of the hardware core
pub mod model;

/// Prelude with commonly used types
pub mod prelude {
    // Unified error type
    pub use crate::error::{HarnessError, HarnessResult};

    // Bytes and CT
    pub use crate::bytes::SecretValue;
    pub use crate::ct::ct_eq;

    // Sharing and padding
    pub use crate::padding::{pad, pad_associated_data, unpad};
    pub use crate::shares::{
        combine, split, FixedMaskSource, MaskSource, OsMaskSource, ShareCodec, ShareCount,
    };

    // Configuration and inputs
    pub use crate::case::{PaddedCase, TestCase};
    pub use crate::config::{HarnessConfig, Operations, Variant};

    // Protocol
    pub use crate::protocol::{
        parse_vector_file, Instruction, Opcode, VectorProgram, VectorWriter,
    };

    // Oracle, transcript, verdict
    pub use crate::model::ReferenceModel;
    pub use crate::oracle::{AsconOracle, Oracle, OracleOutputs};
    pub use crate::transcript::{ExpectedLengths, ResultField, SimulationOutputs, Transcript};
    pub use crate::verifier::{Check, Verdict, Verifier};
}
