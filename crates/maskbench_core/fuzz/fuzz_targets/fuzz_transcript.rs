//! Fuzz target for simulation transcript parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use maskbench_core::transcript::{ExpectedLengths, Transcript};

fuzz_target!(|text: &str| {
    let Ok(transcript) = Transcript::parse(text) else {
        return;
    };

    assert!(transcript.line_count() <= text.lines().count());
    let outputs = transcript.outputs();
    let _ = outputs.validity_flag();
    let _ = outputs.check_complete(&ExpectedLengths::default());
});
