//! Fuzz target for vector file parsing.
//!
//! Malformed vector files must be rejected with an error, never a panic, and
//! anything that parses must render and parse back to the same program.

#![no_main]

use libfuzzer_sys::fuzz_target;
use maskbench_core::protocol::{parse_vector_file, VectorWriter};
use maskbench_core::shares::{FixedMaskSource, ShareCount};

fuzz_target!(|input: (u8, &str)| {
    let (shares, text) = input;
    let Ok(count) = ShareCount::new(usize::from(shares % 8) + 1) else {
        return;
    };

    let Ok(program) = parse_vector_file(text, count) else {
        return;
    };

    let mut writer = VectorWriter::new(count, FixedMaskSource::new(vec![shares]));
    let rendered = writer
        .render(&program)
        .expect("parsed program must render");
    let reparsed = parse_vector_file(&rendered, count).expect("rendered program must parse");
    assert_eq!(reparsed, program);
});
