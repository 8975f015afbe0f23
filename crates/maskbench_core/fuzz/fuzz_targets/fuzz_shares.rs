//! Fuzz target for the share codec.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use maskbench_core::shares::{combine, split, FixedMaskSource, ShareCount};

#[derive(Debug, Arbitrary)]
struct Input {
    shares: u8,
    masks: Vec<u8>,
    secret: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let Ok(count) = ShareCount::new(usize::from(input.shares % 16) + 1) else {
        return;
    };

    let mut masks = FixedMaskSource::new(input.masks);
    let shared = split(&input.secret, count, &mut masks).expect("fixed masks never fail");
    assert_eq!(shared.len(), input.secret.len() * count.get());
    assert_eq!(combine(&shared, count).expect("split output combines"), input.secret);
});
