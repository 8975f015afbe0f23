//! Property-based tests for maskbench_core.
//!
//! These tests use proptest to verify invariants of the share codec, the
//! padding rule, the vector protocol and the transcript parser.

use proptest::prelude::*;

// ============================================================================
// Share Codec Property Tests
// ============================================================================

mod share_properties {
    use super::*;
    use maskbench_core::shares::*;

    proptest! {
        /// Combining a fresh split recovers the secret
        #[test]
        fn split_then_combine(secret in prop::collection::vec(any::<u8>(), 1..64), n in 1usize..8) {
            let count = ShareCount::new(n).unwrap();
            let shared = split(&secret, count, &mut OsMaskSource).unwrap();
            prop_assert_eq!(shared.len(), secret.len() * n);
            prop_assert_eq!(combine(&shared, count).unwrap(), secret);
        }

        /// Any mask pattern yields shares that combine to the secret
        #[test]
        fn mask_pattern_irrelevant(
            secret in prop::collection::vec(any::<u8>(), 4..=4),
            pattern in prop::collection::vec(any::<u8>(), 0..16),
            n in 2usize..6,
        ) {
            let count = ShareCount::new(n).unwrap();
            let mut masks = FixedMaskSource::new(pattern);
            let shared = split(&secret, count, &mut masks).unwrap();
            prop_assert_eq!(combine(&shared, count).unwrap(), secret);
        }

        /// The first n-1 shares are exactly the drawn masks
        #[test]
        fn masks_come_first(secret in prop::collection::vec(any::<u8>(), 4..=4), byte: u8, n in 2usize..6) {
            let count = ShareCount::new(n).unwrap();
            let shared = split(&secret, count, &mut FixedMaskSource::new(vec![byte])).unwrap();
            prop_assert!(shared[..4 * (n - 1)].iter().all(|&b| b == byte));
        }

        /// Buffers not divisible by the share count are rejected
        #[test]
        fn combine_rejects_ragged(len in 1usize..64, n in 2usize..8) {
            prop_assume!(len % n != 0);
            let count = ShareCount::new(n).unwrap();
            prop_assert!(combine(&vec![0u8; len], count).is_err());
        }
    }
}

// ============================================================================
// Padding Property Tests
// ============================================================================

mod padding_properties {
    use super::*;
    use maskbench_core::ascon::RATE;
    use maskbench_core::padding::*;

    proptest! {
        /// Padded output is block aligned and strictly longer
        #[test]
        fn pad_length(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let padded = pad(&data);
            prop_assert_eq!(padded.len() % RATE, 0);
            prop_assert!(padded.len() > data.len());
            prop_assert!(padded.len() <= data.len() + RATE);
            prop_assert_eq!(&padded[..data.len()], &data[..]);
            prop_assert_eq!(padded[data.len()], PAD_BYTE);
        }

        /// Unpad inverts pad
        #[test]
        fn unpad_inverts_pad(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let padded = pad(&data);
            prop_assert_eq!(unpad(&padded).unwrap(), &data[..]);
        }

        /// Empty associated data stays empty, anything else is padded
        #[test]
        fn associated_data_padding(data in prop::collection::vec(any::<u8>(), 0..32)) {
            let padded = pad_associated_data(&data);
            if data.is_empty() {
                prop_assert!(padded.is_empty());
            } else {
                prop_assert_eq!(padded, pad(&data));
            }
        }
    }
}

// ============================================================================
// Vector Protocol Property Tests
// ============================================================================

mod protocol_properties {
    use super::*;
    use maskbench_core::case::TestCase;
    use maskbench_core::config::Operations;
    use maskbench_core::oracle::{AsconOracle, Oracle};
    use maskbench_core::protocol::*;
    use maskbench_core::shares::{OsMaskSource, ShareCount};

    fn operations() -> impl Strategy<Value = Operations> {
        (any::<bool>(), any::<bool>(), any::<bool>())
            .prop_filter("at least one operation", |(e, d, h)| *e || *d || *h)
            .prop_map(|(encrypt, decrypt, hash)| Operations {
                encrypt,
                decrypt,
                hash,
            })
    }

    proptest! {
        /// A rendered program parses back to itself for any share count
        #[test]
        fn rendered_program_parses(
            ad_len in 0usize..24,
            pt_len in 0usize..24,
            n in 2usize..5,
            ops in operations(),
        ) {
            let case = TestCase::counting(ad_len, pt_len).pad();
            let expected = AsconOracle.expected_outputs(&case, ops).unwrap();
            let program = VectorProgram::for_case(&case, &expected, ops);

            let count = ShareCount::new(n).unwrap();
            let mut writer = VectorWriter::new(count, OsMaskSource);
            let text = writer.render(&program).unwrap();

            prop_assert_eq!(parse_vector_file(&text, count).unwrap(), program);
        }

        /// The key is loaded at most once, and only when it is used
        #[test]
        fn key_loaded_once(ad_len in 0usize..16, pt_len in 0usize..16, ops in operations()) {
            let case = TestCase::counting(ad_len, pt_len).pad();
            let expected = AsconOracle.expected_outputs(&case, ops).unwrap();
            let program = VectorProgram::for_case(&case, &expected, ops);

            let key_loads = program
                .instructions()
                .iter()
                .filter(|i| i.opcode == Opcode::LoadKey)
                .count();
            prop_assert_eq!(key_loads, usize::from(ops.needs_key()));
        }

        /// Every header carries a word-aligned length
        #[test]
        fn headers_are_word_aligned(ad_len in 0usize..16, pt_len in 0usize..16) {
            let case = TestCase::counting(ad_len, pt_len).pad();
            let expected = AsconOracle.expected_outputs(&case, Operations::ALL).unwrap();
            let program = VectorProgram::for_case(&case, &expected, Operations::ALL);
            for instruction in program.instructions() {
                prop_assert!(instruction.validate().is_ok());
                let header = instruction.header();
                let len = usize::from_str_radix(&header[6..], 16).unwrap();
                prop_assert_eq!(len % WORD_SIZE, 0);
                prop_assert_eq!(len, instruction.payload.len());
            }
        }

        /// Arbitrary text never panics the reader
        #[test]
        fn reader_total(text in "[ -~\n]{0,200}", n in 1usize..5) {
            let _ = parse_vector_file(&text, ShareCount::new(n).unwrap());
        }
    }
}

// ============================================================================
// Transcript Property Tests
// ============================================================================

mod transcript_properties {
    use super::*;
    use maskbench_core::transcript::*;

    proptest! {
        /// Values printed in `h =>` lines come back in order
        #[test]
        fn hash_lines_roundtrip(words in prop::collection::vec(any::<u64>(), 1..6)) {
            let text: String = words
                .iter()
                .map(|w| format!("h => {:016x}\n", w))
                .collect();
            let outputs = Transcript::parse(&text).unwrap().outputs();
            let expected: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
            prop_assert_eq!(outputs.field(ResultField::Hash), &expected[..]);
        }

        /// Unrelated simulator chatter is ignored
        #[test]
        fn chatter_ignored(chatter in prop::collection::vec("[a-z ]{0,30}", 0..10), word: u64) {
            let mut text: String = chatter.iter().map(|l| format!("{}\n", l)).collect();
            text.push_str(&format!("c => {:016x}\n", word));
            let outputs = Transcript::parse(&text).unwrap().outputs();
            prop_assert_eq!(outputs.field(ResultField::Ciphertext), &word.to_be_bytes()[..]);
        }

        /// Arbitrary text never panics the parser
        #[test]
        fn parser_total(text in "[ -~\n]{0,200}") {
            let _ = Transcript::parse(&text);
        }
    }
}
