//! The Ascon permutation over a 320-bit state of five big-endian lanes.

use crate::bytes::rotr64;

/// Maximum number of rounds (p^a).
pub const MAX_ROUNDS: usize = 12;

/// Ascon state: five 64-bit lanes x0..x4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State(pub [u64; 5]);

impl State {
    /// State from five lanes.
    pub const fn new(lanes: [u64; 5]) -> Self {
        Self(lanes)
    }

    /// Apply the last `rounds` rounds of the 12-round permutation.
    ///
    /// # Panics
    /// Panics if `rounds > 12`.
    pub fn permute(&mut self, rounds: usize) {
        assert!(rounds <= MAX_ROUNDS, "ascon permutation has at most 12 rounds");
        for r in (MAX_ROUNDS - rounds)..MAX_ROUNDS {
            self.round(round_constant(r));
        }
    }

    #[inline]
    fn round(&mut self, c: u64) {
        let [mut x0, mut x1, mut x2, mut x3, mut x4] = self.0;

        // Constant addition
        x2 ^= c;

        // Substitution layer (bitsliced 5-bit S-box)
        x0 ^= x4;
        x4 ^= x3;
        x2 ^= x1;
        let t0 = !x0 & x1;
        let t1 = !x1 & x2;
        let t2 = !x2 & x3;
        let t3 = !x3 & x4;
        let t4 = !x4 & x0;
        x0 ^= t1;
        x1 ^= t2;
        x2 ^= t3;
        x3 ^= t4;
        x4 ^= t0;
        x1 ^= x0;
        x0 ^= x4;
        x3 ^= x2;
        x2 = !x2;

        // Linear diffusion layer
        x0 ^= rotr64(x0, 19) ^ rotr64(x0, 28);
        x1 ^= rotr64(x1, 61) ^ rotr64(x1, 39);
        x2 ^= rotr64(x2, 1) ^ rotr64(x2, 6);
        x3 ^= rotr64(x3, 10) ^ rotr64(x3, 17);
        x4 ^= rotr64(x4, 7) ^ rotr64(x4, 41);

        self.0 = [x0, x1, x2, x3, x4];
    }
}

/// Round constant of round `r` (0..12): 0xf0, 0xe1, ..., 0x4b.
#[inline]
const fn round_constant(r: usize) -> u64 {
    (((0x0f - r) << 4) | r) as u64
}
