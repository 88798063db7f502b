// xorshift128+ generator: forward transition, exact inverse, output mapping.
//
// This crate is the concrete half of the workspace. `shiftback_solver`
// recovers a `GeneratorState` from observed doubles; this crate is what
// callers use afterwards to walk that state through the sequence, either
// raw (`GeneratorState::forward` / `backward`) or through the batched
// logical `Cursor` in `cursor.rs`.
//
// Module overview:
// - `lib.rs` (this file): `GeneratorState`, the transition `T`, its inverse,
//   the state -> double mapping, and SplitMix64 seeding.
// - `cursor.rs`: `Cursor`, a logical position in the output sequence with a
//   64-slot refill window.
//
// **Critical constraint: bit exactness.** Every operation here must agree
// bit-for-bit with the generator being modeled. All word arithmetic is
// wrapping 64-bit; the only floating-point operation is the final
// `to_double` subtraction, which is exact for every 52-bit mantissa.

pub mod cursor;

pub use cursor::{Cursor, OffsetOutOfRange};

use serde::{Deserialize, Serialize};

/// Number of mantissa bits carried by each output double.
pub const MANTISSA_BITS: u32 = 52;

/// Mask selecting the mantissa field of an IEEE-754 double.
pub const MANTISSA_MASK: u64 = 0x000F_FFFF_FFFF_FFFF;

/// Bits of `lo` dropped by the output mapping (`lo >> 12`).
pub const DISCARDED_LOW_BITS: u32 = 64 - MANTISSA_BITS;

/// Exponent field of 1.0; or-ing a mantissa into it yields a double in [1, 2).
const EXPONENT_ONE: u64 = 0x3FF0_0000_0000_0000;

/// Full xorshift128+ state.
///
/// Values are immutable: `forward` and `backward` return a new state. When
/// packed into 128 bits (`to_bits128`), `lo` occupies the top 64 bits and
/// `hi` the bottom 64 bits, which is the layout the solver's bit vectors use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratorState {
    pub lo: u64,
    pub hi: u64,
}

impl GeneratorState {
    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    /// Expand a `u64` seed into a full state with SplitMix64.
    ///
    /// The all-zero state is a fixed point of the transition, so it is
    /// never returned; the seed stream is advanced until a nonzero pair
    /// comes out (in practice the first draw).
    pub fn from_seed(seed: u64) -> Self {
        let mut sm = seed;
        loop {
            let lo = splitmix64(&mut sm);
            let hi = splitmix64(&mut sm);
            if lo != 0 || hi != 0 {
                return Self { lo, hi };
            }
        }
    }

    /// One application of the transition `T`.
    pub fn forward(self) -> Self {
        let mut x = self.lo;
        x ^= x << 23;
        x ^= x >> 17;
        x ^= self.hi;
        x ^= self.hi >> 26;
        Self {
            lo: self.hi,
            hi: x,
        }
    }

    /// One application of `T⁻¹`; `s.forward().backward() == s` for every `s`.
    pub fn backward(self) -> Self {
        let hi = self.lo;
        let mut x = self.hi;
        x ^= hi >> 26;
        x ^= hi;
        x = unshift_right_17(x);
        x = unshift_left_23(x);
        Self { lo: x, hi }
    }

    /// Apply `T` `n` times.
    pub fn advance(self, n: u64) -> Self {
        let mut s = self;
        for _ in 0..n {
            s = s.forward();
        }
        s
    }

    /// Apply `T⁻¹` `n` times.
    pub fn rewind(self, n: u64) -> Self {
        let mut s = self;
        for _ in 0..n {
            s = s.backward();
        }
        s
    }

    /// The double this state currently outputs (reads `lo` only).
    pub fn to_double(self) -> f64 {
        to_double(self.lo)
    }

    /// Pack as `lo << 64 | hi`.
    pub fn to_bits128(self) -> u128 {
        (u128::from(self.lo) << 64) | u128::from(self.hi)
    }

    /// Inverse of `to_bits128`: top 64 bits become `lo`, bottom 64 bits `hi`.
    pub fn from_bits128(bits: u128) -> Self {
        Self {
            lo: (bits >> 64) as u64,
            hi: bits as u64,
        }
    }
}

/// Map the top 52 bits of `lo` onto a double in [0, 1).
pub fn to_double(lo: u64) -> f64 {
    f64::from_bits((lo >> DISCARDED_LOW_BITS) | EXPONENT_ONE) - 1.0
}

/// Undo `x ^= x >> 17`. Four terms suffice since 4 * 17 >= 64.
fn unshift_right_17(v: u64) -> u64 {
    v ^ (v >> 17) ^ (v >> 34) ^ (v >> 51)
}

/// Undo `x ^= x << 23`. Three terms suffice since 3 * 23 >= 64.
fn unshift_left_23(v: u64) -> u64 {
    v ^ (v << 23) ^ (v << 46)
}

/// SplitMix64, used only for seeding.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_inverts_forward() {
        for seed in 0..500 {
            let s = GeneratorState::from_seed(seed);
            assert_eq!(s.forward().backward(), s, "seed {seed}");
            assert_eq!(s.backward().forward(), s, "seed {seed}");
        }
    }

    #[test]
    fn inverse_holds_on_edge_words() {
        let words = [0, 1, u64::MAX, 1 << 63, 0x5555_5555_5555_5555];
        for &lo in &words {
            for &hi in &words {
                let s = GeneratorState::new(lo, hi);
                assert_eq!(s.forward().backward(), s);
                assert_eq!(s.backward().forward(), s);
            }
        }
    }

    #[test]
    fn forward_matches_reference_step() {
        // Hand-expanded first step from (1, 2).
        let s = GeneratorState::new(1, 2).forward();
        let mut x: u64 = 1;
        x ^= x << 23;
        x ^= x >> 17;
        x ^= 2;
        x ^= 2 >> 26;
        assert_eq!(s, GeneratorState::new(2, x));
    }

    #[test]
    fn advance_and_rewind_cancel() {
        let s = GeneratorState::from_seed(7);
        assert_eq!(s.advance(1000).rewind(1000), s);
        assert_eq!(s.rewind(333).advance(333), s);
    }

    #[test]
    fn to_double_in_unit_range() {
        let mut s = GeneratorState::from_seed(12345);
        for _ in 0..10_000 {
            let v = s.to_double();
            assert!((0.0..1.0).contains(&v), "double out of range: {v}");
            s = s.forward();
        }
    }

    #[test]
    fn to_double_extremes() {
        assert_eq!(to_double(0), 0.0);
        assert_eq!(to_double(0xFFF), 0.0);
        assert_eq!(to_double(u64::MAX), 1.0 - f64::EPSILON);
        assert_eq!(to_double(1 << 63), 0.5);
    }

    #[test]
    fn to_double_reads_lo_only() {
        let a = GeneratorState::new(0xABCD_0000_0000_0000, 1);
        let b = GeneratorState::new(0xABCD_0000_0000_0000, u64::MAX);
        assert_eq!(a.to_double().to_bits(), b.to_double().to_bits());
    }

    #[test]
    fn bits128_packs_lo_high() {
        let s = GeneratorState::new(0x1111, 0x2222);
        assert_eq!(s.to_bits128(), (0x1111u128 << 64) | 0x2222);
        assert_eq!(GeneratorState::from_bits128(s.to_bits128()), s);
    }

    #[test]
    fn seeding_is_deterministic_and_nonzero() {
        for seed in 0..100 {
            let a = GeneratorState::from_seed(seed);
            assert_eq!(a, GeneratorState::from_seed(seed));
            assert!(a.lo != 0 || a.hi != 0);
        }
        assert_ne!(GeneratorState::from_seed(42), GeneratorState::from_seed(43));
    }

    #[test]
    fn serialization_roundtrip() {
        let s = GeneratorState::from_seed(42).advance(100);
        let json = serde_json::to_string(&s).unwrap();
        let restored: GeneratorState = serde_json::from_str(&json).unwrap();
        assert_eq!(s, restored);
    }
}
