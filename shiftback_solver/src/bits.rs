// 128-bit GF(2) vectors.
//
// One `BitVec128` is either an equation row (which of the 128 unknown
// initial-state bits an output bit depends on) or a point in the solution
// space. Variable numbering follows `GeneratorState::to_bits128`: variable
// `64 + k` is bit `k` of the initial `lo`, variable `k` is bit `k` of the
// initial `hi`.

use std::fmt;
use std::ops::{BitXor, BitXorAssign};

use shiftback_prng::GeneratorState;

/// Number of unknowns in the state.
pub const STATE_BITS: u32 = 128;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BitVec128(u128);

impl BitVec128 {
    pub const ZERO: Self = Self(0);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u128 {
        self.0
    }

    /// The vector with only variable `index` set. `index` must be < 128.
    pub const fn one_hot(index: u32) -> Self {
        Self(1u128 << index)
    }

    /// Coefficient of variable `index`.
    pub const fn bit(self, index: u32) -> bool {
        (self.0 >> index) & 1 == 1
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Dot product over GF(2): the parity of the shared set bits.
    pub const fn dot(self, other: Self) -> bool {
        (self.0 & other.0).count_ones() & 1 == 1
    }

    pub fn to_state(self) -> GeneratorState {
        GeneratorState::from_bits128(self.0)
    }

    pub fn from_state(state: GeneratorState) -> Self {
        Self(state.to_bits128())
    }
}

impl BitXor for BitVec128 {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for BitVec128 {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl fmt::Debug for BitVec128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVec128({:#034x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_is_addition() {
        let a = BitVec128::one_hot(3) ^ BitVec128::one_hot(100);
        let b = BitVec128::one_hot(100);
        assert_eq!(a ^ b, BitVec128::one_hot(3));
        assert!((a ^ a).is_zero());
    }

    #[test]
    fn bit_and_dot() {
        let v = BitVec128::one_hot(0) ^ BitVec128::one_hot(127);
        assert!(v.bit(0));
        assert!(v.bit(127));
        assert!(!v.bit(64));
        assert!(!v.dot(BitVec128::from_raw(u128::MAX)));
        assert!(v.dot(BitVec128::one_hot(127)));
    }

    #[test]
    fn state_packing_puts_lo_on_top() {
        let s = GeneratorState::new(1, 0);
        assert_eq!(BitVec128::from_state(s), BitVec128::one_hot(64));
        assert_eq!(BitVec128::one_hot(0).to_state(), GeneratorState::new(0, 1));
    }
}
