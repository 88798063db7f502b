// Symbolic evolution of the xorshift128+ transition over GF(2).
//
// `SymbolicState` holds, for every bit of `lo` and `hi` at some step, the
// `BitVec128` row saying which initial-state bits that bit is the XOR of.
// `forward()` applies the same structure as `GeneratorState::forward`, with
// word shifts reinterpreted as shifts of the 64-row list (zero fill) and XOR
// as row-wise XOR. This is exact because `T` is linear over GF(2).
//
// `LinearTracker` is the memo cache: entry `i` is the symbolic state after
// `i` transitions. The cache is append-only and owned explicitly by whoever
// solves (usually a `Solver`, shared through an `Arc` when several solves
// run at once). Missing entries are computed with no lock held and then
// appended under a short write lock, insert-if-absent: when two threads
// extend at once, the first to append wins and the other's copies of the
// same entries are dropped. Once stored, an entry never changes.

use std::sync::Arc;

use parking_lot::RwLock;
use shiftback_prng::GeneratorState;

use crate::bits::BitVec128;

/// One 64-bit word, as a row per bit (index 0 = least significant).
type SymbolicWord = [BitVec128; 64];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolicState {
    lo: SymbolicWord,
    hi: SymbolicWord,
}

impl SymbolicState {
    /// Step 0: every bit depends only on itself.
    pub fn initial() -> Self {
        let mut lo = [BitVec128::ZERO; 64];
        let mut hi = [BitVec128::ZERO; 64];
        for k in 0..64u32 {
            lo[k as usize] = BitVec128::one_hot(64 + k);
            hi[k as usize] = BitVec128::one_hot(k);
        }
        Self { lo, hi }
    }

    pub fn forward(&self) -> Self {
        let mut x = self.lo;
        x = xor(&x, &shl(&x, 23));
        x = xor(&x, &shr(&x, 17));
        x = xor(&x, &self.hi);
        x = xor(&x, &shr(&self.hi, 26));
        Self { lo: self.hi, hi: x }
    }

    /// Row for bit `bit` (0..64) of `lo`.
    pub fn lo_row(&self, bit: u32) -> BitVec128 {
        self.lo[bit as usize]
    }

    /// Row for bit `bit` (0..64) of `hi`.
    pub fn hi_row(&self, bit: u32) -> BitVec128 {
        self.hi[bit as usize]
    }

    /// Concretely evaluate every row against `initial`.
    pub fn evaluate(&self, initial: GeneratorState) -> GeneratorState {
        let bits = BitVec128::from_state(initial);
        let word = |rows: &SymbolicWord| {
            rows.iter()
                .enumerate()
                .filter(|(_, row)| row.dot(bits))
                .fold(0u64, |acc, (k, _)| acc | (1 << k))
        };
        GeneratorState::new(word(&self.lo), word(&self.hi))
    }
}

fn xor(a: &SymbolicWord, b: &SymbolicWord) -> SymbolicWord {
    let mut out = *a;
    for (o, r) in out.iter_mut().zip(b) {
        *o ^= *r;
    }
    out
}

/// Row-list equivalent of `x << n`: bit `k` takes the row of bit `k - n`.
fn shl(w: &SymbolicWord, n: usize) -> SymbolicWord {
    let mut out = [BitVec128::ZERO; 64];
    out[n..].copy_from_slice(&w[..64 - n]);
    out
}

/// Row-list equivalent of `x >> n`: bit `k` takes the row of bit `k + n`.
fn shr(w: &SymbolicWord, n: usize) -> SymbolicWord {
    let mut out = [BitVec128::ZERO; 64];
    out[..64 - n].copy_from_slice(&w[n..]);
    out
}

/// Append-only memo of `SymbolicState` per step index.
#[derive(Debug, Default)]
pub struct LinearTracker {
    steps: RwLock<Vec<Arc<SymbolicState>>>,
}

impl LinearTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbolic state after `index` transitions, computing and caching any
    /// missing prefix.
    pub fn at(&self, index: usize) -> Arc<SymbolicState> {
        let (have, mut last) = {
            let steps = self.steps.read();
            if let Some(state) = steps.get(index) {
                return Arc::clone(state);
            }
            (steps.len(), steps.last().cloned())
        };

        let mut fresh = Vec::with_capacity(index + 1 - have);
        for _ in have..=index {
            let next = Arc::new(match &last {
                Some(prev) => prev.forward(),
                None => SymbolicState::initial(),
            });
            fresh.push(Arc::clone(&next));
            last = Some(next);
        }

        let mut steps = self.steps.write();
        for (i, state) in (have..).zip(fresh) {
            if i == steps.len() {
                steps.push(state);
            }
        }
        Arc::clone(&steps[index])
    }

    /// Number of step indices currently memoized.
    pub fn cached_len(&self) -> usize {
        self.steps.read().len()
    }
}
