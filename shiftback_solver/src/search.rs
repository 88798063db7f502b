// Candidate enumeration and concrete verification.
//
// Subset `m` of the kernel basis (bit `j` of `m` selects basis vector `j`)
// gives the candidate `particular ^ XOR(selected)`. Each candidate is split
// into a `GeneratorState` and re-simulated with the real transition against
// every observation; only candidates that pass all checks survive. The
// linear system only sees the determined mantissa prefix of a `Range`, so
// this step is what enforces the strict bounds.
//
// Candidates are independent, so verification runs on the rayon pool once
// the count is large enough. An indexed range keeps survivors in subset
// order either way.

use rayon::prelude::*;
use shiftback_prng::GeneratorState;

use crate::gf2::SolutionSpace;
use crate::observation::Observation;

/// Result of walking the whole candidate set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub solutions: Vec<GeneratorState>,
    pub candidates_checked: u64,
}

/// The candidate selected by `subset`.
pub fn candidate(space: &SolutionSpace, subset: usize) -> GeneratorState {
    let mut bits = space.particular;
    for (j, &basis) in space.kernel.iter().enumerate() {
        if (subset >> j) & 1 == 1 {
            bits ^= basis;
        }
    }
    bits.to_state()
}

/// Whether `state` produces every observation, in order.
pub fn verify(state: GeneratorState, observations: &[Observation]) -> bool {
    let mut current = state;
    for obs in observations {
        if !obs.accepts(current.to_double()) {
            return false;
        }
        current = current.forward();
    }
    true
}

/// Enumerate all `2^k` candidates and keep the verified ones.
///
/// The caller is responsible for bounding `k`; `Solver` refuses to get
/// here past its configured ceiling.
pub fn search(
    space: &SolutionSpace,
    observations: &[Observation],
    parallel_threshold: Option<usize>,
) -> SearchOutcome {
    let count = 1usize << space.kernel_dim();
    let check = |subset: usize| {
        let state = candidate(space, subset);
        verify(state, observations).then_some(state)
    };

    let solutions: Vec<GeneratorState> = match parallel_threshold {
        Some(threshold) if count >= threshold => {
            (0..count).into_par_iter().filter_map(check).collect()
        }
        _ => (0..count).filter_map(check).collect(),
    };

    log::trace!(
        "verified {count} candidates, {} consistent",
        solutions.len()
    );
    SearchOutcome {
        solutions,
        candidates_checked: count as u64,
    }
}
