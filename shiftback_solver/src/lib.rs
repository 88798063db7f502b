// State recovery for xorshift128+ from observed outputs.
//
// Given a sequence of observations (exact doubles, open ranges, or gaps) of
// consecutive generator outputs, recover every 128-bit initial state that
// reproduces them. The transition is linear over GF(2), so each determined
// mantissa bit of each observation is one linear equation in the 128 unknown
// initial bits. Solving those equations leaves a particular solution plus a
// small kernel; enumerating the kernel and re-simulating each candidate
// concretely filters out states that only satisfy the linearized prefix.
//
// Module overview:
// - `bits.rs`: `BitVec128`, one row of the coefficient matrix.
// - `tracker.rs`: `SymbolicState` (per-bit rows after `i` steps) and the
//   shared `LinearTracker` memo.
// - `observation.rs`: `Observation`, validation, determined-bit counting and
//   equation generation.
// - `gf2.rs`: `LinearSystem` and `reduce` (particular solution + kernel).
// - `search.rs`: candidate enumeration and concrete verification.
// - `solver.rs`: the `Solver` pipeline tying the above together.
// - `config.rs`: `SolverConfig` (kernel ceiling, parallelism).
// - `error.rs`: `ObservationError` and `SolveError`.
//
// Observation `i` always corresponds to the state after `i` transitions, so
// gaps must be recorded as `Unconstrained` rather than dropped.

pub mod bits;
pub mod config;
pub mod error;
pub mod gf2;
pub mod observation;
pub mod search;
pub mod solver;
pub mod tracker;

pub use bits::BitVec128;
pub use config::SolverConfig;
pub use error::{ObservationError, SolveError};
pub use gf2::{Equation, LinearSystem, SolutionSpace};
pub use observation::Observation;
pub use solver::{SolveReport, Solver};
pub use tracker::{LinearTracker, SymbolicState};

use shiftback_prng::GeneratorState;

/// Solve with `SolverConfig::default()` and a fresh tracker.
pub fn solve(observations: &[Observation]) -> Result<Vec<GeneratorState>, SolveError> {
    Solver::default().solve(observations)
}
