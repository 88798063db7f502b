// Solve pipeline: observations -> equations -> solution space -> verified states.
//
// `Solver` owns its `SolverConfig` and holds the `LinearTracker` behind an
// `Arc`, so several solvers (or several threads calling one solver) can share
// the symbolic cache. Observation `i` is anchored at tracker index `i`; the
// states returned are therefore the generator state at index 0 of the
// sequence passed in.
//
// Outcomes:
// - `Ok(report)`: zero or more verified states. Zero happens when the linear
//   system is consistent but no candidate survives verification (for example
//   an `Exact` value that is not a multiple of 2^-52).
// - `Err(Contradiction)`: the linear system itself is inconsistent.
// - `Err(InfeasibleSearchSpace)`: the kernel is larger than the configured
//   ceiling; nothing is enumerated.
// - `Err(MalformedObservation)`: validation failed for some index.

use std::sync::Arc;

use serde::Serialize;
use shiftback_prng::GeneratorState;

use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::gf2::{self, LinearSystem};
use crate::observation::Observation;
use crate::search;
use crate::tracker::LinearTracker;

/// Diagnostics for one solve, alongside its solutions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolveReport {
    pub equations: usize,
    pub rank: usize,
    pub kernel_dim: usize,
    pub candidates_checked: u64,
    pub solutions: Vec<GeneratorState>,
}

#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    tracker: Arc<LinearTracker>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self::with_tracker(config, Arc::new(LinearTracker::new()))
    }

    /// Build a solver that shares an existing symbolic cache.
    pub fn with_tracker(config: SolverConfig, tracker: Arc<LinearTracker>) -> Self {
        Self { config, tracker }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<LinearTracker> {
        &self.tracker
    }

    /// Validate every observation and collect its equations.
    pub fn build_system(&self, observations: &[Observation]) -> Result<LinearSystem, SolveError> {
        let mut system = LinearSystem::new();
        for (index, obs) in observations.iter().enumerate() {
            obs.validate()
                .map_err(|source| SolveError::MalformedObservation { index, source })?;
            if obs.determined_bits() > 0 {
                obs.push_equations(&self.tracker.at(index), &mut system);
            }
        }
        Ok(system)
    }

    /// All generator states consistent with `observations`.
    pub fn solve(&self, observations: &[Observation]) -> Result<Vec<GeneratorState>, SolveError> {
        self.solve_with_report(observations)
            .map(|report| report.solutions)
    }

    pub fn solve_with_report(
        &self,
        observations: &[Observation],
    ) -> Result<SolveReport, SolveError> {
        let system = self.build_system(observations)?;
        let space = gf2::reduce(&system).inspect_err(|_| {
            log::debug!(
                "{} observations, {} equations: contradiction",
                observations.len(),
                system.len()
            );
        })?;

        let kernel_dim = space.kernel_dim();
        log::debug!(
            "{} observations, {} equations, rank {}, kernel {}",
            observations.len(),
            system.len(),
            space.rank,
            kernel_dim
        );

        let ceiling = self.config.max_kernel_dim;
        if kernel_dim > ceiling as usize || kernel_dim >= usize::BITS as usize {
            return Err(SolveError::InfeasibleSearchSpace {
                kernel_dim,
                max_kernel_dim: ceiling,
            });
        }

        let threshold = self
            .config
            .parallel_verify
            .then_some(self.config.parallel_threshold);
        let outcome = search::search(&space, observations, threshold);

        Ok(SolveReport {
            equations: system.len(),
            rank: space.rank,
            kernel_dim,
            candidates_checked: outcome.candidates_checked,
            solutions: outcome.solutions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_outputs(state: GeneratorState, n: usize) -> Vec<Observation> {
        let mut s = state;
        (0..n)
            .map(|_| {
                let obs = Observation::exact(s.to_double()).unwrap();
                s = s.forward();
                obs
            })
            .collect()
    }

    #[test]
    fn malformed_observation_reports_its_index() {
        let solver = Solver::default();
        let obs = [
            Observation::Unconstrained,
            Observation::Range(0.7, 0.2),
        ];
        let err = solver.solve(&obs).unwrap_err();
        assert!(matches!(
            err,
            SolveError::MalformedObservation { index: 1, .. }
        ));
    }

    #[test]
    fn unconstrained_observations_add_no_equations() {
        let solver = Solver::default();
        let system = solver
            .build_system(&[Observation::Unconstrained; 5])
            .unwrap();
        assert!(system.is_empty());
    }

    #[test]
    fn shared_tracker_is_reused_between_solvers() {
        let tracker = Arc::new(LinearTracker::new());
        let a = Solver::with_tracker(SolverConfig::default(), Arc::clone(&tracker));
        let b = Solver::with_tracker(SolverConfig::default(), Arc::clone(&tracker));
        let state = GeneratorState::from_seed(9);
        let obs = exact_outputs(state, 6);
        assert_eq!(a.solve(&obs).unwrap(), vec![state]);
        assert_eq!(tracker.cached_len(), 6);
        assert_eq!(b.solve(&obs[..5]).unwrap(), vec![state]);
        assert_eq!(tracker.cached_len(), 6);
    }

    #[test]
    fn ceiling_is_configurable() {
        let state = GeneratorState::from_seed(10);
        let obs = exact_outputs(state, 3);
        // Three exact outputs leave the 12 low bits of the initial `hi` free.
        let tight = Solver::new(SolverConfig {
            max_kernel_dim: 11,
            ..SolverConfig::default()
        });
        assert_eq!(
            tight.solve(&obs),
            Err(SolveError::InfeasibleSearchSpace {
                kernel_dim: 12,
                max_kernel_dim: 11
            })
        );
        let loose = Solver::new(SolverConfig {
            max_kernel_dim: 12,
            ..SolverConfig::default()
        });
        assert_eq!(loose.solve_with_report(&obs).unwrap().kernel_dim, 12);
    }

    #[test]
    fn exact_value_off_the_output_grid_yields_no_states() {
        // 0.1 is not a multiple of 2^-52, so its mantissa is rounded and no
        // generator output equals it bit for bit.
        let state = GeneratorState::from_seed(12);
        let mut obs = exact_outputs(state, 6);
        obs[0] = Observation::exact(0.1).unwrap();
        match Solver::default().solve(&obs) {
            Ok(states) => assert!(states.is_empty()),
            Err(e) => assert_eq!(e, SolveError::Contradiction),
        }
    }
}
