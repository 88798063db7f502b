// Sliding-window recovery over long observation logs.
//
// Solving a whole log at once is wasteful (hundreds of redundant equations)
// and fragile (one wrong entry makes the system contradictory). Instead the
// log is cut into windows of `length` entries starting every `stride`
// entries. Each window is solved as if it began at step 0, so all windows
// share the first `length` tracker entries. The first window (in start
// order) with exactly one solution wins: its state is rewound `start` steps
// with the inverse transition and must then reproduce the entire log.
//
// Windows are independent and solved on the rayon pool; `find_map_first`
// keeps the answer identical to a sequential scan.

use rayon::prelude::*;
use serde::Serialize;
use shiftback_prng::GeneratorState;
use shiftback_solver::search::verify;
use shiftback_solver::{Observation, ObservationError, Solver};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPolicy {
    pub length: usize,
    pub stride: usize,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            length: 16,
            stride: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WindowHit {
    /// Index of the first observation in the winning window.
    pub start: usize,
    /// State that produces observation `start`.
    pub state_at_start: GeneratorState,
    /// State that produces observation 0.
    pub initial: GeneratorState,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("observation {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: ObservationError,
    },

    #[error("no window produced a unique state consistent with the log ({windows_tried} tried)")]
    NoUniqueSolution { windows_tried: usize },

    #[error("window length and stride must both be positive")]
    InvalidPolicy,
}

/// Start indices of every window. A log shorter than one window is a
/// single window covering all of it.
pub fn window_starts(len: usize, policy: WindowPolicy) -> Vec<usize> {
    if len <= policy.length {
        return vec![0];
    }
    (0..=len - policy.length).step_by(policy.stride).collect()
}

pub fn recover_windowed(
    solver: &Solver,
    observations: &[Observation],
    policy: WindowPolicy,
) -> Result<WindowHit, WindowError> {
    if policy.length == 0 || policy.stride == 0 {
        return Err(WindowError::InvalidPolicy);
    }
    for (index, obs) in observations.iter().enumerate() {
        obs.validate()
            .map_err(|source| WindowError::Malformed { index, source })?;
    }

    let starts = window_starts(observations.len(), policy);
    let hit = starts.par_iter().find_map_first(|&start| {
        let end = (start + policy.length).min(observations.len());
        try_window(solver, observations, start, end)
    });

    match hit {
        Some(hit) => {
            log::info!(
                "window {}..{} gives initial state {:#018x} {:#018x}",
                hit.start,
                (hit.start + policy.length).min(observations.len()),
                hit.initial.lo,
                hit.initial.hi
            );
            Ok(hit)
        }
        None => Err(WindowError::NoUniqueSolution {
            windows_tried: starts.len(),
        }),
    }
}

fn try_window(
    solver: &Solver,
    observations: &[Observation],
    start: usize,
    end: usize,
) -> Option<WindowHit> {
    let states = match solver.solve(&observations[start..end]) {
        Ok(states) => states,
        Err(e) => {
            log::debug!("window {start}..{end} skipped: {e}");
            return None;
        }
    };
    let [state_at_start] = states[..] else {
        log::debug!("window {start}..{end} skipped: {} states", states.len());
        return None;
    };
    let initial = state_at_start.rewind(start as u64);
    if !verify(initial, observations) {
        log::warn!("window {start}..{end} has a unique state that does not explain the full log");
        return None;
    }
    Some(WindowHit {
        start,
        state_at_start,
        initial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_cover_the_log() {
        let policy = WindowPolicy {
            length: 4,
            stride: 3,
        };
        assert_eq!(window_starts(10, policy), vec![0, 3, 6]);
        assert_eq!(window_starts(3, policy), vec![0]);
        assert_eq!(window_starts(4, policy), vec![0]);
        assert_eq!(window_starts(0, policy), vec![0]);
    }

    #[test]
    fn zero_length_or_stride_is_rejected() {
        let solver = Solver::default();
        for policy in [
            WindowPolicy {
                length: 0,
                stride: 1,
            },
            WindowPolicy {
                length: 8,
                stride: 0,
            },
        ] {
            assert_eq!(
                recover_windowed(&solver, &[], policy),
                Err(WindowError::InvalidPolicy)
            );
        }
    }

    #[test]
    fn malformed_entries_use_log_indices() {
        let obs = [
            Observation::Unconstrained,
            Observation::Unconstrained,
            Observation::Range(0.5, 0.5),
        ];
        let err = recover_windowed(&Solver::default(), &obs, WindowPolicy::default()).unwrap_err();
        assert!(matches!(err, WindowError::Malformed { index: 2, .. }));
    }
}
