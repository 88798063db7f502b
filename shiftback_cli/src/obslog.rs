// Observation logs on disk.
//
// A log is a JSON object with one field, `observations`, holding the
// sequence in generator-step order:
//
//   { "observations": [ {"exact": 0.25}, {"range": [0.1, 0.2]}, "unconstrained" ] }
//
// Values are validated while deserializing, so a loaded log never carries a
// malformed observation. `simulate` produces logs from a known state, which
// is how the CLI's `simulate` subcommand and the tests get realistic input.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shiftback_prng::GeneratorState;
use shiftback_solver::Observation;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("observation log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("observation log is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationLog {
    pub observations: Vec<Observation>,
}

impl ObservationLog {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn from_json(json: &str) -> Result<Self, LogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, LogError> {
        let json = fs::read_to_string(path)?;
        let log = Self::from_json(&json)?;
        log::info!(
            "loaded {} observations from {}",
            log.observations.len(),
            path.display()
        );
        Ok(log)
    }

    pub fn save(&self, path: &Path) -> Result<(), LogError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Exact outputs of `state` for `count` steps. With `unconstrained_every
    /// = n > 0`, every `n`-th entry (1-based) is replaced by `Unconstrained`.
    pub fn simulate(state: GeneratorState, count: usize, unconstrained_every: usize) -> Self {
        let mut current = state;
        let mut observations = Vec::with_capacity(count);
        for i in 0..count {
            let hidden = unconstrained_every > 0 && (i + 1) % unconstrained_every == 0;
            observations.push(if hidden {
                Observation::Unconstrained
            } else {
                // Generator outputs are always in [0, 1).
                Observation::Exact(current.to_double())
            });
            current = current.forward();
        }
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
