// Solver tuning knobs, loaded from JSON.
//
// The kernel ceiling is a cost/completeness tradeoff rather than a
// correctness requirement, so it lives here instead of as a constant.
// Missing fields fall back to `SolverConfig::default()`, so `{}` is a valid
// config file.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Largest kernel dimension the candidate search will enumerate. The
    /// search visits `2^max_kernel_dim` candidates at worst.
    pub max_kernel_dim: u32,
    /// Verify candidates on the rayon pool.
    pub parallel_verify: bool,
    /// Candidate count below which verification stays on the calling thread.
    pub parallel_threshold: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_kernel_dim: 20,
            parallel_verify: true,
            parallel_threshold: 1024,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
