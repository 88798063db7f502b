// Error taxonomy for observation construction and solving.
//
// `Contradiction` and `InfeasibleSearchSpace` are outcomes, not faults: the
// solver returns them as-is and never retries. Choosing another observation
// window is the caller's business (see `shiftback_cli::window`).

/// Why an observation value was rejected.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ObservationError {
    #[error("observation value {0} is not finite")]
    NotFinite(f64),

    #[error("observation value {0} is outside the unit interval")]
    OutOfUnitInterval(f64),

    #[error("range ({low}, {high}) is empty: low must be below high")]
    EmptyRange { low: f64, high: f64 },
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// The equations have no solution: the observations cannot come from
    /// a xorshift128+ generator.
    #[error("observations contradict the xorshift128+ model")]
    Contradiction,

    /// Too many free bits remain to enumerate.
    #[error("kernel dimension {kernel_dim} exceeds the ceiling of {max_kernel_dim}")]
    InfeasibleSearchSpace { kernel_dim: usize, max_kernel_dim: u32 },

    #[error("observation {index} is malformed: {source}")]
    MalformedObservation {
        index: usize,
        #[source]
        source: ObservationError,
    },
}
