// shiftback_cli: the caller-side policy around the solver.
//
// The solver crate answers one question (which states explain this exact
// sequence?) and deliberately never retries. This crate holds what a user
// of it needs on top:
//
// - `obslog.rs`: JSON observation logs (load, save, simulate from a seed).
// - `window.rs`: sliding-window recovery that tolerates long or partly
//   inconsistent logs by solving short windows and checking the winner
//   against the whole log.
//
// `main.rs` wires these into the `shiftback` binary.

pub mod obslog;
pub mod window;

pub use obslog::{LogError, ObservationLog};
pub use window::{WindowError, WindowHit, WindowPolicy, recover_windowed};
