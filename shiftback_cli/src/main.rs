// `shiftback` binary: recover, step, and simulate xorshift128+ states.
//
// Usage:
//   shiftback solve <LOG> [--config FILE] [--window-length N] [--stride N]
//   shiftback step --lo X --hi X [--offset N] --steps N [--values N]
//   shiftback simulate --seed N --count N [--unconstrained-every N] [--output FILE]
//
// Results go to stdout as JSON; progress and diagnostics go through `log`
// (set `RUST_LOG` to change the default `info` level).

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use shiftback_cli::{ObservationLog, WindowPolicy, recover_windowed};
use shiftback_prng::{Cursor, GeneratorState};
use shiftback_solver::{Solver, SolverConfig};

#[derive(Parser, Debug)]
#[command(name = "shiftback", about = "xorshift128+ state recovery")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recover the initial state behind an observation log.
    Solve {
        /// Path to a JSON observation log.
        log: PathBuf,

        /// Solver config (JSON); missing fields take their defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Solve sliding windows of this many observations instead of the
        /// whole log.
        #[arg(long)]
        window_length: Option<usize>,

        /// Distance between window starts.
        #[arg(long, default_value_t = 4)]
        stride: usize,
    },
    /// Move a cursor by a signed number of outputs and print what follows.
    Step {
        /// Low state word (decimal or 0x-prefixed hex).
        #[arg(long, value_parser = parse_word)]
        lo: u64,

        /// High state word (decimal or 0x-prefixed hex).
        #[arg(long, value_parser = parse_word)]
        hi: u64,

        /// Position in the 64-slot refill window.
        #[arg(long, default_value_t = 0)]
        offset: u32,

        #[arg(long, allow_hyphen_values = true)]
        steps: i64,

        /// How many values to print after stepping.
        #[arg(long, default_value_t = 0)]
        values: usize,
    },
    /// Write the outputs of a seeded generator as an observation log.
    Simulate {
        #[arg(long)]
        seed: u64,

        #[arg(long)]
        count: usize,

        /// Hide every N-th output (0 hides nothing).
        #[arg(long, default_value_t = 0)]
        unconstrained_every: usize,

        /// Write here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_word(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid 64-bit word {s:?}: {e}"))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SolverConfig> {
    let Some(path) = path else {
        return Ok(SolverConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    SolverConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))
}

fn state_json(state: GeneratorState) -> serde_json::Value {
    json!({
        "lo": format!("{:#018x}", state.lo),
        "hi": format!("{:#018x}", state.hi),
    })
}

fn run_solve(
    log_path: &Path,
    config: Option<&Path>,
    window_length: Option<usize>,
    stride: usize,
) -> anyhow::Result<serde_json::Value> {
    let obs_log = ObservationLog::load(log_path)
        .with_context(|| format!("loading {}", log_path.display()))?;
    let solver = Solver::new(load_config(config)?);

    if let Some(length) = window_length {
        let hit = recover_windowed(&solver, &obs_log.observations, WindowPolicy { length, stride })?;
        return Ok(json!({
            "window_start": hit.start,
            "state_at_start": state_json(hit.state_at_start),
            "initial": state_json(hit.initial),
        }));
    }

    let report = solver.solve_with_report(&obs_log.observations)?;
    log::info!(
        "{} equations, rank {}, kernel {}, {} candidates checked",
        report.equations,
        report.rank,
        report.kernel_dim,
        report.candidates_checked
    );
    if report.solutions.is_empty() {
        log::warn!("no state reproduces every observation");
    }
    let solutions: Vec<_> = report.solutions.iter().copied().map(state_json).collect();
    Ok(json!({
        "equations": report.equations,
        "rank": report.rank,
        "kernel_dim": report.kernel_dim,
        "candidates_checked": report.candidates_checked,
        "solutions": solutions,
    }))
}

fn run_step(
    lo: u64,
    hi: u64,
    offset: u32,
    steps: i64,
    values: usize,
) -> anyhow::Result<serde_json::Value> {
    let mut cursor = Cursor::from_words(lo, hi, offset)?;
    cursor.step(steps);
    let state = cursor.current_state();
    let at = cursor.buffer_offset();
    let current = cursor.current_value();
    let following: Vec<f64> = (0..values).map(|_| cursor.next()).collect();
    Ok(json!({
        "state": state_json(state),
        "offset": at,
        "value": current,
        "next": following,
    }))
}

fn run_simulate(
    seed: u64,
    count: usize,
    unconstrained_every: usize,
    output: Option<&Path>,
) -> anyhow::Result<Option<serde_json::Value>> {
    let state = GeneratorState::from_seed(seed);
    log::info!(
        "seed {seed} -> initial state {:#018x} {:#018x}",
        state.lo,
        state.hi
    );
    let obs_log = ObservationLog::simulate(state, count, unconstrained_every);
    match output {
        Some(path) => {
            obs_log.save(path)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {} observations to {}", obs_log.len(), path.display());
            Ok(None)
        }
        None => Ok(Some(serde_json::to_value(&obs_log)?)),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    let output = match &cli.command {
        Command::Solve {
            log,
            config,
            window_length,
            stride,
        } => Some(run_solve(log, config.as_deref(), *window_length, *stride)?),
        Command::Step {
            lo,
            hi,
            offset,
            steps,
            values,
        } => Some(run_step(*lo, *hi, *offset, *steps, *values)?),
        Command::Simulate {
            seed,
            count,
            unconstrained_every,
            output,
        } => run_simulate(*seed, *count, *unconstrained_every, output.as_deref())?,
    };

    if let Some(value) = output {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
