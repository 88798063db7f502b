// Observation model: what is known about one generator output.
//
// An observation sequence is indexed in generator-step order. Observation
// `i` describes `to_double(lo)` of the state after `i` transitions, so
// `Unconstrained` entries still occupy their index.
//
// Each observation determines some number of leading mantissa bits:
// - `Exact(v)`: all 52.
// - `Range(low, high)`: the prefix shared by the mantissas of both bounds,
//   since every double strictly between them has a mantissa in between.
// - `Unconstrained`: none.
// Mantissa bit `b` of an output is bit `b + 12` of that step's `lo`, which
// is where the equation rows come from.
//
// Values are validated on construction (`exact`, `range`, and serde
// deserialization). The enum variants are public, so `Solver` validates
// again before building equations.

use serde::{Deserialize, Serialize};
use shiftback_prng::{DISCARDED_LOW_BITS, MANTISSA_BITS, MANTISSA_MASK};

use crate::error::ObservationError;
use crate::gf2::{Equation, LinearSystem};
use crate::tracker::SymbolicState;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "RawObservation")]
pub enum Observation {
    /// The output is exactly this value.
    Exact(f64),
    /// The output lies strictly between `low` and `high`.
    Range(f64, f64),
    /// Nothing is known, but the step happened.
    Unconstrained,
}

/// Unvalidated wire form; deserialization goes through `Observation::validate`.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawObservation {
    Exact(f64),
    Range(f64, f64),
    Unconstrained,
}

impl TryFrom<RawObservation> for Observation {
    type Error = ObservationError;

    fn try_from(raw: RawObservation) -> Result<Self, Self::Error> {
        let obs = match raw {
            RawObservation::Exact(v) => Observation::Exact(v),
            RawObservation::Range(low, high) => Observation::Range(low, high),
            RawObservation::Unconstrained => Observation::Unconstrained,
        };
        obs.validate()?;
        Ok(obs)
    }
}

impl Observation {
    pub fn exact(value: f64) -> Result<Self, ObservationError> {
        let obs = Observation::Exact(value);
        obs.validate()?;
        Ok(obs)
    }

    pub fn range(low: f64, high: f64) -> Result<Self, ObservationError> {
        let obs = Observation::Range(low, high);
        obs.validate()?;
        Ok(obs)
    }

    /// Check the invariants: exact values in [0, 1) (positive zero only),
    /// ranges with `0 <= low < high <= 1`.
    ///
    /// `high == 1.0` is accepted because a range reaching the top of the
    /// interval is a legitimate observation, and `mantissa_of` maps 1.0 to
    /// the all-ones mantissa for exactly that case.
    pub fn validate(&self) -> Result<(), ObservationError> {
        match *self {
            Observation::Exact(v) => {
                check_finite(v)?;
                // The generator never emits -0.0, and `accepts` is bit-exact.
                if !(0.0..1.0).contains(&v) || v.is_sign_negative() {
                    return Err(ObservationError::OutOfUnitInterval(v));
                }
            }
            Observation::Range(low, high) => {
                check_finite(low)?;
                check_finite(high)?;
                if !(0.0..=1.0).contains(&low) {
                    return Err(ObservationError::OutOfUnitInterval(low));
                }
                if !(0.0..=1.0).contains(&high) {
                    return Err(ObservationError::OutOfUnitInterval(high));
                }
                if low >= high {
                    return Err(ObservationError::EmptyRange { low, high });
                }
            }
            Observation::Unconstrained => {}
        }
        Ok(())
    }

    /// How many leading mantissa bits this observation pins down.
    pub fn determined_bits(&self) -> u32 {
        match *self {
            Observation::Exact(_) => MANTISSA_BITS,
            Observation::Range(low, high) => {
                let diverging = mantissa_of(low) ^ mantissa_of(high);
                MANTISSA_BITS - bit_length(diverging)
            }
            Observation::Unconstrained => 0,
        }
    }

    /// Mantissa whose leading `determined_bits()` bits are known.
    fn known_mantissa(&self) -> u64 {
        match *self {
            Observation::Exact(v) => mantissa_of(v),
            Observation::Range(low, _) => mantissa_of(low),
            Observation::Unconstrained => 0,
        }
    }

    /// Append this observation's equations, anchored at the symbolic state
    /// of its step, most significant mantissa bit first.
    pub fn push_equations(&self, state: &SymbolicState, system: &mut LinearSystem) {
        let mantissa = self.known_mantissa();
        for t in 0..self.determined_bits() {
            let bit = MANTISSA_BITS - 1 - t;
            system.push(Equation {
                coefficients: state.lo_row(bit + DISCARDED_LOW_BITS),
                value: (mantissa >> bit) & 1 == 1,
            });
        }
    }

    /// Whether a concrete output is consistent with this observation.
    pub fn accepts(&self, output: f64) -> bool {
        match *self {
            Observation::Exact(v) => output.to_bits() == v.to_bits(),
            Observation::Range(low, high) => low < output && output < high,
            Observation::Unconstrained => true,
        }
    }
}

/// The 52-bit mantissa the generator would have produced for `v`.
///
/// `v + 1.0` lands in [1, 2) where the exponent is fixed, so the mantissa
/// field is exactly the generator's `lo >> 12`. 1.0 itself would carry into
/// the exponent and is mapped to all ones instead.
pub fn mantissa_of(v: f64) -> u64 {
    if v == 1.0 {
        MANTISSA_MASK
    } else {
        (v + 1.0).to_bits() & MANTISSA_MASK
    }
}

fn bit_length(x: u64) -> u32 {
    u64::BITS - x.leading_zeros()
}

fn check_finite(v: f64) -> Result<(), ObservationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ObservationError::NotFinite(v))
    }
}
