// Logical cursor over the generator's output sequence.
//
// The modeled process does not consume raw transitions one by one: it
// refills a 64-slot buffer and walks an offset through it. `Cursor` keeps
// that offset next to the state so callers can move by logical positions.
//
// Stepping by `n` subtracts `n` from the offset. Each time the offset
// leaves [0, 64) the state performs a block transition: 128 applications of
// `T` when the offset wraps below zero, 128 applications of `T⁻¹` when it
// wraps past 63. The leftover in-window movement, `new_offset - old_offset`,
// is then consumed one transition at a time (`T` for a negative residual,
// `T⁻¹` for a positive one). The 128-per-64 ratio is part of the modeled
// system's observed behavior and must not be "corrected".
//
// Net effect of a step by `n` that crosses `b` windows (signed): the state
// moves `n + 64 * b` transitions forward. Both terms are additive, so a
// batched step equals the same number of single steps, and `step(n)`
// followed by `step(-n)` restores the cursor exactly.

use serde::{Deserialize, Serialize};

use crate::GeneratorState;

/// Slots per refill window.
pub const BUFFER_SLOTS: u8 = 64;

/// Raw transitions applied per window crossing.
pub const BLOCK_TRANSITIONS: u64 = 128;

/// Returned when a cursor is built with an offset outside the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("buffer offset {0} is outside the refill window [0, {BUFFER_SLOTS})")]
pub struct OffsetOutOfRange(pub u32);

/// A logical position in the infinite output sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CursorFields")]
pub struct Cursor {
    state: GeneratorState,
    buffer_offset: u8,
}

/// Wire shape of a `Cursor`; deserialization goes through `Cursor::new`.
#[derive(Deserialize)]
struct CursorFields {
    state: GeneratorState,
    buffer_offset: u32,
}

impl TryFrom<CursorFields> for Cursor {
    type Error = OffsetOutOfRange;

    fn try_from(fields: CursorFields) -> Result<Self, Self::Error> {
        Cursor::new(fields.state, fields.buffer_offset)
    }
}

impl Cursor {
    pub fn new(state: GeneratorState, buffer_offset: u32) -> Result<Self, OffsetOutOfRange> {
        match u8::try_from(buffer_offset) {
            Ok(offset) if offset < BUFFER_SLOTS => Ok(Self {
                state,
                buffer_offset: offset,
            }),
            _ => Err(OffsetOutOfRange(buffer_offset)),
        }
    }

    /// Convenience for `Cursor::new(GeneratorState::new(lo, hi), buffer_offset)`.
    pub fn from_words(lo: u64, hi: u64, buffer_offset: u32) -> Result<Self, OffsetOutOfRange> {
        Self::new(GeneratorState::new(lo, hi), buffer_offset)
    }

    pub fn current_state(&self) -> GeneratorState {
        self.state
    }

    pub fn buffer_offset(&self) -> u32 {
        u32::from(self.buffer_offset)
    }

    /// The double at the current position, without stepping.
    pub fn current_value(&self) -> f64 {
        self.state.to_double()
    }

    /// Move by `steps` logical positions (negative rewinds).
    pub fn step(&mut self, steps: i64) {
        let slots = i128::from(BUFFER_SLOTS);
        let start = i128::from(self.buffer_offset);
        let mut offset = start - i128::from(steps);

        while offset < 0 {
            self.state = self.state.advance(BLOCK_TRANSITIONS);
            offset += slots;
        }
        while offset >= slots {
            self.state = self.state.rewind(BLOCK_TRANSITIONS);
            offset -= slots;
        }

        let residual = offset - start;
        if residual < 0 {
            self.state = self.state.advance(residual.unsigned_abs() as u64);
        } else if residual > 0 {
            self.state = self.state.rewind(residual.unsigned_abs() as u64);
        }

        // `offset` is in [0, 64) after the loops above.
        self.buffer_offset = offset as u8;
    }

    /// Advance one position and return the new current value.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f64 {
        self.step(1);
        self.current_value()
    }

    /// Rewind one position and return the new current value.
    pub fn prev(&mut self) -> f64 {
        self.step(-1);
        self.current_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(seed: u64, offset: u32) -> Cursor {
        Cursor::new(GeneratorState::from_seed(seed), offset).unwrap()
    }

    #[test]
    fn rejects_offset_outside_window() {
        let s = GeneratorState::from_seed(1);
        assert_eq!(Cursor::new(s, 64), Err(OffsetOutOfRange(64)));
        assert_eq!(Cursor::new(s, 1000), Err(OffsetOutOfRange(1000)));
        assert!(Cursor::new(s, 63).is_ok());
        assert!(Cursor::new(s, 0).is_ok());
    }

    #[test]
    fn round_trip_restores_cursor() {
        for offset in [0, 1, 31, 62, 63] {
            for n in [0i64, 1, -1, 5, -5, 63, 64, 65, -64, -65, 200, -200, 1000, -1000] {
                let original = cursor(99, offset);
                let mut c = original;
                c.step(n);
                c.step(-n);
                assert_eq!(c, original, "offset {offset}, n {n}");
            }
        }
    }

    #[test]
    fn batched_step_matches_single_steps() {
        for offset in [0, 17, 63] {
            for n in [1i64, 2, 40, 63, 64, 65, 127, 128, 129, 300, 777] {
                for sign in [1i64, -1] {
                    let n = n * sign;
                    let mut batched = cursor(5, offset);
                    batched.step(n);

                    let mut single = cursor(5, offset);
                    let unit = n.signum();
                    for _ in 0..n.abs() {
                        single.step(unit);
                    }
                    assert_eq!(batched, single, "offset {offset}, n {n}");
                }
            }
        }
    }

    #[test]
    fn offset_stays_in_window() {
        let mut c = cursor(3, 10);
        for n in [-500i64, 3, 64, -1, 129, -64, 0, 1] {
            c.step(n);
            assert!(c.buffer_offset() < u32::from(BUFFER_SLOTS));
        }
    }

    #[test]
    fn in_window_step_is_one_transition() {
        let mut c = cursor(8, 40);
        let before = c.current_state();
        c.step(1);
        assert_eq!(c.current_state(), before.forward());
        assert_eq!(c.buffer_offset(), 39);
        c.step(-1);
        assert_eq!(c.current_state(), before);
        assert_eq!(c.buffer_offset(), 40);
    }

    #[test]
    fn window_crossing_skips_a_block() {
        // From offset 0, one step forward wraps to 63: 128 forward, then 63 back.
        let mut c = cursor(8, 0);
        let before = c.current_state();
        c.step(1);
        assert_eq!(c.buffer_offset(), 63);
        assert_eq!(c.current_state(), before.advance(65));
    }

    #[test]
    fn next_and_prev_read_after_stepping() {
        let mut c = cursor(11, 20);
        let start = c.current_value();
        let expected_next = c.current_state().forward().to_double();
        assert_eq!(c.next().to_bits(), expected_next.to_bits());
        assert_eq!(c.prev().to_bits(), start.to_bits());
        assert_eq!(c.current_value().to_bits(), start.to_bits());
    }

    #[test]
    fn serialization_roundtrip() {
        let mut c = cursor(42, 12);
        c.step(100);
        let json = serde_json::to_string(&c).unwrap();
        let restored: Cursor = serde_json::from_str(&json).unwrap();
        assert_eq!(c, restored);
    }

    #[test]
    fn deserialization_rejects_bad_offset() {
        let json = r#"{"state":{"lo":1,"hi":2},"buffer_offset":64}"#;
        assert!(serde_json::from_str::<Cursor>(json).is_err());
    }
}
