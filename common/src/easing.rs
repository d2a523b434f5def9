//! Integer animation paths.
//!
//! Progress is mapped onto a 0..=1024 scale and shaped with a cubic bezier,
//! all in integer math so a path costs a handful of multiplies per frame.
//!
//! - [`AnimationPath::EaseInOut`]: slow start, slow end. Used for every
//!   intermediate flip of a sequence.
//! - [`AnimationPath::Bounce`]: falls onto the end value and bounces back
//!   twice with decaying height. Used for the final flip so the card visibly
//!   settles.
//! - [`AnimationPath::Linear`]: constant speed.

/// Fixed-point scale of bezier progress (10 fractional bits).
pub const BEZIER_MAX: i64 = 1024;
const BEZIER_SHIFT: u32 = 10;

/// Shape of an animated value over time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationPath {
    Linear,
    #[default]
    EaseInOut,
    Bounce,
}

impl AnimationPath {
    /// Value at `elapsed_ms` of a `duration_ms` animation from `start` to `end`.
    ///
    /// Elapsed times past the duration yield `end`. A zero duration is
    /// already finished.
    pub fn value(
        self,
        elapsed_ms: u64,
        duration_ms: u32,
        start: i32,
        end: i32,
    ) -> i32 {
        let t = progress(elapsed_ms, duration_ms);
        let start = i64::from(start);
        let end = i64::from(end);
        let diff = end - start;

        let value = match self {
            Self::Linear => start + ((t * diff) >> BEZIER_SHIFT),
            Self::EaseInOut => {
                let step = bezier3(t, 0, 50, 952, BEZIER_MAX);
                start + ((step * diff) >> BEZIER_SHIFT)
            }
            Self::Bounce => bounce(t, start, end),
        };
        value as i32
    }
}

/// Map elapsed time onto 0..=1024.
fn progress(
    elapsed_ms: u64,
    duration_ms: u32,
) -> i64 {
    if duration_ms == 0 || elapsed_ms >= u64::from(duration_ms) {
        return BEZIER_MAX;
    }
    (elapsed_ms as i64 * BEZIER_MAX) / i64::from(duration_ms)
}

/// Cubic bezier through `u0..u3` at `t` (all on the 0..=1024 scale).
pub fn bezier3(
    t: i64,
    u0: i64,
    u1: i64,
    u2: i64,
    u3: i64,
) -> i64 {
    let t_rem = BEZIER_MAX - t;
    let t_rem2 = (t_rem * t_rem) >> BEZIER_SHIFT;
    let t_rem3 = (t_rem2 * t_rem) >> BEZIER_SHIFT;
    let t2 = (t * t) >> BEZIER_SHIFT;
    let t3 = (t2 * t) >> BEZIER_SHIFT;

    let v1 = (t_rem3 * u0) >> BEZIER_SHIFT;
    let v2 = (3 * t_rem2 * t * u1) >> (2 * BEZIER_SHIFT);
    let v3 = (3 * t_rem * t2 * u2) >> (2 * BEZIER_SHIFT);
    let v4 = (t3 * u3) >> BEZIER_SHIFT;

    v1 + v2 + v3 + v4
}

/// Three falls and two bounces. Each phase re-maps `t` onto the full scale
/// and measures the remaining distance back from `end`.
fn bounce(
    t: i64,
    start: i64,
    end: i64,
) -> i64 {
    let mut diff = end - start;

    let mut t = match t {
        // Fall
        ..408 => (t * 2500) >> BEZIER_SHIFT,
        // First bounce back
        408..614 => {
            diff /= 20;
            BEZIER_MAX - (t - 408) * 5
        }
        // Fall back
        614..819 => {
            diff /= 20;
            (t - 614) * 5
        }
        // Second bounce back
        819..921 => {
            diff /= 40;
            BEZIER_MAX - (t - 819) * 10
        }
        // Final fall
        _ => {
            diff /= 40;
            (t - 921) * 10
        }
    };
    t = t.clamp(0, BEZIER_MAX);

    let step = bezier3(t, BEZIER_MAX, 800, 500, 0);
    end - ((step * diff) >> BEZIER_SHIFT)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PATHS: [AnimationPath; 3] = [AnimationPath::Linear, AnimationPath::EaseInOut, AnimationPath::Bounce];

    #[test]
    fn test_bezier_endpoints() {
        assert_eq!(bezier3(0, 0, 50, 952, 1024), 0);
        assert_eq!(bezier3(BEZIER_MAX, 0, 50, 952, 1024), 1024);
        assert_eq!(bezier3(0, 1024, 800, 500, 0), 1024);
        assert_eq!(bezier3(BEZIER_MAX, 1024, 800, 500, 0), 0);
    }

    #[test]
    fn test_paths_start_and_end_exactly() {
        for path in PATHS {
            assert_eq!(path.value(0, 1000, 0, 162), 0, "{path:?} start");
            assert_eq!(path.value(1000, 1000, 0, 162), 162, "{path:?} end");
            assert_eq!(path.value(5000, 1000, 0, 162), 162, "{path:?} overrun");
        }
    }

    #[test]
    fn test_zero_duration_is_finished() {
        assert_eq!(AnimationPath::EaseInOut.value(0, 0, 10, 20), 20);
    }

    #[test]
    fn test_ease_in_out_is_monotonic() {
        let mut previous = 0;
        for ms in (0..=1000).step_by(50) {
            let value = AnimationPath::EaseInOut.value(ms, 1000, 0, 162);
            assert!(value >= previous, "dropped at {ms} ms");
            previous = value;
        }
    }

    #[test]
    fn test_ease_in_out_is_slow_at_edges() {
        let early = AnimationPath::EaseInOut.value(100, 1000, 0, 1000);
        let middle = AnimationPath::EaseInOut.value(550, 1000, 0, 1000)
            - AnimationPath::EaseInOut.value(450, 1000, 0, 1000);
        assert!(early < middle);
    }

    #[test]
    fn test_bounce_stays_in_range_and_bounces() {
        let mut dipped_after_reaching_end = false;
        let mut reached_end = false;
        for ms in 0..=1000 {
            let value = AnimationPath::Bounce.value(ms, 1000, 0, 162);
            assert!((0..=162).contains(&value), "{value} at {ms} ms");
            if value == 162 {
                reached_end = true;
            } else if reached_end {
                dipped_after_reaching_end = true;
            }
        }
        assert!(dipped_after_reaching_end);
    }
}
