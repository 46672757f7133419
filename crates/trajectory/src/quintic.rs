//! Piecewise minimum-jerk quintic interpolation.
//!
//! Each segment joins two breakpoints with zero velocity and acceleration at
//! both ends, so position, velocity and acceleration are continuous across
//! breakpoints.

/// Position, velocity and acceleration on one segment `[t0, t1]` from `q0`
/// to `q1`. Times outside the segment hold the nearest end.
pub fn eval(t: f64, t0: f64, t1: f64, q0: f64, q1: f64) -> [f64; 3] {
    let h = t1 - t0;
    if h <= 0.0 {
        return [if t < t0 { q0 } else { q1 }, 0.0, 0.0];
    }

    let s = ((t - t0) / h).clamp(0.0, 1.0);
    let s2 = s * s;
    let s3 = s2 * s;
    let dq = q1 - q0;

    // 10s^3 - 15s^4 + 6s^5 and its derivatives
    let shape = s3 * (10.0 - 15.0 * s + 6.0 * s2);
    let d_shape = 30.0 * s2 * (1.0 - s) * (1.0 - s);
    let dd_shape = 60.0 * s * (1.0 - s) * (1.0 - 2.0 * s);

    [q0 + dq * shape, dq * d_shape / h, dq * dd_shape / (h * h)]
}

/// End index `j` of the segment `[times[j-1], times[j]]` used at `t`.
///
/// Scans forward from the first interior breakpoint and stops at the first
/// `j` with `t <= times[j]`; times past the range stay on the last segment.
pub fn segment_index(times: &[f64], t: f64) -> usize {
    let mut j = 1;
    while j < times.len() - 1 && t > times[j] {
        j += 1;
    }
    j
}

/// Evaluates the piecewise quintic through `(times[i], positions[i])`.
pub fn evaluate(times: &[f64], positions: &[f64], t: f64) -> [f64; 3] {
    let j = segment_index(times, t);
    eval(t, times[j - 1], times[j], positions[j - 1], positions[j])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_values() {
        let [q, v, a] = eval(0.0, 0.0, 2.0, 1.0, 3.0);
        assert_eq!((q, v, a), (1.0, 0.0, 0.0));

        let [q, v, a] = eval(2.0, 0.0, 2.0, 1.0, 3.0);
        assert!((q - 3.0).abs() < 1e-12);
        assert!(v.abs() < 1e-12);
        assert!(a.abs() < 1e-12);
    }

    #[test]
    fn test_midpoint_symmetry() {
        // Halfway in time is halfway in position, at peak velocity 15/8 * dq / h.
        let [q, v, a] = eval(1.0, 0.0, 2.0, 0.0, 4.0);
        assert!((q - 2.0).abs() < 1e-12);
        assert!((v - 15.0 / 8.0 * 4.0 / 2.0).abs() < 1e-12);
        assert!(a.abs() < 1e-12);
    }

    #[test]
    fn test_continuity_at_every_breakpoint() {
        let times = [0.0, 0.3, 0.7, 1.2];
        let positions = [0.0, 1.5, -0.5, 0.25];

        for (i, (&t, &q)) in times.iter().zip(positions.iter()).enumerate() {
            let [pos, vel, _] = evaluate(&times, &positions, t);
            assert!((pos - q).abs() < 1e-12, "breakpoint {i}: {pos} vs {q}");
            assert!(vel.abs() < 1e-12, "breakpoint {i}: velocity {vel}");

            // Approaching from the right gives the same state
            let [pos_r, vel_r, _] = evaluate(&times, &positions, t + 1e-9);
            assert!((pos_r - q).abs() < 1e-6);
            assert!(vel_r.abs() < 1e-5);
        }
    }

    #[test]
    fn test_segment_search_ties_and_clamping() {
        let times = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(segment_index(&times, -1.0), 1);
        assert_eq!(segment_index(&times, 0.5), 1);
        assert_eq!(segment_index(&times, 1.0), 1);
        assert_eq!(segment_index(&times, 1.5), 2);
        assert_eq!(segment_index(&times, 3.0), 3);
        assert_eq!(segment_index(&times, 10.0), 3);
    }

    #[test]
    fn test_outside_range_holds_endpoints() {
        let times = [0.0, 1.0];
        let positions = [0.5, 2.0];
        assert_eq!(evaluate(&times, &positions, -0.5), [0.5, 0.0, 0.0]);
        let [q, v, a] = evaluate(&times, &positions, 4.0);
        assert!((q - 2.0).abs() < 1e-12);
        assert_eq!((v, a), (0.0, 0.0));
    }
}
