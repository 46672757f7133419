//! Clamped cubic splines on uniformly spaced knots.
//!
//! A spline with `N` intervals is described by a flat parameter vector
//! `[q_0, ..., q_N, m_0, ..., m_N, duration]` with `m_i` the slope at knot
//! `i`. Knots sit at `i * duration / N`. The interior slopes are solved once,
//! when the parameter vector is built; evaluation only reads them. The
//! supported formulations (`N` in `3..=8`) are kept in a lookup table and
//! resolved once, when a trajectory is configured.

use simcore::ConfigError;

/// Evaluates `[position, velocity, acceleration]` at `t` from a parameter
/// vector.
pub type SplineFn = fn(f64, &[f64]) -> [f64; 3];

/// Supported interval counts and their evaluators.
pub const VARIANTS: [(usize, SplineFn); 6] = [
    (3, clamped::<3>),
    (4, clamped::<4>),
    (5, clamped::<5>),
    (6, clamped::<6>),
    (7, clamped::<7>),
    (8, clamped::<8>),
];

/// Looks up the evaluator for an interval count.
pub fn variant(intervals: usize) -> Result<SplineFn, ConfigError> {
    VARIANTS
        .iter()
        .find(|(n, _)| *n == intervals)
        .map(|&(_, f)| f)
        .ok_or(ConfigError::UnsupportedIntervalCount(intervals))
}

/// Length of the parameter vector for `intervals` intervals.
pub fn parameter_len(intervals: usize) -> usize {
    2 * intervals + 3
}

/// Packs knots, knot slopes and duration into a parameter vector. `slopes`
/// holds the clamped end slopes `[start, end]`; the interior ones are solved
/// here. Expects at least two intervals and a positive duration.
pub fn parameters(knots: &[f64], slopes: &[f64], duration: f64) -> Vec<f64> {
    let n = knots.len() - 1;
    let h = duration / n as f64;
    let mut params = Vec::with_capacity(parameter_len(n));
    params.extend_from_slice(knots);
    params.extend(knot_slopes(knots, slopes[0], slopes[1], h));
    params.push(duration);
    params
}

/// Knot slopes of the clamped spline, solved with the Thomas algorithm on
/// `m[i-1] + 4 m[i] + m[i+1] = 3 (q[i+1] - q[i-1]) / h`.
fn knot_slopes(knots: &[f64], start: f64, end: f64, h: f64) -> Vec<f64> {
    let n = knots.len() - 1;
    let mut slopes = vec![0.0; n + 1];
    slopes[0] = start;
    slopes[n] = end;

    let interior = n - 1;
    let mut c_prime = vec![0.0; interior];
    let mut d_prime = vec![0.0; interior];
    for row in 0..interior {
        let i = row + 1;
        let mut d = 3.0 * (knots[i + 1] - knots[i - 1]) / h;
        if i == 1 {
            d -= start;
        }
        if i == n - 1 {
            d -= end;
        }
        if row == 0 {
            c_prime[row] = 1.0 / 4.0;
            d_prime[row] = d / 4.0;
        } else {
            let denom = 4.0 - c_prime[row - 1];
            c_prime[row] = 1.0 / denom;
            d_prime[row] = (d - d_prime[row - 1]) / denom;
        }
    }
    for row in (0..interior).rev() {
        let next = if row + 1 < interior { slopes[row + 2] } else { 0.0 };
        slopes[row + 1] = d_prime[row] - c_prime[row] * next;
    }
    slopes
}

/// Clamped cubic spline with `N` uniform intervals.
pub fn clamped<const N: usize>(t: f64, params: &[f64]) -> [f64; 3] {
    let knots = &params[..=N];
    let slopes = &params[N + 1..=2 * N + 1];
    let duration = params[2 * N + 2];

    if t < 0.0 {
        return [knots[0], 0.0, 0.0];
    }
    if t > duration {
        return [knots[N], 0.0, 0.0];
    }

    let h = duration / N as f64;
    let i = ((t / h).floor() as usize).min(N - 1);
    let s = (t - i as f64 * h) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let (y0, y1) = (knots[i], knots[i + 1]);
    let (m0, m1) = (slopes[i] * h, slopes[i + 1] * h);

    // Hermite basis
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    let position = h00 * y0 + h10 * m0 + h01 * y1 + h11 * m1;

    let velocity = ((6.0 * s2 - 6.0 * s) * y0
        + (3.0 * s2 - 4.0 * s + 1.0) * m0
        + (6.0 * s - 6.0 * s2) * y1
        + (3.0 * s2 - 2.0 * s) * m1)
        / h;

    let acceleration = ((12.0 * s - 6.0) * y0
        + (6.0 * s - 4.0) * m0
        + (6.0 - 12.0 * s) * y1
        + (6.0 * s - 2.0) * m1)
        / (h * h);

    [position, velocity, acceleration]
}
