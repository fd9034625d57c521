/// Refine a peak using 1-D parabola fits through its 3x3 neighbourhood.
///
/// `sample(dy, dx)` returns the value at the given offset from the integer
/// peak. Returns `(delta_row, delta_col)` as fractional offsets, clamped to
/// half a sample.
pub fn refine_peak_paraboloid(sample: impl Fn(i64, i64) -> f64) -> (f64, f64) {
    let centre = sample(0, 0);

    let delta_row = parabola_vertex(sample(-1, 0), centre, sample(1, 0));
    let delta_col = parabola_vertex(sample(0, -1), centre, sample(0, 1));

    (delta_row.clamp(-0.5, 0.5), delta_col.clamp(-0.5, 0.5))
}

/// Climb a smooth peak of a continuous function from `start`.
///
/// Each iteration fits a parabola along each axis through samples `step`
/// apart and moves to its vertex (at most one step), then halves `step`.
pub fn polish_peak(
    sample: impl Fn(f64, f64) -> f64,
    start: (f64, f64),
    mut step: f64,
    iterations: usize,
) -> (f64, f64) {
    let (mut y, mut x) = start;
    for _ in 0..iterations {
        let centre = sample(y, x);
        let dy = parabola_vertex(sample(y - step, x), centre, sample(y + step, x));
        y += dy.clamp(-1.0, 1.0) * step;

        let centre = sample(y, x);
        let dx = parabola_vertex(sample(y, x - step), centre, sample(y, x + step));
        x += dx.clamp(-1.0, 1.0) * step;

        step *= 0.5;
    }
    (y, x)
}

fn parabola_vertex(prev: f64, curr: f64, next: f64) -> f64 {
    let denom = prev - 2.0 * curr + next;
    if denom.abs() > 1e-12 {
        (prev - next) / (2.0 * denom)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paraboloid_recovers_offset() {
        let (dy, dx) = refine_peak_paraboloid(|dy, dx| {
            let (y, x) = (dy as f64 - 0.2, dx as f64 + 0.3);
            -(y * y) - x * x
        });
        assert!((dy - 0.2).abs() < 1e-9);
        assert!((dx + 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_polish_peak_converges_on_smooth_peak() {
        let (y, x) = polish_peak(
            |y, x| (-(y - 3.37).powi(2) - (x + 1.82).powi(2)).exp(),
            (3.0, -2.0),
            0.25,
            8,
        );
        assert!((y - 3.37).abs() < 1e-3, "y = {y}");
        assert!((x + 1.82).abs() < 1e-3, "x = {x}");
    }
}
