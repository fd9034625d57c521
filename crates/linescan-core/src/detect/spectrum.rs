use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Full complex DFT of a real image.
pub struct Spectrum {
    pub coefficients: Array2<Complex<f64>>,
}

impl Spectrum {
    /// DFT of `data` after removing its mean.
    pub fn of_mean_subtracted(data: &Array2<f32>) -> Self {
        let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len().max(1) as f64;
        Self {
            coefficients: fft2d(data, mean),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.coefficients.dim()
    }

    /// Magnitude at a signed frequency `(ky, kx)`.
    pub fn magnitude(&self, ky: i64, kx: i64) -> f64 {
        self.coefficients[self.index(ky, kx)].norm()
    }

    /// Phase in `[-pi, pi]` at a signed frequency `(ky, kx)`.
    pub fn phase(&self, ky: i64, kx: i64) -> f64 {
        self.coefficients[self.index(ky, kx)].arg()
    }

    /// Array index of a signed frequency; negative frequencies wrap to the end.
    fn index(&self, ky: i64, kx: i64) -> [usize; 2] {
        let (h, w) = self.dim();
        [
            ky.rem_euclid(h as i64) as usize,
            kx.rem_euclid(w as i64) as usize,
        ]
    }
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(data: &Array2<f32>, mean: f64) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v as f64 - mean, 0.0));

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        fft2d_parallel(&mut result, &fft_row, &fft_col);
    } else {
        fft2d_sequential(&mut result, &fft_row, &fft_col);
    }

    result
}

fn fft2d_sequential(
    result: &mut Array2<Complex<f64>>,
    fft_row: &Arc<dyn Fft<f64>>,
    fft_col: &Arc<dyn Fft<f64>>,
) {
    let (h, w) = result.dim();

    for row in 0..h {
        let mut row_data: Vec<Complex<f64>> = (0..w).map(|c| result[[row, c]]).collect();
        fft_row.process(&mut row_data);
        for (col, val) in row_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }

    for col in 0..w {
        let mut col_data: Vec<Complex<f64>> = (0..h).map(|r| result[[r, col]]).collect();
        fft_col.process(&mut col_data);
        for (row, val) in col_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }
}

fn fft2d_parallel(
    result: &mut Array2<Complex<f64>>,
    fft_row: &Arc<dyn Fft<f64>>,
    fft_col: &Arc<dyn Fft<f64>>,
) {
    let (h, w) = result.dim();

    let processed_rows: Vec<Vec<Complex<f64>>> = (0..h)
        .into_par_iter()
        .map(|row| {
            let mut row_data: Vec<Complex<f64>> = (0..w).map(|c| result[[row, c]]).collect();
            fft_row.process(&mut row_data);
            row_data
        })
        .collect();
    for (row, row_data) in processed_rows.into_iter().enumerate() {
        for (col, val) in row_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }

    let processed_cols: Vec<Vec<Complex<f64>>> = (0..w)
        .into_par_iter()
        .map(|col| {
            let mut col_data: Vec<Complex<f64>> = (0..h).map(|r| result[[r, col]]).collect();
            fft_col.process(&mut col_data);
            col_data
        })
        .collect();
    for (col, col_data) in processed_cols.into_iter().enumerate() {
        for (row, val) in col_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }
}

/// DFT coefficient of `data` at an arbitrary (non-integer) frequency.
///
/// `fy`, `fx` are in cycles per pixel; coordinates are taken relative to
/// `centre = (cy, cx)`.
pub fn dft_at(data: &Array2<f32>, fy: f64, fx: f64, centre: (f64, f64)) -> Complex<f64> {
    let (h, w) = data.dim();
    let (cy, cx) = centre;
    let tau = std::f64::consts::TAU;
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len().max(1) as f64;

    let row_sums: Vec<Complex<f64>> = (0..h)
        .into_par_iter()
        .map(|row| {
            let y = row as f64 - cy;
            let mut acc = Complex::new(0.0, 0.0);
            for col in 0..w {
                let x = col as f64 - cx;
                let angle = -tau * (fx * x + fy * y);
                acc += Complex::from_polar(data[[row, col]] as f64 - mean, angle);
            }
            acc
        })
        .collect();

    row_sums.into_iter().sum()
}
