use ndarray::{Array2, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

use super::line::LineFamily;
use super::point::Point;

/// Evaluate `f` at every pixel centre of an `(h, w)` grid.
///
/// Pixel `(row, col)` maps to the point `(col, row)`. Rows are filled in
/// parallel for large grids.
pub fn pixel_map<T, F>(dim: (usize, usize), f: F) -> Array2<T>
where
    T: Copy + Default + Send,
    F: Fn(Point) -> T + Sync,
{
    let (h, w) = dim;
    let mut out = Array2::<T>::default((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        Zip::indexed(&mut out).par_for_each(|(row, col), v| {
            *v = f(Point::new(col as f64, row as f64));
        });
    } else {
        for ((row, col), v) in out.indexed_iter_mut() {
            *v = f(Point::new(col as f64, row as f64));
        }
    }
    out
}

/// Per-pixel index of the nearest line of `family`.
pub fn line_index_map(family: &LineFamily, dim: (usize, usize)) -> Array2<i64> {
    pixel_map(dim, |p| family.line_index(p))
}

/// Per-pixel distance to the nearest line of `family`.
pub fn distance_map(family: &LineFamily, dim: (usize, usize)) -> Array2<f64> {
    pixel_map(dim, |p| family.point_distance(p))
}

/// Binary preview of the family: 1.0 within `half_width` of a line, else 0.0.
pub fn line_overlay(family: &LineFamily, dim: (usize, usize), half_width: f64) -> Array2<f32> {
    pixel_map(dim, |p| {
        if family.point_distance(p) < half_width {
            1.0
        } else {
            0.0
        }
    })
}
