use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::error::{LinescanError, Result};

use super::point::Point;

/// A single infinite line.
///
/// `orientation` is the angle of the direction vector; `offset` is the signed
/// distance from the coordinate origin along the normal
/// `(cos(orientation + pi/2), sin(orientation + pi/2))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub orientation: f64,
    pub offset: f64,
}

impl Line {
    pub fn new(orientation: f64, offset: f64) -> Self {
        Self {
            orientation,
            offset,
        }
    }

    pub fn direction(&self) -> Point {
        Point::new(self.orientation.cos(), self.orientation.sin())
    }

    pub fn normal(&self) -> Point {
        let angle = self.orientation + FRAC_PI_2;
        Point::new(angle.cos(), angle.sin())
    }

    /// Point on the line closest to the coordinate origin.
    pub fn origin(&self) -> Point {
        self.normal() * self.offset
    }

    /// Signed perpendicular distance of `p` from the line.
    pub fn signed_distance(&self, p: Point) -> f64 {
        p.dot(self.normal()) - self.offset
    }
}

/// Direction in which a line family advances over a scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftDirection {
    #[default]
    Forward,
    Reverse,
}

impl ShiftDirection {
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

impl std::fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "Forward"),
            Self::Reverse => write!(f, "Reverse"),
        }
    }
}

/// An infinite family of parallel, equally spaced lines.
///
/// Line `k` is the reference line with its offset advanced by `k * distance`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineFamily {
    zero_line: Line,
    distance: f64,
}

impl LineFamily {
    pub fn new(zero_line: Line, distance: f64) -> Result<Self> {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(LinescanError::InvalidInput(format!(
                "line spacing must be positive, got {distance}"
            )));
        }
        if !(zero_line.orientation.is_finite() && zero_line.offset.is_finite()) {
            return Err(LinescanError::InvalidInput(format!(
                "non-finite line parameters: {zero_line:?}"
            )));
        }
        Ok(Self {
            zero_line,
            distance,
        })
    }

    /// Build a family from three hand-picked points.
    ///
    /// `p1` and `p2` lie on one line and fix its direction. The perpendicular
    /// distance from `p3` to that line spans `lines_per_interval` spacings.
    /// The reference line passes through `p1`.
    pub fn from_three_points(
        p1: Point,
        p2: Point,
        p3: Point,
        lines_per_interval: u32,
    ) -> Result<Self> {
        if lines_per_interval == 0 {
            return Err(LinescanError::InvalidInput(
                "number of lines must be positive".into(),
            ));
        }
        let delta = p2 - p1;
        let length = delta.norm();
        if length == 0.0 {
            return Err(LinescanError::InvalidInput(format!(
                "first two points coincide at ({p1})"
            )));
        }

        let orientation = delta.y.atan2(delta.x);
        let interval = delta.cross(p1 - p3).abs() / length;
        if interval == 0.0 {
            return Err(LinescanError::InvalidInput(format!(
                "third point ({p3}) lies on the line through ({p1}) and ({p2})"
            )));
        }
        let distance = interval / lines_per_interval as f64;

        let mut zero_line = Line::new(orientation, 0.0);
        zero_line.offset = p1.dot(zero_line.normal());

        Self::new(zero_line, distance)
    }

    pub fn zero_line(&self) -> Line {
        self.zero_line
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn orientation(&self) -> f64 {
        self.zero_line.orientation
    }

    pub fn offset(&self) -> f64 {
        self.zero_line.offset
    }

    /// Unit normal shared by every line of the family.
    pub fn normal(&self) -> Point {
        self.zero_line.normal()
    }

    /// Line `index` of the family.
    pub fn line(&self, index: i64) -> Line {
        Line::new(
            self.zero_line.orientation,
            self.zero_line.offset + index as f64 * self.distance,
        )
    }

    /// Family position at scan step `step` of `total_steps`.
    ///
    /// Step 0 is the family itself; step `total_steps` is one full spacing on.
    pub fn shifted(
        &self,
        step: usize,
        total_steps: usize,
        direction: ShiftDirection,
    ) -> Result<Self> {
        if total_steps == 0 {
            return Err(LinescanError::InvalidInput(
                "number of scan steps must be positive".into(),
            ));
        }
        let fraction = step as f64 / total_steps as f64;
        Ok(self.shifted_by(direction.sign() * fraction))
    }

    /// Family with its offset advanced by `fraction` of a spacing.
    pub fn shifted_by(&self, fraction: f64) -> Self {
        Self {
            zero_line: Line::new(
                self.zero_line.orientation,
                self.zero_line.offset + fraction * self.distance,
            ),
            distance: self.distance,
        }
    }

    /// Coordinate of `p` along the family normal.
    pub fn project(&self, p: Point) -> f64 {
        p.dot(self.normal())
    }

    /// Perpendicular distance from `p` to the nearest line, in `[0, distance/2]`.
    pub fn point_distance(&self, p: Point) -> f64 {
        symmetric_remainder(self.project(p) - self.zero_line.offset, self.distance).abs()
    }

    /// Index of the line nearest to `p`.
    pub fn line_index(&self, p: Point) -> i64 {
        ((self.project(p) - self.zero_line.offset) / self.distance).round() as i64
    }
}

impl std::fmt::Display for LineFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "distance={:.4} orientation={:.6} offset={:.4}",
            self.distance, self.zero_line.orientation, self.zero_line.offset
        )
    }
}

/// Remainder with the quotient rounded to the nearest integer.
///
/// Result lies in `[-modulus/2, modulus/2]`, so `|r|` is continuous across
/// multiples of `modulus`.
pub fn symmetric_remainder(value: f64, modulus: f64) -> f64 {
    value - (value / modulus).round() * modulus
}
