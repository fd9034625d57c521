use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{LinescanError, Result};
use crate::frame::Frame;

/// A planar point in pixel coordinates (`x` = column, `y` = row).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3-D cross product.
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Parse a point list of the form `"x,y;x,y;x,y"`.
///
/// Coordinates are integers; surrounding whitespace is ignored.
pub fn parse_points(input: &str) -> Result<Vec<Point>> {
    input
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_point)
        .collect()
}

fn parse_point(pair: &str) -> Result<Point> {
    let coords: Vec<&str> = pair.split(',').map(str::trim).collect();
    if coords.len() != 2 {
        return Err(LinescanError::InvalidInput(format!(
            "expected `x,y`, got `{pair}`"
        )));
    }
    let parse = |s: &str| {
        s.parse::<i64>()
            .map(|v| v as f64)
            .map_err(|_| LinescanError::InvalidInput(format!("non-numeric coordinate `{s}`")))
    };
    Ok(Point::new(parse(coords[0])?, parse(coords[1])?))
}

/// Parse exactly three line-defining points.
pub fn parse_three_points(input: &str) -> Result<[Point; 3]> {
    let points = parse_points(input)?;
    <[Point; 3]>::try_from(points).map_err(|points| {
        LinescanError::InvalidInput(format!("need 3 input points, got {}", points.len()))
    })
}

/// Source of the three points defining a line family.
///
/// Interactive pickers live outside the core; this is the seam they plug into.
pub trait PointPicker {
    fn pick_three_points(&mut self, image: &Frame) -> Result<[Point; 3]>;
}

/// Picker that returns points known in advance (typed or parsed).
#[derive(Clone, Debug)]
pub struct FixedPoints(pub [Point; 3]);

impl FixedPoints {
    pub fn parse(input: &str) -> Result<Self> {
        parse_three_points(input).map(Self)
    }
}

impl PointPicker for FixedPoints {
    fn pick_three_points(&mut self, _image: &Frame) -> Result<[Point; 3]> {
        Ok(self.0)
    }
}
