use std::f64::consts::{FRAC_PI_2, PI};

use approx::assert_abs_diff_eq;
use linescan_core::error::LinescanError;
use linescan_core::geometry::{
    distance_map, line_index_map, line_overlay, parse_points, parse_three_points,
    symmetric_remainder, FixedPoints, Line, LineFamily, Point, PointPicker, ShiftDirection,
};

fn vertical_family() -> LineFamily {
    LineFamily::from_three_points(
        Point::new(0.0, 0.0),
        Point::new(0.0, 100.0),
        Point::new(80.0, 0.0),
        10,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Point parsing
// ---------------------------------------------------------------------------

#[test]
fn test_parse_points() {
    let points = parse_points("10,20; 30,40 ;-5,6").unwrap();
    assert_eq!(
        points,
        vec![
            Point::new(10.0, 20.0),
            Point::new(30.0, 40.0),
            Point::new(-5.0, 6.0)
        ]
    );
}

#[test]
fn test_parse_points_rejects_non_numeric() {
    let err = parse_points("10,a;1,2;3,4").unwrap_err();
    assert!(matches!(err, LinescanError::InvalidInput(_)));
}

#[test]
fn test_parse_points_rejects_missing_coordinate() {
    assert!(parse_points("10;1,2;3,4").is_err());
    assert!(parse_points("1,2,3;1,2;3,4").is_err());
}

#[test]
fn test_parse_three_points_wrong_count() {
    let err = parse_three_points("1,2;3,4").unwrap_err();
    assert!(err.to_string().contains("need 3 input points, got 2"));
}

#[test]
fn test_fixed_points_picker() {
    let mut picker = FixedPoints::parse("0,0;0,100;80,0").unwrap();
    let frame = linescan_core::frame::Frame::new(ndarray::Array2::zeros((4, 4)), 8);
    let [p1, p2, p3] = picker.pick_three_points(&frame).unwrap();
    assert_eq!(p1, Point::new(0.0, 0.0));
    assert_eq!(p2, Point::new(0.0, 100.0));
    assert_eq!(p3, Point::new(80.0, 0.0));
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

#[test]
fn test_line_normal_is_perpendicular_unit() {
    let line = Line::new(0.7, 3.0);
    assert_abs_diff_eq!(line.normal().norm(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(line.normal().dot(line.direction()), 0.0, epsilon = 1e-12);
}

#[test]
fn test_line_origin_lies_on_line() {
    let line = Line::new(1.2, -7.5);
    assert_abs_diff_eq!(line.signed_distance(line.origin()), 0.0, epsilon = 1e-9);
    let along = line.origin() + line.direction() * 42.0;
    assert_abs_diff_eq!(line.signed_distance(along), 0.0, epsilon = 1e-9);
}

// ---------------------------------------------------------------------------
// LineFamily construction
// ---------------------------------------------------------------------------

#[test]
fn test_from_three_points_vertical() {
    let family = vertical_family();
    assert_abs_diff_eq!(family.distance(), 8.0, epsilon = 1e-9);
    assert_abs_diff_eq!(family.orientation(), FRAC_PI_2, epsilon = 1e-9);
    assert_abs_diff_eq!(family.offset(), 0.0, epsilon = 1e-9);
}

#[test]
fn test_from_three_points_reference_line_through_first_point() {
    let p1 = Point::new(12.0, 7.0);
    let p2 = Point::new(52.0, 37.0);
    let p3 = Point::new(20.0, 60.0);
    let family = LineFamily::from_three_points(p1, p2, p3, 5).unwrap();
    assert_abs_diff_eq!(family.point_distance(p1), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(family.point_distance(p2), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(family.orientation(), (30.0f64).atan2(40.0), epsilon = 1e-12);
    // p3 sits exactly 5 spacings away
    assert_abs_diff_eq!(family.point_distance(p3), 0.0, epsilon = 1e-9);
    assert_eq!(family.line_index(p3).abs(), 5);
}

#[test]
fn test_from_three_points_rejects_zero_lines() {
    let err = LineFamily::from_three_points(
        Point::new(0.0, 0.0),
        Point::new(0.0, 100.0),
        Point::new(80.0, 0.0),
        0,
    )
    .unwrap_err();
    assert!(matches!(err, LinescanError::InvalidInput(_)));
}

#[test]
fn test_from_three_points_rejects_coincident_points() {
    let p = Point::new(5.0, 5.0);
    let err = LineFamily::from_three_points(p, p, Point::new(80.0, 0.0), 10).unwrap_err();
    assert!(matches!(err, LinescanError::InvalidInput(_)));
}

#[test]
fn test_from_three_points_rejects_collinear_third_point() {
    let err = LineFamily::from_three_points(
        Point::new(0.0, 0.0),
        Point::new(0.0, 100.0),
        Point::new(0.0, 50.0),
        10,
    )
    .unwrap_err();
    assert!(matches!(err, LinescanError::InvalidInput(_)));
}

#[test]
fn test_new_rejects_non_positive_distance() {
    assert!(LineFamily::new(Line::new(0.0, 0.0), 0.0).is_err());
    assert!(LineFamily::new(Line::new(0.0, 0.0), -2.0).is_err());
    assert!(LineFamily::new(Line::new(f64::NAN, 0.0), 2.0).is_err());
}

// ---------------------------------------------------------------------------
// Distances and indices
// ---------------------------------------------------------------------------

#[test]
fn test_point_distance_vertical_family() {
    let family = vertical_family();
    assert_abs_diff_eq!(family.point_distance(Point::new(0.0, 33.0)), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(family.point_distance(Point::new(3.0, 0.0)), 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(family.point_distance(Point::new(4.0, 0.0)), 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(family.point_distance(Point::new(6.0, 0.0)), 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(family.point_distance(Point::new(16.0, 9.0)), 0.0, epsilon = 1e-9);
}

#[test]
fn test_point_distance_bounded_by_half_spacing() {
    let family = LineFamily::new(Line::new(0.37, 2.5), 7.3).unwrap();
    for i in 0..40 {
        for j in 0..40 {
            let d = family.point_distance(Point::new(i as f64 * 1.7, j as f64 * 2.3));
            assert!((0.0..=7.3 / 2.0 + 1e-9).contains(&d), "distance {d} out of range");
        }
    }
}

#[test]
fn test_point_distance_on_every_line() {
    let family = LineFamily::new(Line::new(2.1, -4.0), 6.5).unwrap();
    for k in -5..5 {
        let line = family.line(k);
        let p = line.origin() + line.direction() * 17.0;
        assert!(family.point_distance(p) < 1e-9);
        assert_eq!(family.line_index(p), k);
    }
}

#[test]
fn test_symmetric_remainder() {
    assert_abs_diff_eq!(symmetric_remainder(7.0, 8.0), -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(symmetric_remainder(-7.0, 8.0), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(symmetric_remainder(3.0, 8.0), 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(symmetric_remainder(16.0, 8.0), 0.0, epsilon = 1e-12);
}

// ---------------------------------------------------------------------------
// Shifting
// ---------------------------------------------------------------------------

#[test]
fn test_shifted_step_zero_is_identity() {
    let family = vertical_family();
    let shifted = family.shifted(0, 8, ShiftDirection::Forward).unwrap();
    assert_eq!(shifted, family);
}

#[test]
fn test_shifted_advances_offset() {
    let family = vertical_family();
    let forward = family.shifted(2, 8, ShiftDirection::Forward).unwrap();
    assert_abs_diff_eq!(forward.offset(), 2.0, epsilon = 1e-12);
    let reverse = family.shifted(2, 8, ShiftDirection::Reverse).unwrap();
    assert_abs_diff_eq!(reverse.offset(), -2.0, epsilon = 1e-12);
    assert_eq!(forward.distance(), family.distance());
    assert_eq!(forward.orientation(), family.orientation());
}

#[test]
fn test_shifted_full_cycle_matches_original_lines() {
    let family = LineFamily::new(Line::new(0.9, 1.5), 5.0).unwrap();
    let full = family.shifted(10, 10, ShiftDirection::Forward).unwrap();
    let p = Point::new(13.0, 21.0);
    assert_abs_diff_eq!(full.point_distance(p), family.point_distance(p), epsilon = 1e-9);
}

#[test]
fn test_shifted_rejects_zero_steps() {
    let err = vertical_family()
        .shifted(0, 0, ShiftDirection::Forward)
        .unwrap_err();
    assert!(matches!(err, LinescanError::InvalidInput(_)));
}

#[test]
fn test_shift_direction_sign() {
    assert_eq!(ShiftDirection::Forward.sign(), 1.0);
    assert_eq!(ShiftDirection::Reverse.sign(), -1.0);
    assert_eq!(ShiftDirection::default(), ShiftDirection::Forward);
}

// ---------------------------------------------------------------------------
// Pixel fields
// ---------------------------------------------------------------------------

#[test]
fn test_line_index_map_vertical() {
    let family = vertical_family();
    let map = line_index_map(&family, (4, 20));
    // normal points along -x, so indices decrease to the right
    assert_eq!(map[[0, 0]], 0);
    assert_eq!(map[[2, 3]], 0);
    assert_eq!(map[[1, 8]], -1);
    assert_eq!(map[[3, 16]], -2);
}

#[test]
fn test_distance_map_parallel_matches_point_distance() {
    // 300x300 exceeds the parallel threshold
    let family = LineFamily::new(Line::new(0.4, 2.0), 9.0).unwrap();
    let map = distance_map(&family, (300, 300));
    for &(row, col) in &[(0usize, 0usize), (150, 77), (299, 299), (12, 280)] {
        let expected = family.point_distance(Point::new(col as f64, row as f64));
        assert_abs_diff_eq!(map[[row, col]], expected, epsilon = 1e-12);
    }
}

#[test]
fn test_line_overlay_marks_lines() {
    let family = vertical_family();
    let overlay = line_overlay(&family, (10, 32), 0.5);
    assert_eq!(overlay[[5, 0]], 1.0);
    assert_eq!(overlay[[5, 8]], 1.0);
    assert_eq!(overlay[[5, 4]], 0.0);
    assert_eq!(overlay[[5, 1]], 0.0);
    let marked = overlay.iter().filter(|&&v| v > 0.0).count();
    // columns 0, 8, 16, 24 on every row
    assert_eq!(marked, 4 * 10);

    let wide = line_overlay(&family, (10, 32), 1.5);
    assert_eq!(wide[[5, 1]], 1.0);
    assert_eq!(wide[[5, 7]], 1.0);
    assert_eq!(wide[[5, 3]], 0.0);
    // neighbours on both sides; column 31 is next to the line at x = 32
    assert_eq!(wide.iter().filter(|&&v| v > 0.0).count(), 12 * 10);
}

#[test]
fn test_family_display() {
    let family = LineFamily::new(Line::new(PI / 4.0, 1.0), 8.0).unwrap();
    let text = family.to_string();
    assert!(text.starts_with("distance=8.0000"));
    assert!(text.contains("offset=1.0000"));
}

#[test]
fn test_unit_spacing_family_periodicity() {
    let family = LineFamily::from_three_points(
        Point::new(0.0, 0.0),
        Point::new(0.0, 100.0),
        Point::new(10.0, 0.0),
        10,
    )
    .unwrap();
    assert_abs_diff_eq!(family.orientation(), FRAC_PI_2, epsilon = 1e-9);
    assert_abs_diff_eq!(family.distance(), 1.0, epsilon = 1e-12);

    for k in -3..3 {
        let gap = family.line(k + 1).offset - family.line(k).offset;
        assert_eq!(gap, family.distance());
    }

    let p = Point::new(0.3, 4.0);
    let base = family.point_distance(p);
    assert_abs_diff_eq!(base, 0.3, epsilon = 1e-9);
    for k in -4..=4 {
        let moved = p + family.normal() * (k as f64 * family.distance());
        assert_abs_diff_eq!(family.point_distance(moved), base, epsilon = 1e-9);
    }
}

#[test]
fn test_shifted_full_period_offset() {
    let family = LineFamily::new(Line::new(0.2, 1.0), 3.0).unwrap();
    let start = family.shifted(0, 6, ShiftDirection::Reverse).unwrap();
    let end = family.shifted(6, 6, ShiftDirection::Reverse).unwrap();
    assert_abs_diff_eq!(end.offset(), start.offset() - 3.0, epsilon = 1e-12);
}
