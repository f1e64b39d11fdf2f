use super::super::{coords::Point3, curve_approx::CurveInfo, curves::line::Line};

#[test]
fn test_line() {
    let start = Point3::new(1.0, 2.0, 3.0);
    let end = Point3::new(4.0, 6.0, 3.0);
    let line = Line::new(start, end);
    assert_relative_eq!(line.length(), 5.0, max_relative = 0.0001);
    assert_eq!(line.value(0.0), start);

    let p = line.value(2.5);
    assert_relative_eq!(p.x, 2.5, max_relative = 0.0001);
    assert_relative_eq!(p.y, 4.0, max_relative = 0.0001);
    assert_relative_eq!(p.z, 3.0, max_relative = 0.0001);

    let p = line.value(line.length());
    assert_relative_eq!(p.x, end.x, max_relative = 0.0001);
    assert_relative_eq!(p.y, end.y, max_relative = 0.0001);
}

#[test]
fn test_line_stops_at_end() {
    let end = Point3::new(0.0, 0.0, 2.0);
    let line = Line::new(Point3::origin(), end);
    let p = line.value(10.0);
    assert_relative_eq!(p.z, 2.0, max_relative = 0.0001);
    assert_relative_eq!(p.x, 0.0);
}

#[test]
fn test_zero_length_line() {
    let p = Point3::new(5.0, 5.0, 5.0);
    let line = Line::new(p, p);
    assert_eq!(line.length(), 0.0);
    assert_eq!(line.value(1.0), p);
}
