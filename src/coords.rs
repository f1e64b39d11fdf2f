use std::fmt;

/// Point in the XY plane, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point
{
    pub x: f64,
    pub y: f64
}

impl fmt::Display for Point
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Point
{
    pub fn new(x: f64, y: f64) -> Point
    {
        Point{x, y}
    }

    pub fn length(&self) -> f64
    {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl std::ops::Sub<Point> for Point {
    type Output = Point;
    fn sub(self, v: Point) -> Point {
        Point { x: self.x - v.x,
                y: self.y - v.y}
    }
}

/// Logical head position: X/Y in the marking plane, Z along the focus axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3
{
    pub x: f64,
    pub y: f64,
    pub z: f64
}

impl fmt::Display for Point3
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Point3
{
    pub fn new(x: f64, y: f64, z: f64) -> Point3
    {
        Point3{x, y, z}
    }

    pub fn origin() -> Point3
    {
        Point3{x: 0.0, y: 0.0, z: 0.0}
    }

    pub fn length(&self) -> f64
    {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn xy(&self) -> Point
    {
        Point{x: self.x, y: self.y}
    }
}

impl std::ops::Add<Point3> for Point3 {
    type Output = Point3;
    fn add(self, v: Point3) -> Point3 {
        Point3 { x: self.x + v.x,
                 y: self.y + v.y,
                 z: self.z + v.z}
    }
}

impl std::ops::Sub<Point3> for Point3 {
    type Output = Point3;
    fn sub(self, v: Point3) -> Point3 {
        Point3 { x: self.x - v.x,
                 y: self.y - v.y,
                 z: self.z - v.z}
    }
}

impl std::ops::Mul<f64> for Point3 {
    type Output = Point3;
    fn mul(self, s: f64) -> Point3 {
        Point3 { x: self.x * s,
                 y: self.y * s,
                 z: self.z * s}
    }
}

/// 2D affine transform, column major `[a, b, c, d, e, f]` as in SVG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub matrix : [f64;6]
}

impl Transform {
    /// Counter-clockwise rotation by `a` radians.
    pub fn rotate(a: f64) -> Transform {
        let (s,c) = a.sin_cos();
        Transform{matrix:[c, s, -s, c, 0.0, 0.0]}
    }
}

impl std::ops::Mul<Point> for Transform {
    type Output = Point;
    fn mul(self, v: Point) -> Point {
        Point { x: self.matrix[0] * v.x + self.matrix[2] * v.y + self.matrix[4],
                y: self.matrix[1] * v.x + self.matrix[3] * v.y + self.matrix[5]}
    }
}

#[test]
fn test_rotate_point()
{
    let r = Transform::rotate(std::f64::consts::FRAC_PI_2);
    let p = r * Point::new(1.0, 0.0);
    assert!((p.x - 0.0).abs() < 1e-12);
    assert!((p.y - 1.0).abs() < 1e-12);

    let r = Transform::rotate(-std::f64::consts::FRAC_PI_4);
    let p = r * Point::new(1.0, 1.0);
    assert!((p.x - 2f64.sqrt()).abs() < 1e-12);
    assert!(p.y.abs() < 1e-12);
}

#[test]
fn test_point3_ops()
{
    let a = Point3::new(1.0, 2.0, 3.0);
    let b = Point3::new(4.0, 6.0, 3.0);
    assert_eq!((b - a).length(), 5.0);
    assert_eq!(a + (b - a) * 0.5, Point3::new(2.5, 4.0, 3.0));
    assert_eq!(a.xy(), Point::new(1.0, 2.0));
    assert_eq!(Point::new(4.0, 6.0) - Point::new(1.0, 2.0), Point::new(3.0, 4.0));
}
