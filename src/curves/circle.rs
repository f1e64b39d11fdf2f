use crate::coords::{Point, Point3};
use crate::curve_approx::CurveInfo;
use std::f64::consts::PI;

/// Full counter-clockwise circle in a plane of constant Z, starting on
/// the positive X side of the center.
pub struct Circle
{
    center: Point,
    radius: f64,
    z: f64
}

impl Circle {
    pub fn new(center: Point, radius: f64, z: f64) -> Circle
    {
        Circle{center, radius, z}
    }

    /// Circle through `point`
    pub fn through(center: Point, point: Point, z: f64) -> Circle
    {
        Circle::new(center, (point - center).length(), z)
    }

    pub fn radius(&self) -> f64
    {
        self.radius
    }
}

impl CurveInfo for Circle {
    fn length(&self) -> f64
    {
        2.0 * PI * self.radius
    }

    fn value(&self, pos: f64) -> Point3
    {
        if self.radius == 0.0 {
            return Point3{x: self.center.x, y: self.center.y, z: self.z};
        }
        let (s,c) = (pos / self.radius).sin_cos();
        Point3{x: self.center.x + c * self.radius,
               y: self.center.y + s * self.radius,
               z: self.z}
    }
}
