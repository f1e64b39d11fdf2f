use crate::coords::Point3;
use crate::curve_approx::CurveInfo;

/// Straight segment between two points.
pub struct Line
{
    start: Point3,
    dir: Point3,
    length: f64
}

impl Line {
    pub fn new(start: Point3, end: Point3) -> Line
    {
        let delta = end - start;
        let length = delta.length();
        let dir = if length == 0.0 {
            Point3::origin()
        } else {
            delta * (1.0 / length)
        };
        Line{start,
             dir,
             length
        }
    }
}

impl CurveInfo for Line {
    fn length(&self) -> f64
    {
        self.length
    }

    /// Stops at the end point
    fn value(&self, pos: f64) -> Point3
    {
        self.start + self.dir * pos.min(self.length)
    }
}
