use crate::coords::Point3;

pub trait CurveInfo
{
    /// Returns total length of curve
    fn length(&self) -> f64;

    /// Returns the position at the given distance along the curve.
    ///
    /// # Arguments
    ///
    /// * `pos` - Distance from the start of the curve. Values past
    /// `length()` are allowed, closed curves keep going around.
    fn value(&self, pos: f64) -> Point3;
}
