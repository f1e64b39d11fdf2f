use crate::coords::{Point, Point3, Transform};
use crate::machine_config::CorrectionConfig;

/// Actuator codes for the three streamed axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCodes
{
    pub x: u16,
    pub y: u16,
    pub z: u16
}

pub fn clamp_to_u16(value: f64) -> u16
{
    if value.is_nan() {
        return 0;
    }
    num::clamp(value, 0.0, 65535.0) as u16
}

/// Maps logical millimeter positions to hardware coordinates.
pub trait Correction: Send + Sync
{
    fn correct(&self, p: Point3) -> Point3;

    fn codes(&self, p: Point3) -> AxisCodes
    {
        let c = self.correct(p);
        AxisCodes {
            x: clamp_to_u16(c.x),
            y: clamp_to_u16(c.y),
            z: clamp_to_u16(c.z)
        }
    }
}

/// Fixed calibration of the galvo head.
///
/// Z is measured from the focal plane offset. X and Y shear with Z, every
/// axis is scaled by its gain, X/Y are rotated into the mirror frame and X
/// picks up the mechanical X/Z coupling. The result is centered at
/// mid-scale.
#[derive(Debug, Clone)]
pub struct GalvoCorrection
{
    config: CorrectionConfig,
    rotation: Transform
}

impl GalvoCorrection
{
    pub fn new(config: &CorrectionConfig) -> GalvoCorrection
    {
        GalvoCorrection {
            config: config.clone(),
            rotation: Transform::rotate(-config.rotation_deg.to_radians())
        }
    }
}

impl Correction for GalvoCorrection
{
    fn correct(&self, p: Point3) -> Point3
    {
        let c = &self.config;
        let z = p.z - c.z_offset;
        let sheared = Point {
            x: (p.x - c.x_z_coeff * z) * c.x_gain,
            y: (p.y + c.y_z_coeff * z) * c.y_gain
        };
        let z = z * c.z_gain;
        let r = self.rotation * sheared;
        Point3 {
            x: r.x - z + c.mid_scale,
            y: r.y + c.mid_scale,
            z: z + c.mid_scale
        }
    }
}
