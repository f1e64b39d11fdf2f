//! Discretizes geometric primitives into time-stepped samples.
//!
//! Every sample advances the head by `speed * step` along the path. While
//! the laser is warming up (`laser_on_delay`) samples are sent as jumps.

use crate::command_buffer::CommandBuffer;
use crate::coords::{Point, Point3};
use crate::correction::Correction;
use crate::curve_approx::CurveInfo;
use crate::curves::circle::Circle;
use crate::curves::line::Line;
use crate::machine_config::TimingConfig;
use std::ops::RangeInclusive;
use tracing::debug;

/// Shorter paths are treated as a single point (mm)
const LENGTH_EPSILON: f64 = 1e-9;

/// Absorbs rounding in `span / (speed * step)` before taking the ceiling
const COUNT_SLACK: f64 = 1e-9;

/// Number of samples needed to cover `span` at `speed`.
///
/// `None` when the path is too short or the speed unusable.
pub fn step_count(span: f64, speed: f64, step: f64) -> Option<u64>
{
    if !(span > LENGTH_EPSILON && span.is_finite()) || !(speed > 0.0 && speed.is_finite()) {
        return None;
    }
    let steps = span / (speed * step);
    if !steps.is_finite() {
        return None;
    }
    Some((steps - COUNT_SLACK).ceil().max(1.0) as u64)
}

/// Number of concentric rings filled for a rectangle `height` high.
pub fn ring_count(height: f64, row_interval: f64) -> Option<u64>
{
    if !(height > LENGTH_EPSILON && height.is_finite())
        || !(row_interval > 0.0 && row_interval.is_finite())
    {
        return None;
    }
    let rows = height / row_interval;
    Some((rows / 4.0 - COUNT_SLACK).ceil().max(1.0) as u64)
}

pub struct TrajectoryGenerator
{
    timing: TimingConfig,
    correction: Box<dyn Correction>
}

impl TrajectoryGenerator
{
    pub fn new(timing: TimingConfig, correction: Box<dyn Correction>) -> TrajectoryGenerator
    {
        TrajectoryGenerator{timing, correction}
    }

    pub fn timing(&self) -> &TimingConfig
    {
        &self.timing
    }

    /// Straight line from `from` to `to` at `speed` mm/s.
    pub fn generate_line(&self, buf: &mut CommandBuffer, speed: f64, laser_on: bool,
                         from: Point3, to: Point3)
    {
        debug!("Line {} to {} at {} mm/s", from, to, speed);
        buf.begin_sequence();
        self.write_segment(buf, speed, laser_on, from, to);
        buf.end_sequence();
    }

    /// Full circle around `center` through `point`, marked at height `z`.
    pub fn generate_circle(&self, buf: &mut CommandBuffer, center: Point, point: Point,
                           z: f64, speed: f64)
    {
        let circle = Circle::through(center, point, z);
        buf.begin_sequence();
        match step_count(circle.length(), speed, self.timing.step()) {
            Some(count) => {
                debug!("Circle r={} mm, {} samples", circle.radius(), count + 1);
                self.trace(buf, &circle, speed, 0..=count, true);
            }
            None => self.emit(buf, Point3::new(center.x, center.y, z), false)
        }
        buf.end_sequence();
    }

    /// Fills the rectangle centered on `center` with `corner` as one of its
    /// corners, sweeping concentric rings inward `row_interval` apart.
    ///
    /// Z is ramped across the rectangle from the mirror of `corner.z` to
    /// `corner.z`.
    pub fn generate_rectangle(&self, buf: &mut CommandBuffer, center: Point3, corner: Point3,
                              speed: f64, row_interval: f64)
    {
        let half = Point3::new((corner.x - center.x).abs(),
                               (corner.y - center.y).abs(),
                               corner.z - center.z);
        let start = center - half;
        let far = center + half;
        let height = far.y - start.y;

        buf.begin_sequence();
        let rings = match ring_count(height, row_interval) {
            Some(rings) => rings,
            None => {
                self.emit(buf, start, false);
                buf.end_sequence();
                return;
            }
        };
        debug!("Rectangle {} to {}, {} rings", start, far, rings);

        let jump_speed = self.timing.jump_speed;
        // Settle for two polygon delays after every side and every step inward
        let settle_us = 2.0 * self.timing.polygon_delay_us;
        self.write_segment(buf, jump_speed, false, Point3::origin(), start);
        self.hold(buf, start, self.timing.jump_delay_us);

        let ring_step = (far - start) * (row_interval / height);
        for i in 0..rings {
            let near = start + ring_step * i as f64;
            let opposite = far - ring_step * i as f64;
            let corners = [
                near,
                Point3::new(near.x, opposite.y, near.z),
                opposite,
                Point3::new(opposite.x, near.y, opposite.z),
            ];
            for (k, from) in corners.iter().enumerate() {
                let to = corners[(k + 1) % corners.len()];
                self.write_segment(buf, speed, true, *from, to);
                self.hold(buf, to, settle_us);
            }
            let next = start + ring_step * (i + 1) as f64;
            self.write_segment(buf, jump_speed, false, near, next);
            self.hold(buf, next, settle_us);
        }
        buf.end_sequence();
    }

    /// Samples one segment, without sequence markers.
    fn write_segment(&self, buf: &mut CommandBuffer, speed: f64, laser_on: bool,
                     from: Point3, to: Point3)
    {
        let line = Line::new(from, to);
        match step_count(line.length(), speed, self.timing.step()) {
            Some(count) => self.trace(buf, &line, speed, 1..=count, laser_on),
            None => self.emit(buf, from, false)
        }
    }

    fn trace(&self, buf: &mut CommandBuffer, curve: &dyn CurveInfo, speed: f64,
             steps: RangeInclusive<u64>, laser_on: bool)
    {
        let step = self.timing.step();
        for i in steps {
            let elapsed_us = i as f64 * self.timing.step_us;
            let fire = laser_on && elapsed_us >= self.timing.laser_on_delay_us;
            self.emit(buf, curve.value(i as f64 * speed * step), fire);
        }
    }

    /// Keeps the head still at `at` with the laser off for `delay_us`.
    fn hold(&self, buf: &mut CommandBuffer, at: Point3, delay_us: f64)
    {
        let samples = (delay_us / self.timing.step_us).max(0.0) as u64;
        let c = self.correction.codes(at);
        for _ in 0..samples {
            buf.append_jump_sample(c.x, c.y, c.z, 0, 0);
        }
    }

    fn emit(&self, buf: &mut CommandBuffer, p: Point3, fire: bool)
    {
        let c = self.correction.codes(p);
        if fire {
            buf.append_process_sample(c.x, c.y, c.z, 0, 0);
        } else {
            buf.append_jump_sample(c.x, c.y, c.z, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count() {
        assert_eq!(step_count(1.0, 1000.0, 1e-5), Some(100));
        assert_eq!(step_count(1.005, 1000.0, 1e-5), Some(101));
        assert_eq!(step_count(1e-6, 1000.0, 1e-5), Some(1));
    }

    #[test]
    fn test_step_count_degenerate() {
        assert_eq!(step_count(0.0, 1000.0, 1e-5), None);
        assert_eq!(step_count(1.0, 0.0, 1e-5), None);
        assert_eq!(step_count(1.0, -5.0, 1e-5), None);
        assert_eq!(step_count(f64::NAN, 10.0, 1e-5), None);
        assert_eq!(step_count(1.0, f64::INFINITY, 1e-5), None);
        assert_eq!(step_count(1.0, 1e-300, 1e-300), None);
    }

    #[test]
    fn test_ring_count() {
        assert_eq!(ring_count(4.0, 1.0), Some(1));
        assert_eq!(ring_count(10.0, 1.0), Some(3));
        assert_eq!(ring_count(0.5, 1.0), Some(1));
        assert_eq!(ring_count(0.0, 1.0), None);
        assert_eq!(ring_count(4.0, 0.0), None);
        assert_eq!(ring_count(4.0, -1.0), None);
    }
}
