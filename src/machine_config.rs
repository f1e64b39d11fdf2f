use crate::error::{Error, Result};
use crate::record::RECORD_SIZE;
use serde::Deserialize;
use std::time::Duration;

/// Network link to the marking head.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkConfig
{
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub retry_delay_ms: u64,
    /// Stall timeout while collecting an acknowledgement
    pub read_timeout_ms: u64,
    /// Bytes of acknowledgement expected before each slot is sent
    pub ack_size: usize
}

impl Default for LinkConfig
{
    fn default() -> LinkConfig
    {
        LinkConfig {
            host: String::from("192.168.1.10"),
            port: 7,
            connect_timeout_ms: 1000,
            retry_delay_ms: 100,
            read_timeout_ms: 1000,
            ack_size: 128
        }
    }
}

impl LinkConfig
{
    pub fn connect_timeout(&self) -> Duration
    {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration
    {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn read_timeout(&self) -> Duration
    {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BufferConfig
{
    /// Bytes per slot, a multiple of the record size
    pub slot_capacity: usize,
    pub slot_count: usize,
    /// Upper bound on a single condition wait in either acquire path
    pub queue_poll_ms: u64
}

impl Default for BufferConfig
{
    fn default() -> BufferConfig
    {
        BufferConfig {
            slot_capacity: 1_600_000,
            slot_count: 2,
            queue_poll_ms: 10
        }
    }
}

impl BufferConfig
{
    pub fn queue_poll(&self) -> Duration
    {
        Duration::from_millis(self.queue_poll_ms)
    }
}

/// Timing of the sample clock and the laser/galvo settle delays.
///
/// Delays are in microseconds, speeds in mm/s.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingConfig
{
    pub step_us: f64,
    pub laser_on_delay_us: f64,
    pub laser_off_delay_us: f64,
    pub jump_speed: f64,
    pub jump_delay_us: f64,
    pub polygon_delay_us: f64
}

impl Default for TimingConfig
{
    fn default() -> TimingConfig
    {
        TimingConfig {
            step_us: 10.0,
            laser_on_delay_us: 100.0,
            laser_off_delay_us: 100.0,
            jump_speed: 500.0,
            jump_delay_us: 150.0,
            polygon_delay_us: 450.0
        }
    }
}

impl TimingConfig
{
    /// Sample period in seconds
    pub fn step(&self) -> f64
    {
        self.step_us * 1e-6
    }
}

/// Calibration of the head, mapping millimeters to actuator codes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorrectionConfig
{
    pub x_gain: f64,
    pub y_gain: f64,
    pub z_gain: f64,
    /// X shear per millimeter of Z
    pub x_z_coeff: f64,
    /// Y shear per millimeter of Z
    pub y_z_coeff: f64,
    pub rotation_deg: f64,
    pub z_offset: f64,
    pub mid_scale: f64
}

impl Default for CorrectionConfig
{
    fn default() -> CorrectionConfig
    {
        CorrectionConfig {
            x_gain: 776.991,
            y_gain: 778.062,
            z_gain: 830.0,
            x_z_coeff: 0.13095395,
            y_z_coeff: 0.1702982,
            rotation_deg: 44.8,
            z_offset: 4.5,
            mid_scale: 32768.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaserConfig
{
    /// Percent to device percent, lowest order first
    pub power_coefficients: Vec<f64>,
    pub power_repeat: usize,
    pub power_aux_word: u16,
    /// Base clock the pulse count is derived from
    pub frequency_clock: u32
}

impl Default for LaserConfig
{
    fn default() -> LaserConfig
    {
        LaserConfig {
            power_coefficients: vec![5.5366, 2.67805, -0.107836, 0.00241519,
                                     -0.0000248153, 0.0000000964112],
            power_repeat: 10,
            power_aux_word: 11451,
            frequency_clock: 50000
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineConfig
{
    pub link: LinkConfig,
    pub buffer: BufferConfig,
    pub timing: TimingConfig,
    pub correction: CorrectionConfig,
    pub laser: LaserConfig
}

impl MachineConfig
{
    pub fn validate(&self) -> Result<()>
    {
        if self.buffer.slot_count < 2 {
            return Err(Error::Config(format!(
                "slotCount must be at least 2, got {}", self.buffer.slot_count)));
        }
        if self.buffer.slot_capacity == 0 || self.buffer.slot_capacity % RECORD_SIZE != 0 {
            return Err(Error::Config(format!(
                "slotCapacity must be a positive multiple of {}, got {}",
                RECORD_SIZE, self.buffer.slot_capacity)));
        }
        if self.buffer.queue_poll_ms == 0 {
            return Err(Error::Config(String::from("queuePollMs must be positive")));
        }
        if !(self.timing.step_us > 0.0 && self.timing.step_us.is_finite()) {
            return Err(Error::Config(format!(
                "stepUs must be positive, got {}", self.timing.step_us)));
        }
        if !(self.timing.jump_speed > 0.0) {
            return Err(Error::Config(format!(
                "jumpSpeed must be positive, got {}", self.timing.jump_speed)));
        }
        if self.laser.frequency_clock == 0 {
            return Err(Error::Config(String::from("frequencyClock must be positive")));
        }
        if self.link.host.is_empty() {
            return Err(Error::Config(String::from("link host is empty")));
        }
        if self.link.connect_timeout_ms == 0 || self.link.read_timeout_ms == 0 {
            return Err(Error::Config(String::from("link timeouts must be positive")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MachineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer.slot_capacity % RECORD_SIZE, 0);
        assert_eq!(config.link.port, 7);
        assert_eq!(config.timing.step(), 10.0 * 1e-6);
    }

    #[test]
    fn test_validate_rejects_single_slot() {
        let mut config = MachineConfig::default();
        config.buffer.slot_count = 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unaligned_capacity() {
        let mut config = MachineConfig::default();
        config.buffer.slot_capacity = 100;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        let mut config = MachineConfig::default();
        config.timing.step_us = 0.0;
        assert!(config.validate().is_err());
        config.timing.step_us = f64::NAN;
        assert!(config.validate().is_err());
    }
}
