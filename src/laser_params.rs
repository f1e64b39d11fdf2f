use crate::error::{Error, Result};
use crate::machine_config::LaserConfig;
use crate::polynom::Polynom;

/// Maps requested power in percent to the 16-bit device code.
///
/// The source is not linear, the calibration curve gives the percent the
/// device must be driven with to deliver the requested output.
#[derive(Debug, Clone)]
pub struct PowerCalibration
{
    curve: Polynom<f64>,
    repeat: usize,
    aux_word: u16
}

impl PowerCalibration
{
    pub fn new(config: &LaserConfig) -> PowerCalibration
    {
        PowerCalibration {
            curve: Polynom::from(config.power_coefficients.as_slice()),
            repeat: config.power_repeat,
            aux_word: config.power_aux_word
        }
    }

    pub fn code(&self, percent: f64) -> u16
    {
        let percent = if percent.is_nan() {
            0.0
        } else {
            num::clamp(percent, 0.0, 100.0)
        };
        let drive = self.curve.value(percent);
        num::clamp(drive * 65535.0 / 100.0, 0.0, 65535.0) as u16
    }

    /// Number of identical power records sent per change
    pub fn repeat(&self) -> usize
    {
        self.repeat
    }

    pub fn aux_word(&self) -> u16
    {
        self.aux_word
    }
}

/// Pulse count for a laser repetition rate.
pub fn frequency_count(clock: u32, freq_hz: u32) -> Result<u32>
{
    if freq_hz == 0 {
        return Err(Error::InvalidFrequency(freq_hz));
    }
    Ok(clock / freq_hz)
}
