//! Composition root of the streaming core.
//!
//! An `Engraver` owns the one slot pool, command buffer and link worker of
//! the process. The link is started lazily by the first slot flush.

use crate::command_buffer::CommandBuffer;
use crate::coords::{Point, Point3};
use crate::correction::{Correction, GalvoCorrection};
use crate::error::Result;
use crate::link_worker::{LinkState, LinkWorker};
use crate::machine_config::MachineConfig;
use crate::slot_pool::SlotPool;
use crate::trajectory::TrajectoryGenerator;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

pub struct Engraver
{
    buffer: Mutex<CommandBuffer>,
    pool: Arc<SlotPool>,
    worker: Arc<LinkWorker>,
    generator: TrajectoryGenerator
}

impl Engraver
{
    pub fn new(config: &MachineConfig) -> Result<Engraver>
    {
        let correction = GalvoCorrection::new(&config.correction);
        Engraver::with_correction(config, Box::new(correction))
    }

    /// Uses `correction` in place of the configured galvo calibration.
    pub fn with_correction(config: &MachineConfig, correction: Box<dyn Correction>)
                           -> Result<Engraver>
    {
        config.validate()?;
        let pool = Arc::new(SlotPool::new(&config.buffer));
        let worker = Arc::new(LinkWorker::new(Arc::clone(&pool), config.link.clone()));

        let mut buffer = CommandBuffer::new(Arc::clone(&pool), &config.laser);
        let starter = Arc::clone(&worker);
        buffer.set_on_first_flush(Box::new(move || {
            if let Err(e) = starter.ensure_running() {
                error!("Failed to start link worker: {}", e);
            }
        }));

        Ok(Engraver {
            buffer: Mutex::new(buffer),
            pool,
            worker,
            generator: TrajectoryGenerator::new(config.timing.clone(), correction)
        })
    }

    pub fn generate_line(&self, speed: f64, laser_on: bool, from: Point3, to: Point3)
    {
        let mut buffer = self.buffer.lock();
        self.generator.generate_line(&mut buffer, speed, laser_on, from, to);
    }

    pub fn generate_circle(&self, center: Point, point: Point, z: f64, speed: f64)
    {
        let mut buffer = self.buffer.lock();
        self.generator.generate_circle(&mut buffer, center, point, z, speed);
    }

    pub fn generate_rectangle(&self, center: Point3, corner: Point3, speed: f64,
                              row_interval: f64)
    {
        let mut buffer = self.buffer.lock();
        self.generator.generate_rectangle(&mut buffer, center, corner, speed, row_interval);
    }

    pub fn set_frequency(&self, freq_hz: u32) -> Result<()>
    {
        self.buffer.lock().set_frequency(freq_hz)
    }

    pub fn set_power(&self, percent: f64)
    {
        self.buffer.lock().set_power(percent);
    }

    /// Queues whatever has been written since the last flush.
    pub fn flush(&self)
    {
        self.buffer.lock().flush();
    }

    /// Waits until the link has sent every queued slot.
    pub fn wait_drained(&self, timeout: Duration) -> bool
    {
        self.pool.wait_drained(timeout)
    }

    pub fn link_state(&self) -> LinkState
    {
        self.worker.state()
    }

    pub fn slots_sent(&self) -> u64
    {
        self.worker.slots_sent()
    }

    pub fn pool(&self) -> &Arc<SlotPool>
    {
        &self.pool
    }

    /// Stops the link worker and joins its thread.
    pub fn shutdown(&self)
    {
        self.worker.join();
    }
}
