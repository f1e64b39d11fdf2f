//! Producer side of the command stream.
//!
//! Records are appended to the active slot. When a record no longer fits,
//! the slot is zero padded, queued for the link and replaced by a free one,
//! blocking while the link still holds every other slot.

use crate::error::Result;
use crate::laser_params::{frequency_count, PowerCalibration};
use crate::machine_config::LaserConfig;
use crate::record::{Record, Tag, NEUTRAL_CODE, RECORD_SIZE};
use crate::slot_pool::{Slot, SlotPool};
use std::sync::Arc;
use tracing::{debug, info};

/// Number of idle preambles sent ahead of every sequence
const PREAMBLE_REPEAT: usize = 2;

pub type FirstFlushHook = Box<dyn FnOnce() + Send>;

pub struct CommandBuffer
{
    pool: Arc<SlotPool>,
    active: Option<Slot>,
    cursor: usize,
    capacity: usize,
    power: PowerCalibration,
    frequency_clock: u32,
    on_first_flush: Option<FirstFlushHook>
}

impl CommandBuffer
{
    pub fn new(pool: Arc<SlotPool>, laser: &LaserConfig) -> CommandBuffer
    {
        let active = pool.acquire_free();
        CommandBuffer {
            capacity: pool.slot_capacity(),
            pool,
            active: Some(active),
            cursor: 0,
            power: PowerCalibration::new(laser),
            frequency_clock: laser.frequency_clock,
            on_first_flush: None
        }
    }

    /// Runs `hook` once, on the first flush of this buffer.
    pub fn set_on_first_flush(&mut self, hook: FirstFlushHook)
    {
        self.on_first_flush = Some(hook);
    }

    pub fn pool(&self) -> &Arc<SlotPool>
    {
        &self.pool
    }

    /// Write offset into the active slot
    pub fn cursor(&self) -> usize
    {
        self.cursor
    }

    pub fn append_process_sample(&mut self, x: u16, y: u16, z: u16, a: u16, b: u16)
    {
        self.push_record(&Record::sample(Tag::Process, x, y, z, a, b));
    }

    pub fn append_jump_sample(&mut self, x: u16, y: u16, z: u16, a: u16, b: u16)
    {
        self.push_record(&Record::sample(Tag::Jump, x, y, z, a, b));
    }

    /// Parks the head at mid-scale with the laser off, then opens a sequence.
    pub fn begin_sequence(&mut self)
    {
        self.idle_preambles();
        self.push_record(&Record::marker(Tag::Begin));
    }

    pub fn end_sequence(&mut self)
    {
        self.push_record(&Record::marker(Tag::End));
    }

    /// Sets the laser repetition rate. Nothing is written on error.
    ///
    /// The head is parked first, the bracket starts a fresh slot.
    pub fn set_frequency(&mut self, freq_hz: u32) -> Result<()>
    {
        let count = frequency_count(self.frequency_clock, freq_hz)?;
        self.idle_preambles();
        self.push_record(&Record::frequency_start());
        self.push_record(&Record::frequency_count(count));
        self.push_record(&Record::frequency_end());
        debug!("Frequency {} Hz, count {}", freq_hz, count);
        Ok(())
    }

    /// Sets the laser power in percent and flushes so it takes effect.
    pub fn set_power(&mut self, percent: f64)
    {
        let record = Record::power(self.power.code(percent), self.power.aux_word());
        for _ in 0..self.power.repeat() {
            self.push_record(&record);
        }
        debug!("Power {}% -> code {}", percent, record.words[0]);
        self.flush();
    }

    /// Pads the active slot with zeros and queues it for the link.
    pub fn flush(&mut self)
    {
        let pool = &self.pool;
        let mut slot = self.active.take().unwrap_or_else(|| pool.acquire_free());
        slot.bytes_mut()[self.cursor..].fill(0);
        if let Some(hook) = self.on_first_flush.take() {
            info!("First slot filled, starting link");
            hook();
        }
        debug!("Slot {} ready, {} of {} bytes used", slot.index(), self.cursor, self.capacity);
        self.pool.mark_ready(slot);
        self.active = Some(self.pool.acquire_free());
        self.cursor = 0;
    }

    /// Two idle preambles, each closed by a flush.
    fn idle_preambles(&mut self)
    {
        for _ in 0..PREAMBLE_REPEAT {
            self.push_record(&Record::marker(Tag::Begin));
            self.append_jump_sample(NEUTRAL_CODE, NEUTRAL_CODE, NEUTRAL_CODE,
                                    NEUTRAL_CODE, NEUTRAL_CODE);
            self.push_record(&Record::marker(Tag::End));
            self.flush();
        }
    }

    fn push_record(&mut self, record: &Record)
    {
        if self.cursor + RECORD_SIZE > self.capacity {
            self.flush();
        }
        let pool = &self.pool;
        let slot = self.active.get_or_insert_with(|| pool.acquire_free());
        record.encode(&mut slot.bytes_mut()[self.cursor..]);
        self.cursor += RECORD_SIZE;
    }
}
