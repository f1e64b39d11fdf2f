//! Fixed pool of command slots shared between the producer and the link.
//!
//! A slot is always in exactly one place: the free queue, the ready queue,
//! or out on loan to the writer or the link. Lending moves the slot's bytes
//! out of the pool, so a slot can never be written and read at once.

use crate::machine_config::BufferConfig;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::warn;

/// One fixed-capacity slot of serialized records.
#[derive(Debug)]
pub struct Slot
{
    index: usize,
    data: Box<[u8]>
}

impl Slot
{
    pub fn index(&self) -> usize
    {
        self.index
    }

    pub fn as_bytes(&self) -> &[u8]
    {
        &self.data
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8]
    {
        &mut self.data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOwner
{
    Free,
    Ready,
    Writing,
    Reading
}

/// Ownership of every slot at one instant.
#[derive(Debug, Clone)]
pub struct PoolCensus
{
    pub owners: Vec<SlotOwner>,
    /// Free queue, head first
    pub free: Vec<usize>,
    /// Ready queue, oldest first
    pub ready: Vec<usize>
}

impl PoolCensus
{
    pub fn count(&self, owner: SlotOwner) -> usize
    {
        self.owners.iter().filter(|o| **o == owner).count()
    }

    /// Every slot is in exactly one queue or on loan.
    pub fn is_consistent(&self) -> bool
    {
        let mut seen = vec![false; self.owners.len()];
        for (queue, owner) in [(&self.free, SlotOwner::Free), (&self.ready, SlotOwner::Ready)] {
            for &index in queue {
                if index >= seen.len() || seen[index] || self.owners[index] != owner {
                    return false;
                }
                seen[index] = true;
            }
        }
        self.count(SlotOwner::Free) == self.free.len()
            && self.count(SlotOwner::Ready) == self.ready.len()
    }
}

struct PoolState
{
    free: VecDeque<Slot>,
    ready: VecDeque<Slot>,
    owners: Vec<SlotOwner>
}

impl PoolState
{
    fn transfer(&mut self, index: usize, from: SlotOwner, to: SlotOwner)
    {
        if self.owners[index] != from {
            warn!("Slot {} expected {:?} but was {:?}", index, from, self.owners[index]);
        }
        self.owners[index] = to;
    }
}

pub struct SlotPool
{
    state: Mutex<PoolState>,
    free_available: Condvar,
    ready_available: Condvar,
    slot_capacity: usize,
    slot_count: usize,
    poll_interval: Duration
}

impl SlotPool
{
    pub fn new(config: &BufferConfig) -> SlotPool
    {
        let free = (0..config.slot_count)
            .map(|index| Slot {
                index,
                data: vec![0u8; config.slot_capacity].into_boxed_slice()
            })
            .collect();
        SlotPool {
            state: Mutex::new(PoolState {
                free,
                ready: VecDeque::with_capacity(config.slot_count),
                owners: vec![SlotOwner::Free; config.slot_count]
            }),
            free_available: Condvar::new(),
            ready_available: Condvar::new(),
            slot_capacity: config.slot_capacity,
            slot_count: config.slot_count,
            poll_interval: config.queue_poll()
        }
    }

    pub fn slot_capacity(&self) -> usize
    {
        self.slot_capacity
    }

    pub fn slot_count(&self) -> usize
    {
        self.slot_count
    }

    pub fn poll_interval(&self) -> Duration
    {
        self.poll_interval
    }

    /// Takes a slot for writing, blocking until one is free.
    pub fn acquire_free(&self) -> Slot
    {
        let mut state = self.state.lock();
        loop {
            if let Some(slot) = state.free.pop_front() {
                state.transfer(slot.index, SlotOwner::Free, SlotOwner::Writing);
                return slot;
            }
            self.free_available.wait_for(&mut state, self.poll_interval);
        }
    }

    /// Hands a filled slot over to the link.
    pub fn mark_ready(&self, slot: Slot)
    {
        let mut state = self.state.lock();
        if state.ready.len() >= self.slot_count {
            warn!("Ready queue overflow ({} slots queued)", state.ready.len());
        }
        state.transfer(slot.index, SlotOwner::Writing, SlotOwner::Ready);
        state.ready.push_back(slot);
        self.ready_available.notify_one();
    }

    /// Takes the oldest ready slot, blocking until there is one.
    pub fn acquire_ready(&self) -> Slot
    {
        let mut state = self.state.lock();
        loop {
            if let Some(slot) = state.ready.pop_front() {
                state.transfer(slot.index, SlotOwner::Ready, SlotOwner::Reading);
                return slot;
            }
            self.ready_available.wait_for(&mut state, self.poll_interval);
        }
    }

    /// Like `acquire_ready` but gives up after `timeout`.
    pub fn try_acquire_ready(&self, timeout: Duration) -> Option<Slot>
    {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(slot) = state.ready.pop_front() {
                state.transfer(slot.index, SlotOwner::Ready, SlotOwner::Reading);
                return Some(slot);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let wait = (deadline - now).min(self.poll_interval);
            self.ready_available.wait_for(&mut state, wait);
        }
    }

    /// Returns a drained slot to the free queue.
    pub fn release(&self, slot: Slot)
    {
        let mut state = self.state.lock();
        if state.free.len() >= self.slot_count {
            warn!("Free queue overflow ({} slots queued)", state.free.len());
        }
        state.transfer(slot.index, SlotOwner::Reading, SlotOwner::Free);
        state.free.push_back(slot);
        self.free_available.notify_all();
    }

    /// Waits until nothing is queued for or held by the link.
    ///
    /// Returns `false` if that did not happen within `timeout`.
    pub fn wait_drained(&self, timeout: Duration) -> bool
    {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.ready.is_empty() && !state.owners.contains(&SlotOwner::Reading) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let wait = (deadline - now).min(self.poll_interval);
            self.free_available.wait_for(&mut state, wait);
        }
    }

    pub fn census(&self) -> PoolCensus
    {
        let state = self.state.lock();
        PoolCensus {
            owners: state.owners.clone(),
            free: state.free.iter().map(|s| s.index).collect(),
            ready: state.ready.iter().map(|s| s.index).collect()
        }
    }
}
