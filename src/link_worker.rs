//! Background link to the marking head.
//!
//! The worker connects to the device, waits for an acknowledgement, sends
//! the oldest ready slot and returns it to the free queue, forever. Link
//! failures are retried with a fixed delay and never reach the producer.

use crate::error::{Error, Result};
use crate::machine_config::LinkConfig;
use crate::slot_pool::SlotPool;
use parking_lot::Mutex;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

/// Connect failures between two warnings
const RETRY_LOG_INTERVAL: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkState
{
    Stopped = 0,
    Connecting = 1,
    Connected = 2
}

impl LinkState
{
    fn from_u8(v: u8) -> LinkState
    {
        match v {
            1 => LinkState::Connecting,
            2 => LinkState::Connected,
            _ => LinkState::Stopped
        }
    }
}

struct Shared
{
    stop: AtomicBool,
    running: AtomicBool,
    state: AtomicU8,
    slots_sent: AtomicU64
}

impl Shared
{
    fn stop_requested(&self) -> bool
    {
        self.stop.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: LinkState)
    {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

pub struct LinkWorker
{
    pool: Arc<SlotPool>,
    config: LinkConfig,
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>
}

impl LinkWorker
{
    pub fn new(pool: Arc<SlotPool>, config: LinkConfig) -> LinkWorker
    {
        LinkWorker {
            pool,
            config,
            shared: Arc::new(Shared {
                stop: AtomicBool::new(false),
                running: AtomicBool::new(false),
                state: AtomicU8::new(LinkState::Stopped as u8),
                slots_sent: AtomicU64::new(0)
            }),
            thread: Mutex::new(None)
        }
    }

    /// Starts the worker thread unless it is already running.
    pub fn ensure_running(&self) -> Result<()>
    {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.stop.store(false, Ordering::SeqCst);
        self.shared.set_state(LinkState::Connecting);

        let session = LinkLoop {
            pool: Arc::clone(&self.pool),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared)
        };
        let spawned = thread::Builder::new()
            .name("link-worker".to_string())
            .spawn(move || session.run());
        match spawned {
            Ok(handle) => {
                // A previous thread has already left its loop, reap it.
                if let Some(old) = self.thread.lock().replace(handle) {
                    reap(old);
                }
                Ok(())
            }
            Err(e) => {
                self.shared.set_state(LinkState::Stopped);
                self.shared.running.store(false, Ordering::SeqCst);
                Err(Error::ThreadSpawn(e))
            }
        }
    }

    /// Asks the loop to exit at its next check point.
    pub fn stop(&self)
    {
        self.shared.stop.store(true, Ordering::SeqCst);
    }

    /// Stops the loop and waits for the thread to exit.
    pub fn join(&self)
    {
        self.stop();
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            reap(handle);
        }
    }

    pub fn state(&self) -> LinkState
    {
        LinkState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool
    {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Slots delivered to the device since creation
    pub fn slots_sent(&self) -> u64
    {
        self.shared.slots_sent.load(Ordering::SeqCst)
    }
}

/// Joins a worker thread. `false` if it panicked.
fn reap(handle: JoinHandle<()>) -> bool
{
    let name = handle.thread().name().unwrap_or("link-worker").to_string();
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            error!("Thread {} panicked", name);
            false
        }
    }
}

impl Drop for LinkWorker
{
    fn drop(&mut self)
    {
        self.join();
    }
}

struct LinkLoop
{
    pool: Arc<SlotPool>,
    config: LinkConfig,
    shared: Arc<Shared>
}

impl LinkLoop
{
    fn run(self)
    {
        info!("Link worker started, device {}:{}", self.config.host, self.config.port);
        while !self.shared.stop_requested() {
            self.shared.set_state(LinkState::Connecting);
            let mut stream = match self.connect() {
                Some(stream) => stream,
                None => break
            };
            self.shared.set_state(LinkState::Connected);
            info!("Connected to {}:{}", self.config.host, self.config.port);

            match self.serve(&mut stream) {
                Ok(()) => debug!("Link session closed"),
                Err(e) => warn!("Link to {}:{} lost: {}", self.config.host, self.config.port, e)
            }
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.shared.set_state(LinkState::Stopped);
        self.shared.running.store(false, Ordering::SeqCst);
        info!("Link worker stopped");
    }

    /// Retries until connected. `None` if stopped first.
    fn connect(&self) -> Option<TcpStream>
    {
        let mut attempts: u64 = 0;
        while !self.shared.stop_requested() {
            match self.try_connect() {
                Ok(stream) => {
                    if attempts > 0 {
                        info!("Link up after {} failed attempts", attempts);
                    }
                    return Some(stream);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts % RETRY_LOG_INTERVAL == 1 {
                        warn!("TCP connect to {}:{} failed: {}",
                              self.config.host, self.config.port, e);
                    } else {
                        debug!("TCP connect attempt {} failed: {}", attempts, e);
                    }
                    thread::sleep(self.config.retry_delay());
                }
            }
        }
        None
    }

    fn try_connect(&self) -> io::Result<TcpStream>
    {
        let addrs = (self.config.host.as_str(), self.config.port).to_socket_addrs()?;
        let mut last_err = io::Error::new(ErrorKind::AddrNotAvailable, "host did not resolve");
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout()) {
                Ok(stream) => {
                    enable_keepalive(&stream)?;
                    stream.set_read_timeout(Some(self.config.read_timeout()))?;
                    return Ok(stream);
                }
                Err(e) => last_err = e
            }
        }
        Err(last_err)
    }

    /// One connected session. `Ok` when stopped, `Err` when the link broke.
    fn serve(&self, stream: &mut TcpStream) -> io::Result<()>
    {
        let mut ack = vec![0u8; self.config.ack_size];
        let poll = self.pool.poll_interval();
        while !self.shared.stop_requested() {
            let received = match self.read_ack(stream, &mut ack)? {
                Some(n) => n,
                None => return Ok(())
            };
            trace!("Acknowledgement of {} bytes", received);

            let slot = loop {
                if self.shared.stop_requested() {
                    return Ok(());
                }
                if let Some(slot) = self.pool.try_acquire_ready(poll) {
                    break slot;
                }
            };
            let index = slot.index();
            let sent = stream.write_all(slot.as_bytes()).and_then(|()| stream.flush());
            if sent.is_ok() {
                let total = self.shared.slots_sent.fetch_add(1, Ordering::SeqCst) + 1;
                debug!("Slot {} sent ({} total)", index, total);
            }
            // Released even when the write failed, the data is dropped
            self.pool.release(slot);
            sent?;
        }
        Ok(())
    }

    /// Collects up to `buf.len()` acknowledgement bytes.
    ///
    /// Waits indefinitely for the first byte, then stops at the first
    /// stalled read. `None` if stopped while waiting.
    fn read_ack(&self, stream: &mut TcpStream, buf: &mut [u8]) -> io::Result<Option<usize>>
    {
        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(ErrorKind::UnexpectedEof,
                                              "device closed the connection"));
                }
                Ok(n) => filled += n,
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if filled > 0 {
                        break;
                    }
                    if self.shared.stop_requested() {
                        return Ok(None);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e)
            }
        }
        Ok(Some(filled))
    }
}

#[cfg(unix)]
fn enable_keepalive(stream: &TcpStream) -> io::Result<()>
{
    use nix::sys::socket::{setsockopt, sockopt};
    setsockopt(stream, sockopt::KeepAlive, &true).map_err(io::Error::from)
}

#[cfg(not(unix))]
fn enable_keepalive(_stream: &TcpStream) -> io::Result<()>
{
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reap_reports_panic() {
        let handle: JoinHandle<()> = thread::Builder::new()
            .name("link-worker".to_string())
            .spawn(|| panic!("link lost"))
            .unwrap();
        assert!(!reap(handle));
        assert!(reap(thread::spawn(|| ())));
    }
}
