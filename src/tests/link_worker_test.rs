use super::super::{
    command_buffer::CommandBuffer,
    link_worker::{LinkState, LinkWorker},
    machine_config::{LaserConfig, LinkConfig},
    record::{Record, RECORD_SIZE}
};
use super::slot_capture::test_pool;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const SLOT_SIZE: usize = 64;

fn link_config(port: u16) -> LinkConfig {
    LinkConfig {
        host: String::from("127.0.0.1"),
        port,
        connect_timeout_ms: 500,
        retry_delay_ms: 20,
        read_timeout_ms: 50,
        ack_size: 128
    }
}

/// Acknowledges and reads `slots` slots on one accepted connection.
fn serve_slots(stream: &mut TcpStream, slots: usize) -> Vec<Vec<u8>> {
    let mut received = Vec::new();
    for _ in 0..slots {
        stream.write_all(&[0xA5; 128]).unwrap();
        let mut payload = vec![0u8; SLOT_SIZE];
        stream.read_exact(&mut payload).unwrap();
        received.push(payload);
    }
    received
}

fn fake_device(listener: TcpListener, slots: usize) -> JoinHandle<Vec<Vec<u8>>> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        serve_slots(&mut stream, slots)
    })
}

fn wait_for_state(worker: &LinkWorker, state: LinkState) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if worker.state() == state {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_slots_delivered_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let device = fake_device(listener, 3);

    let pool = test_pool(SLOT_SIZE, 2);
    let worker = Arc::new(LinkWorker::new(Arc::clone(&pool), link_config(port)));
    let mut buf = CommandBuffer::new(Arc::clone(&pool), &LaserConfig::default());
    let starter = Arc::clone(&worker);
    buf.set_on_first_flush(Box::new(move || starter.ensure_running().unwrap()));
    assert!(!worker.is_running());

    for seq in 1..=3u16 {
        buf.append_jump_sample(seq, 0, 0, 0, 0);
        buf.flush();
    }
    assert!(worker.is_running());

    let received = device.join().unwrap();
    assert_eq!(received.len(), 3);
    for (n, payload) in received.iter().enumerate() {
        assert_eq!(Record::decode(payload).xyz().0, n as u16 + 1);
        assert!(payload[RECORD_SIZE..].iter().all(|b| *b == 0));
    }
    assert!(pool.wait_drained(Duration::from_secs(2)));
    assert_eq!(worker.slots_sent(), 3);

    worker.join();
    assert_eq!(worker.state(), LinkState::Stopped);
    assert!(!worker.is_running());
}

#[test]
fn test_reconnects_after_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let device = thread::spawn(move || {
        // First connection is closed before any acknowledgement
        let (first, _) = listener.accept().unwrap();
        drop(first);
        let (mut stream, _) = listener.accept().unwrap();
        serve_slots(&mut stream, 1)
    });

    let pool = test_pool(SLOT_SIZE, 2);
    let worker = LinkWorker::new(Arc::clone(&pool), link_config(port));
    worker.ensure_running().unwrap();
    let mut buf = CommandBuffer::new(Arc::clone(&pool), &LaserConfig::default());
    buf.append_process_sample(42, 43, 44, 0, 0);
    buf.flush();

    let received = device.join().unwrap();
    assert_eq!(Record::decode(&received[0]).xyz(), (42, 43, 44));
    assert!(pool.wait_drained(Duration::from_secs(2)));
    assert_eq!(worker.slots_sent(), 1);
    worker.join();
}

#[test]
fn test_retries_without_device() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let pool = test_pool(SLOT_SIZE, 2);
    let worker = LinkWorker::new(Arc::clone(&pool), link_config(port));
    assert_eq!(worker.state(), LinkState::Stopped);

    worker.ensure_running().unwrap();
    worker.ensure_running().unwrap();
    thread::sleep(Duration::from_millis(100));
    assert!(worker.is_running());
    assert_eq!(worker.state(), LinkState::Connecting);
    assert_eq!(worker.slots_sent(), 0);

    worker.join();
    assert_eq!(worker.state(), LinkState::Stopped);
    assert!(!worker.is_running());
}

#[test]
fn test_stop_while_waiting_for_ack() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    // Silent device: accepts and never acknowledges
    let device = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
        rest
    });

    let pool = test_pool(SLOT_SIZE, 2);
    let worker = LinkWorker::new(Arc::clone(&pool), link_config(port));
    worker.ensure_running().unwrap();
    assert!(wait_for_state(&worker, LinkState::Connected));

    let start = Instant::now();
    worker.join();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(worker.state(), LinkState::Stopped);
    // Nothing was sent without an acknowledgement
    assert!(device.join().unwrap().is_empty());
}

#[test]
fn test_restart_after_join() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let pool = test_pool(SLOT_SIZE, 2);
    let worker = LinkWorker::new(Arc::clone(&pool), link_config(port));

    worker.ensure_running().unwrap();
    let (first, _) = listener.accept().unwrap();
    worker.join();
    drop(first);

    let device = fake_device(listener, 1);
    worker.ensure_running().unwrap();
    let mut buf = CommandBuffer::new(Arc::clone(&pool), &LaserConfig::default());
    buf.append_jump_sample(9, 0, 0, 0, 0);
    buf.flush();
    assert_eq!(Record::decode(&device.join().unwrap()[0]).xyz().0, 9);
    worker.join();
}
