// End-to-end tests against a fake simulator on the loopback interface
use std::net::UdpSocket;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use xplane_rref::{ClientConfig, DatarefChange, UdpSession, UpdateDispatcher};

fn fake_simulator() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    socket
}

fn client_config(sim: &UdpSocket, timeout: Duration) -> ClientConfig {
    let sim_addr = sim.local_addr().unwrap();
    ClientConfig::new()
        .with_simulator("127.0.0.1", sim_addr.port())
        .with_local("127.0.0.1", 0)
        .with_receive_timeout(timeout)
}

fn response(records: &[(i32, f32)]) -> Vec<u8> {
    let mut packet = b"RREF,".to_vec();
    for (index, value) in records {
        packet.extend_from_slice(&index.to_le_bytes());
        packet.extend_from_slice(&value.to_le_bytes());
    }
    packet
}

#[test]
fn subscribes_and_reports_changes() {
    let sim = fake_simulator();
    let config = client_config(&sim, Duration::from_millis(200));

    let mut session = UdpSession::open(&config).unwrap();
    let client_addr = session.local_addr().unwrap();
    let stop = session.stop_signal();

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let mut dispatcher = UpdateDispatcher::new(&config);
        let signal = session.stop_signal();
        let result = dispatcher.run(&mut session, &signal, move |change| {
            let _ = tx.send(change.clone());
        });
        session.close();
        result
    });

    // The first loop iteration sends the whole batch
    let mut buf = [0u8; 1024];
    let mut names = Vec::new();
    for _ in 0..111 {
        let (len, from) = sim.recv_from(&mut buf).unwrap();
        assert_eq!(len, 409);
        assert_eq!(from, client_addr);
        assert_eq!(&buf[..5], b"RREF\0");
        let field = &buf[13..len];
        let end = field.iter().position(|&b| b == 0).unwrap();
        names.push(String::from_utf8(field[..end].to_vec()).unwrap());
    }
    assert_eq!(names[0], "sim/cockpit2/switches/generic_lights_switch[0]");
    assert_eq!(names[110], "sim/flightmodel2/gear/deploy_ratio[9]");

    sim.send_to(&response(&[(12, 1.0), (12, 1.0), (203, 0.75), (500, 2.0)]), client_addr)
        .unwrap();

    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(first, DatarefChange::Light { index: 12, on: true, .. }));
    assert!(matches!(second, DatarefChange::Gear { gear: 3, .. }));
    assert_eq!(second.gear_percent(), Some(75.0));

    stop.stop();
    let stats = worker.join().unwrap().unwrap();
    assert_eq!(stats.changes, 2);
    assert_eq!(stats.updates, 4);
    assert!(stats.requests_sent >= 111);
}

#[test]
fn stop_takes_effect_within_one_receive_timeout() {
    let sim = fake_simulator();
    let config = client_config(&sim, Duration::from_secs(1));

    let mut session = UdpSession::open(&config).unwrap();
    let stop = session.stop_signal();

    let worker = thread::spawn(move || {
        let mut dispatcher = UpdateDispatcher::new(&config);
        let signal = session.stop_signal();
        let result = dispatcher.run(&mut session, &signal, |_| {});
        session.close();
        result
    });

    thread::sleep(Duration::from_millis(300));
    let stopped_at = Instant::now();
    stop.stop();
    worker.join().unwrap().unwrap();

    // One blocked receive can still run to its timeout
    assert!(stopped_at.elapsed() < Duration::from_millis(1800));
}
