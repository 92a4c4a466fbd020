//! Listen to a running simulator for a fixed number of seconds
//!
//! Usage:
//!   cargo run --example listen_for -- [seconds] [sim_host]
//!
//! Example:
//!   cargo run --example listen_for -- 30 192.168.1.20

use std::env;
use std::thread;
use std::time::Duration;
use xplane_rref::{ClientConfig, UdpSession, UpdateDispatcher};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let seconds: u64 = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(15);
    let host = args.get(2).cloned().unwrap_or_else(|| "127.0.0.1".to_string());

    let config = ClientConfig::new().with_simulator(host, 49001);
    let mut session = UdpSession::open(&config)?;
    let stop = session.stop_signal();

    let timer = stop.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(seconds));
        timer.stop();
    });

    let mut dispatcher = UpdateDispatcher::new(&config);
    let result = dispatcher.run(&mut session, &stop, |change| println!("{}", change));
    session.close();

    let stats = result?;
    println!("\n=== SUMMARY ===");
    println!("Packets received: {}", stats.packets);
    println!("Values decoded:   {}", stats.updates);
    println!("Changes reported: {}", stats.changes);

    let mut indices: Vec<_> = dispatcher.stores().latest_values().keys().copied().collect();
    indices.sort_unstable();
    for index in indices {
        if let Some(value) = dispatcher.stores().latest(index) {
            println!("  [{:>3}] {:.3}", index, value);
        }
    }

    Ok(())
}
