//! Feeds synthetic Ethernet/IPv4 frames through the probe and prints
//! the accounting table, the way a periodic exporter would read it.
//!
//! Run with `RUST_LOG=debug` to see table-full drops.

use std::net::Ipv4Addr;

use egress_meter::{packet::DST_ADDR_OFFSET, EgressProbe, ProbeConfig};

fn frame_to(dst: Ipv4Addr, len: usize) -> Vec<u8> {
    let mut frame = vec![0u8; len];
    frame[DST_ADDR_OFFSET..DST_ADDR_OFFSET + 4].copy_from_slice(&dst.octets());
    frame
}

fn main() {
    env_logger::init();

    let probe = EgressProbe::with_config(&ProbeConfig {
        max_entries: 3,
        shards: 4,
    });

    let traffic = [
        (Ipv4Addr::new(10, 0, 0, 1), 100),
        (Ipv4Addr::new(10, 0, 0, 2), 50),
        (Ipv4Addr::new(10, 0, 0, 1), 20),
        (Ipv4Addr::new(93, 184, 216, 34), 1500),
        (Ipv4Addr::new(93, 184, 216, 34), 1500),
        // One destination past capacity, dropped from accounting.
        (Ipv4Addr::new(203, 0, 113, 5), 64),
    ];

    for (dst, len) in traffic {
        let _ = probe.observe(&frame_to(dst, len));
    }

    // A frame too short to carry a destination still passes.
    let _ = probe.observe(&[0u8; 20]);

    let mut entries = probe.table().snapshot();
    entries.sort_by_key(|(addr, _)| *addr);

    println!("destination        bytes  packets");
    for (addr, counters) in entries {
        println!("{addr:<16} {:>7} {:>8}", counters.bytes, counters.packets);
    }
    println!(
        "tracked {} of {} slots, {} observations dropped, {} truncated frames",
        probe.table().len(),
        probe.table().max_entries(),
        probe.table().dropped_records(),
        probe.truncated_frames(),
    );
}
