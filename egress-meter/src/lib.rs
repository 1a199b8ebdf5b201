//! Per-destination egress traffic accounting.
//!
//! `egress-meter` inspects raw link-layer frames delivered by some
//! interception point (a socket filter, a tap on a workload's virtual
//! interface), reads the IPv4 destination address out of each one, and
//! keeps a running bytes/packets counter per destination in a
//! fixed-capacity concurrent table.
//!
//! The crate never makes forwarding decisions. Every observed frame gets
//! a [`Disposition::Pass`], and accounting failures — a truncated frame,
//! a full table — only show up on internal counters, never on the
//! forwarding path.
//!
//! # Examples
//!
//! ```
//! use egress_meter::{Disposition, EgressProbe};
//!
//! let probe = EgressProbe::new();
//!
//! // A 64 byte frame headed for 10.0.0.7.
//! let mut frame = [0u8; 64];
//! frame[30..34].copy_from_slice(&[10, 0, 0, 7]);
//!
//! assert_eq!(probe.observe(&frame), Disposition::Pass);
//!
//! for (addr, counters) in probe.table().snapshot() {
//!     println!("{addr}: {} bytes / {} packets", counters.bytes, counters.packets);
//! }
//! ```

pub mod config;
pub mod packet;
pub mod probe;
pub mod table;

pub use config::ProbeConfig;
pub use packet::{extract_destination, FrameError};
pub use probe::{Disposition, EgressProbe};
pub use table::{AccountingTable, CounterSnapshot};
