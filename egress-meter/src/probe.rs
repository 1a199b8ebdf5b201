//! The frame observation pipeline: extract, account, pass through.

use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use crate::{
    config::ProbeConfig,
    packet::{self, FrameError},
    table::AccountingTable,
};

/// What the caller should do with an observed frame.
///
/// Accounting never drops traffic, so every observation comes back
/// [`Disposition::Pass`]. The type exists to make that contract explicit
/// at the attachment boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Disposition {
    /// Forward the frame unchanged
    Pass,
}

/// Per-destination egress accounting over a stream of observed frames.
///
/// [`observe`](Self::observe) is safe to call concurrently from any
/// number of threads, typically one per receive queue or CPU.
pub struct EgressProbe {
    table: AccountingTable,
    truncated_frames: AtomicU64,
}

impl EgressProbe {
    /// Creates a probe with the default table sizing.
    pub fn new() -> Self {
        Self::with_table(AccountingTable::new())
    }

    /// Creates a probe sized from a [`ProbeConfig`].
    pub fn with_config(config: &ProbeConfig) -> Self {
        Self::with_table(AccountingTable::with_config(config))
    }

    fn with_table(table: AccountingTable) -> Self {
        Self {
            table,
            truncated_frames: AtomicU64::new(0),
        }
    }

    /// Accounts one observed frame and returns its disposition.
    ///
    /// The full frame length is what gets added to the destination's
    /// byte counter. Frames too short to carry an IPv4 destination skip
    /// accounting and bump [`truncated_frames`](Self::truncated_frames).
    /// The disposition is [`Disposition::Pass`] in every case.
    pub fn observe(&self, frame: &[u8]) -> Disposition {
        match packet::extract_destination(frame) {
            Ok(addr) => self.table.record(addr, frame.len() as u64),
            Err(FrameError::TruncatedFrame { len, needed }) => {
                self.truncated_frames.fetch_add(1, Ordering::Relaxed);
                trace!("skipping accounting for truncated frame ({len} < {needed})");
            }
        }
        Disposition::Pass
    }

    /// The accounting table backing this probe, for lookups and export.
    pub fn table(&self) -> &AccountingTable {
        &self.table
    }

    /// Number of frames skipped because they were too short to carry a
    /// destination address.
    pub fn truncated_frames(&self) -> u64 {
        self.truncated_frames.load(Ordering::Relaxed)
    }
}

impl Default for EgressProbe {
    fn default() -> Self {
        Self::new()
    }
}
