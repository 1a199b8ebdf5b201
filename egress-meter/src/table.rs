//! The per-destination accounting table.
//!
//! [`AccountingTable`] maps an IPv4 destination address to a pair of
//! monotonically increasing counters, total bytes and total packets.
//! Capacity is fixed at construction: once `max_entries` distinct
//! destinations are tracked, observations for new destinations are
//! dropped (and counted on [`AccountingTable::dropped_records`]) while
//! existing destinations keep accumulating. Entries are never removed
//! or reset for the lifetime of the table.
//!
//! The table is safe to share across threads without external locking.
//! Internally the key space is striped across shards; incrementing an
//! existing record takes a shard read lock and two relaxed atomic adds,
//! and only the first observation of a destination takes a shard write
//! lock.
//!
//! # Examples
//!
//! ```
//! use std::net::Ipv4Addr;
//!
//! use egress_meter::table::AccountingTable;
//!
//! let table = AccountingTable::with_capacity(2, 1);
//! let addr = Ipv4Addr::new(10, 0, 0, 1);
//!
//! table.record(addr, 100);
//! table.record(addr, 20);
//!
//! let counters = table.get(&addr).unwrap();
//! assert_eq!(counters.bytes, 120);
//! assert_eq!(counters.packets, 2);
//! ```

use std::{
    collections::hash_map::RandomState,
    fmt,
    hash::BuildHasher,
    net::Ipv4Addr,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        PoisonError, RwLock,
    },
};

use hashbrown::{hash_map::Entry, HashMap};
use log::debug;

use crate::config::ProbeConfig;

/// Maximum number of tracked destinations in the reference sizing.
pub const DEFAULT_MAX_ENTRIES: usize = 10240;

/// Number of lock stripes the key space is divided across by default.
pub const DEFAULT_SHARDS: usize = 64;

/// One destination's live counters. Updated in place with relaxed
/// atomic adds so concurrent observers never lose an increment.
struct CounterRecord {
    bytes: AtomicU64,
    packets: AtomicU64,
}

impl CounterRecord {
    fn new(frame_size: u64) -> Self {
        Self {
            bytes: AtomicU64::new(frame_size),
            packets: AtomicU64::new(1),
        }
    }

    fn add(&self, frame_size: u64) {
        self.bytes.fetch_add(frame_size, Ordering::Relaxed);
        self.packets.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            bytes: self.bytes.load(Ordering::Relaxed),
            packets: self.packets.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of one destination's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Total bytes observed toward this destination
    pub bytes: u64,
    /// Total packets observed toward this destination
    pub packets: u64,
}

type Shard = RwLock<HashMap<Ipv4Addr, CounterRecord>>;

/// A fixed-capacity concurrent map from destination address to
/// byte/packet counters.
pub struct AccountingTable {
    shards: Box<[Shard]>,
    shard_hasher: RandomState,
    len: AtomicUsize,
    max_entries: usize,
    dropped: AtomicU64,
}

impl AccountingTable {
    /// Creates a table with the reference sizing ([`DEFAULT_MAX_ENTRIES`]
    /// entries across [`DEFAULT_SHARDS`] stripes).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES, DEFAULT_SHARDS)
    }

    /// Creates a table sized from a [`ProbeConfig`].
    pub fn with_config(config: &ProbeConfig) -> Self {
        Self::with_capacity(config.max_entries, config.shards)
    }

    /// Creates a table tracking at most `max_entries` destinations,
    /// striped across `shards` locks. `shards` is clamped to at least 1.
    pub fn with_capacity(max_entries: usize, shards: usize) -> Self {
        let shards = shards.max(1);
        let per_shard = max_entries / shards + 1;
        let shards = (0..shards)
            .map(|_| RwLock::new(HashMap::with_capacity(per_shard)))
            .collect();
        Self {
            shards,
            shard_hasher: RandomState::new(),
            len: AtomicUsize::new(0),
            max_entries,
            dropped: AtomicU64::new(0),
        }
    }

    fn shard(&self, addr: &Ipv4Addr) -> &Shard {
        let hash = self.shard_hasher.hash_one(addr);
        &self.shards[hash as usize % self.shards.len()]
    }

    /// Accounts one observed frame of `frame_size` bytes toward `addr`.
    ///
    /// If `addr` is already tracked, its counters are atomically
    /// incremented; concurrent calls for the same destination never lose
    /// updates. If `addr` is new and the table is below capacity, a
    /// record seeded with this frame is inserted. If the table is full,
    /// the observation is dropped silently and only
    /// [`dropped_records`](Self::dropped_records) moves.
    ///
    /// Never fails and never blocks beyond a short-held shard lock;
    /// accounting outcomes must not influence what the caller does with
    /// the frame itself.
    pub fn record(&self, addr: Ipv4Addr, frame_size: u64) {
        let shard = self.shard(&addr);
        {
            let guard = shard.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(record) = guard.get(&addr) {
                record.add(frame_size);
                return;
            }
        }
        let mut guard = shard.write().unwrap_or_else(PoisonError::into_inner);
        match guard.entry(addr) {
            // Another caller won the first-observation race between our
            // read and write lock; merge into its record.
            Entry::Occupied(entry) => entry.get().add(frame_size),
            Entry::Vacant(entry) => {
                if self.try_reserve_slot() {
                    entry.insert(CounterRecord::new(frame_size));
                } else {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        "accounting table full ({} entries), not tracking {addr}",
                        self.max_entries
                    );
                }
            }
        }
    }

    /// Returns a copy of the counters for `addr`, if it is tracked.
    pub fn get(&self, addr: &Ipv4Addr) -> Option<CounterSnapshot> {
        let guard = self
            .shard(addr)
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(addr).map(CounterRecord::snapshot)
    }

    /// Copies out every tracked destination and its counters, in
    /// arbitrary order.
    ///
    /// Each entry is individually consistent, but entries observed under
    /// concurrent `record` traffic are not a single global cut of the
    /// table. That matches what a periodic exporter needs.
    pub fn snapshot(&self) -> Vec<(Ipv4Addr, CounterSnapshot)> {
        let mut entries = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            let guard = shard.read().unwrap_or_else(PoisonError::into_inner);
            entries.extend(guard.iter().map(|(addr, record)| (*addr, record.snapshot())));
        }
        entries
    }

    /// Number of destinations currently tracked.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns `true` if no destination has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity this table was constructed with.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Number of observations dropped because the table was full.
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // Claims one of the remaining slots, or reports exhaustion. The
    // shared length counter is the capacity authority across shards, so
    // concurrent inserts into different shards cannot overshoot.
    fn try_reserve_slot(&self) -> bool {
        self.len
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |len| {
                (len < self.max_entries).then_some(len + 1)
            })
            .is_ok()
    }
}

impl Default for AccountingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AccountingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountingTable")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .field("shards", &self.shards.len())
            .field("dropped", &self.dropped_records())
            .finish()
    }
}
