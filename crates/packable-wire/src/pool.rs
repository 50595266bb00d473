//! Process-wide free lists for write-buffer arrays and decoder info tables.
//!
//! Both pools follow the same contract: `acquire` pops an idle array or
//! falls back to a fresh allocation, `release` pushes the array back unless
//! the pool is full or the array is not one of the pooled sizes. The lock
//! is held only for the pop/push itself. Nothing is ever required to be
//! released; a dropped array simply costs one future allocation.
//!
//! A pool constructed with capacity 0 never retains anything, which is how
//! callers run with pooling disabled.

use parking_lot::{Mutex, const_mutex};
use tracing::trace;

use crate::config::DEFAULT_BUFFER_SIZE;

/// Info-table sizes kept by [`InfoPool`], smallest first. 256 slots cover
/// every possible field index.
pub const INFO_TIERS: [usize; 3] = [64, 128, 256];

// ── Write buffers ───────────────────────────────────────────────────────────

/// Bounded pool of [`DEFAULT_BUFFER_SIZE`]-byte arrays backing encoders.
pub struct BufferPool {
    capacity: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

static GLOBAL_BUFFER_POOL: BufferPool = BufferPool::new(8);

impl BufferPool {
    /// Create a pool that retains at most `capacity` idle arrays.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: const_mutex(Vec::new()),
        }
    }

    /// The default process-wide pool (capacity 8).
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_BUFFER_POOL
    }

    /// Take a default-size array.
    ///
    /// Recycled arrays are not cleared; callers track their own cursor.
    #[must_use]
    pub fn acquire(&self) -> Vec<u8> {
        if let Some(buf) = self.free.lock().pop() {
            return buf;
        }
        trace!(size = DEFAULT_BUFFER_SIZE, "buffer pool miss");
        vec![0; DEFAULT_BUFFER_SIZE]
    }

    /// Take an array of exactly `size` bytes. Only the default size is
    /// served from the free list.
    #[must_use]
    pub fn allocate(&self, size: usize) -> Vec<u8> {
        if size == DEFAULT_BUFFER_SIZE {
            self.acquire()
        } else {
            vec![0; size]
        }
    }

    /// Return an array. Arrays of any other size than the default, or
    /// arrays arriving while the pool is full, are dropped.
    pub fn release(&self, buf: Vec<u8>) {
        if buf.len() != DEFAULT_BUFFER_SIZE {
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(buf);
        }
    }

    /// Number of idle arrays currently held.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

// ── Info tables ─────────────────────────────────────────────────────────────

/// Tiered pool of `u64` slot arrays used as decoder info tables.
pub struct InfoPool {
    capacity: usize,
    tiers: [Mutex<Vec<Vec<u64>>>; INFO_TIERS.len()],
}

static GLOBAL_INFO_POOL: InfoPool = InfoPool::new(16);

impl InfoPool {
    /// Create a pool that retains at most `capacity` idle arrays per tier.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tiers: [
                const_mutex(Vec::new()),
                const_mutex(Vec::new()),
                const_mutex(Vec::new()),
            ],
        }
    }

    /// The default process-wide pool (16 arrays per tier).
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_INFO_POOL
    }

    /// Take an array with at least `min_len` slots, sized to the smallest
    /// tier that fits. Requests above the largest tier are allocated exactly.
    #[must_use]
    pub fn acquire(&self, min_len: usize) -> Vec<u64> {
        match INFO_TIERS.iter().position(|&tier| tier >= min_len) {
            Some(i) => {
                if let Some(slots) = self.tiers[i].lock().pop() {
                    return slots;
                }
                trace!(slots = INFO_TIERS[i], "info pool miss");
                vec![0; INFO_TIERS[i]]
            }
            None => vec![0; min_len],
        }
    }

    /// Return an array to the tier matching its length.
    pub fn release(&self, slots: Vec<u64>) {
        let Some(i) = INFO_TIERS.iter().position(|&tier| tier == slots.len()) else {
            return;
        };
        let mut free = self.tiers[i].lock();
        if free.len() < self.capacity {
            free.push(slots);
        }
    }

    /// Number of idle arrays held across all tiers.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.tiers.iter().map(|tier| tier.lock().len()).sum()
    }
}
