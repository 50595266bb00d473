use packable_wire::{InfoPool, SizeClass};
use tracing::trace;

const CLASS_SHIFT: u32 = 60;
const OFFSET_SHIFT: u32 = 30;
const LOW_MASK: u64 = (1 << 30) - 1;

/// One info-table entry, packed into a `u64`.
///
/// ```text
///   63  62..60   59 ........ 30   29 ......... 0
///   ┌──┬───────┬────────────────┬───────────────┐
///   │0 │ class │ offset         │ length        │   Num64, Var8/16/32
///   └──┴───────┴────────────────┴───────────────┘
///   ┌──┬───────┬────────────────┬───────────────┐
///   │0 │ class │ unused         │ value (32)    │   Zero, Num8/16/32
///   └──┴───────┴────────────────┴───────────────┘
///   all ones                                         NULL (no field)
/// ```
///
/// Offsets and lengths get 30 bits each, which is why decoder input is
/// capped at 1 GiB. Bit 63 is never set in a real entry, so `NULL` cannot
/// collide with one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InfoSlot(u64);

impl InfoSlot {
    pub(crate) const NULL: Self = Self(u64::MAX);

    /// A scalar whose value was read during the scan.
    pub(crate) fn literal(size_class: SizeClass, value: u32) -> Self {
        Self((u64::from(size_class.bits()) << CLASS_SHIFT) | u64::from(value))
    }

    /// A payload at `offset` in the backing bytes. Empty payloads store
    /// offset 0.
    pub(crate) fn located(size_class: SizeClass, offset: usize, len: usize) -> Self {
        let offset = if len == 0 { 0 } else { offset as u64 & LOW_MASK };
        Self(
            (u64::from(size_class.bits()) << CLASS_SHIFT)
                | (offset << OFFSET_SHIFT)
                | (len as u64 & LOW_MASK),
        )
    }

    pub(crate) fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn size_class(self) -> SizeClass {
        SizeClass::from_bits((self.0 >> CLASS_SHIFT) as u8)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn value(self) -> u32 {
        self.0 as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn offset(self) -> usize {
        ((self.0 >> OFFSET_SHIFT) & LOW_MASK) as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn len(self) -> usize {
        (self.0 & LOW_MASK) as usize
    }
}

/// Per-record slot array, indexed by field index.
///
/// The array is drawn from an [`InfoPool`] on first use and moved to a
/// larger tier when a higher index turns up. Recycled arrays are not
/// cleared: only slots up to the record's maximum index are ever read, and
/// the scan writes every one of them.
pub(crate) struct InfoTable {
    slots: Vec<u64>,
    pool: &'static InfoPool,
}

impl InfoTable {
    pub(crate) fn new(pool: &'static InfoPool) -> Self {
        Self {
            slots: Vec::new(),
            pool,
        }
    }

    pub(crate) fn pool(&self) -> &'static InfoPool {
        self.pool
    }

    pub(crate) fn set(&mut self, index: u8, slot: InfoSlot) {
        let i = usize::from(index);
        if i >= self.slots.len() {
            self.grow(i + 1);
        }
        if let Some(entry) = self.slots.get_mut(i) {
            *entry = slot.0;
        }
    }

    pub(crate) fn get(&self, index: u8) -> InfoSlot {
        self.slots
            .get(usize::from(index))
            .copied()
            .map_or(InfoSlot::NULL, InfoSlot)
    }

    fn grow(&mut self, min_len: usize) {
        let mut grown = self.pool.acquire(min_len);
        let len = self.slots.len();
        grown[..len].copy_from_slice(&self.slots);
        let old = std::mem::replace(&mut self.slots, grown);
        if !old.is_empty() {
            trace!(from = old.len(), to = self.slots.len(), "info table upgraded");
            self.pool.release(old);
        }
    }

    /// Hand the array back to the pool. The table stays usable and draws a
    /// fresh array on the next `set`.
    pub(crate) fn release(&mut self) {
        let slots = std::mem::take(&mut self.slots);
        if !slots.is_empty() {
            self.pool.release(slots);
        }
    }
}

impl Drop for InfoTable {
    fn drop(&mut self) {
        self.release();
    }
}
