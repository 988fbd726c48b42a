//! Fixed-capacity ordered store of decoded item records.

use heapless::{String, Vec};
use log::warn;

/// Item slots available to one fetch session.
pub const STORE_CAPACITY: usize = 50;
/// Usable label characters once the flag character is stripped.
pub const ITEM_LABEL_BYTES: usize = 18;

const FLAG_NESTED_LIST: char = 'L';
const FLAG_CHECKED: char = '+';

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ItemKind {
    Note,
    NestedList,
}

/// One decoded entry: display label plus the flags recovered from the wire
/// string's leading character.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ItemRecord {
    pub label: String<ITEM_LABEL_BYTES>,
    pub kind: ItemKind,
    pub checked: bool,
}

impl ItemRecord {
    fn parse(raw: &str) -> Self {
        let mut chars = raw.chars();
        let flag = chars.next();
        let mut label = String::new();
        for ch in chars {
            if label.push(ch).is_err() {
                break;
            }
        }
        Self {
            label,
            kind: if flag == Some(FLAG_NESTED_LIST) {
                ItemKind::NestedList
            } else {
                ItemKind::Note
            },
            checked: flag == Some(FLAG_CHECKED),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// Write index at or beyond the fixed capacity.
    OutOfCapacity,
    /// Write would leave a gap behind the frontier of written slots.
    NonContiguous,
}

/// Ordered collection filled incrementally as chunks arrive. The declared
/// total is learned from the first chunk of a fetch and stays authoritative
/// until the next [`reset`](ItemStore::reset).
#[derive(Clone, Debug, Default)]
pub struct ItemStore {
    slots: Vec<ItemRecord, STORE_CAPACITY>,
    total: Option<u8>,
}

impl ItemStore {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            total: None,
        }
    }

    /// Drop all records and forget the declared total.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.total = None;
    }

    /// Record the declared total for this fetch. Only the first call per
    /// fetch sticks; a repeat is a protocol-violation signal, logged and
    /// ignored. Totals above capacity clamp so writes stay in bounds.
    pub fn set_total(&mut self, declared: u8) {
        if let Some(total) = self.total {
            warn!("store: total already declared kept={total} repeat={declared}");
            return;
        }
        let clamped = (declared as usize).min(STORE_CAPACITY) as u8;
        if clamped != declared {
            warn!("store: declared total {declared} exceeds capacity {STORE_CAPACITY}, clamped");
        }
        self.total = Some(clamped);
    }

    pub fn total(&self) -> Option<u8> {
        self.total
    }

    /// Records written so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ItemRecord> {
        self.slots.get(index)
    }

    /// Parse and store a raw flag+label string at its absolute index.
    /// Rewriting an already-written slot is idempotent; a write past the
    /// frontier is rejected rather than leaving a gap.
    pub fn write(&mut self, index: usize, raw: &str) -> Result<(), StoreError> {
        if index >= STORE_CAPACITY {
            return Err(StoreError::OutOfCapacity);
        }
        if index > self.slots.len() {
            return Err(StoreError::NonContiguous);
        }
        let record = ItemRecord::parse(raw);
        if index < self.slots.len() {
            self.slots[index] = record;
        } else {
            self.slots
                .push(record)
                .map_err(|_| StoreError::OutOfCapacity)?;
        }
        Ok(())
    }

    /// Whether a write at `last_written` reached the declared end.
    pub fn is_complete(&self, last_written: usize) -> bool {
        match self.total {
            Some(total) => total > 0 && last_written == total as usize - 1,
            None => false,
        }
    }
}
