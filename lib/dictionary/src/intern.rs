use crate::hash::hash_str;
use rdf_pipe_common::error::DictionaryError;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// The number of entries an [InternTable] can hold. Indices start at one, so every index fits
/// into 16 bits and zero can stand for "absent".
pub(crate) const INTERN_CAPACITY: usize = 65534;

const INITIAL_SLOTS: usize = 64;

/// A small, closed dictionary assigning dense indices to strings in insertion order.
///
/// Used for namespaces, language tags and datatype IRIs. Cloning the table shares the interned
/// strings, so a forked dictionary starts from the same vocabulary and grows independently.
#[derive(Clone, Debug)]
pub(crate) struct InternTable {
    name: &'static str,
    /// The string with index `i` is stored at position `i - 1`.
    entries: Vec<Arc<str>>,
    /// Open-addressed slots holding `hash << 32 | index`, zero marks an empty slot.
    slots: Vec<u64>,
}

impl InternTable {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
            slots: vec![0; INITIAL_SLOTS],
        }
    }

    /// Creates a table whose first indices are assigned to `values`, in order.
    pub fn with_entries<'a>(
        name: &'static str,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, DictionaryError> {
        let mut table = Self::new(name);
        for value in values {
            table.get_or_insert(value)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, value: &str) -> Option<u16> {
        self.probe(value, hash_str(value)).ok()
    }

    /// Returns the index of `value`, interning it first if necessary.
    pub fn get_or_insert(&mut self, value: &str) -> Result<u16, DictionaryError> {
        self.try_insert(value).ok_or(DictionaryError::TableFull {
            table: self.name,
            capacity: INTERN_CAPACITY,
        })
    }

    /// Like [Self::get_or_insert] but reports a full table with [None].
    pub fn try_insert(&mut self, value: &str) -> Option<u16> {
        let hash = hash_str(value);
        let slot = match self.probe(value, hash) {
            Ok(index) => return Some(index),
            Err(slot) => slot,
        };
        if self.entries.len() >= INTERN_CAPACITY {
            return None;
        }

        self.entries.push(Arc::from(value));
        let index = u16::try_from(self.entries.len()).ok()?;
        let slot = if self.entries.len() * 3 > self.slots.len() * 2 {
            self.rehash();
            self.vacant_slot(hash)
        } else {
            slot
        };
        self.slots[slot] = pack_slot(hash, index);
        Some(index)
    }

    pub fn resolve(&self, index: u16) -> Option<&Arc<str>> {
        self.entries.get(usize::from(index).checked_sub(1)?)
    }

    /// Returns the index of `value` or the empty slot where it belongs.
    fn probe(&self, value: &str, hash: u64) -> Result<u16, usize> {
        let mask = self.slots.len() - 1;
        let mut position = slot_position(hash, mask);
        loop {
            let slot = self.slots[position];
            if slot == 0 {
                return Err(position);
            }
            let (slot_hash, index) = unpack_slot(slot);
            if slot_hash == short_hash(hash)
                && self.resolve(index).is_some_and(|entry| &**entry == value)
            {
                return Ok(index);
            }
            position = (position + 1) & mask;
        }
    }

    fn vacant_slot(&self, hash: u64) -> usize {
        let mask = self.slots.len() - 1;
        let mut position = slot_position(hash, mask);
        while self.slots[position] != 0 {
            position = (position + 1) & mask;
        }
        position
    }

    fn rehash(&mut self) {
        let start = Instant::now();
        let old_len = self.slots.len();
        let old_slots = std::mem::replace(&mut self.slots, vec![0; old_len * 2]);
        for slot in old_slots.into_iter().filter(|slot| *slot != 0) {
            let position = self.vacant_slot(u64::from(unpack_slot(slot).0));
            self.slots[position] = slot;
        }
        debug!(
            "Rehashed {} table from {} to {} slots in {:?}",
            self.name,
            old_len,
            self.slots.len(),
            start.elapsed()
        );
    }
}

#[allow(clippy::cast_possible_truncation, reason = "Keeps the low half of the hash")]
fn short_hash(hash: u64) -> u32 {
    hash as u32
}

fn slot_position(hash: u64, mask: usize) -> usize {
    short_hash(hash) as usize & mask
}

fn pack_slot(hash: u64, index: u16) -> u64 {
    u64::from(short_hash(hash)) << 32 | u64::from(index)
}

#[allow(clippy::cast_possible_truncation, reason = "Splits the packed slot")]
fn unpack_slot(slot: u64) -> (u32, u16) {
    ((slot >> 32) as u32, slot as u16)
}
