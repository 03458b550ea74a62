use crate::memory::handles::{HandleId, HandleTable};
use rdf_pipe_common::error::{CorruptionError, StoreError};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;
use tracing::debug;

/// Identifies a [StatementRecord] within one store.
pub(super) type StatementId = u32;

/// Marks the end of a position list. Also marks the terms of a tombstoned record.
pub(super) const NIL: u32 = u32::MAX;

const EMPTY: u32 = 0;
const DELETED: u32 = u32::MAX;
const MAX_STATEMENTS: usize = u32::MAX as usize - 1;

/// A statement, threaded into one list per position.
#[derive(Clone, Debug)]
pub(super) struct StatementRecord {
    /// The handles in subject, predicate, object, graph name order. All [NIL] once the record
    /// has been removed.
    pub terms: [HandleId; 4],
    /// The next record in each of the four position lists.
    pub next: [StatementId; 4],
}

impl StatementRecord {
    pub fn is_live(&self) -> bool {
        self.terms[0] != NIL
    }

    /// Returns whether the record is live and agrees with every bound component.
    pub fn matches(&self, bindings: &[Option<HandleId>; 4]) -> bool {
        self.is_live()
            && self
                .terms
                .iter()
                .zip(bindings)
                .all(|(term, binding)| binding.map_or(true, |binding| binding == *term))
    }
}

/// The statements of a store.
///
/// Records live in an arena and are addressed by index. An open-addressed index over the four
/// handles of a record answers membership. Slots of the index hold `id + 1`, [EMPTY] or
/// [DELETED].
///
/// Removing a statement only tombstones its record: it stays linked into its position lists
/// until enough tombstones piled up, at which point a sweep unlinks all of them at once and
/// hands their slots to later additions.
#[derive(Debug)]
pub(super) struct StatementTable {
    records: Vec<StatementRecord>,
    index: Vec<u32>,
    /// Index slots that are not [EMPTY], i.e., live entries and deletion markers.
    used: usize,
    live: usize,
    /// Swept records that can be reused.
    free: Vec<StatementId>,
    /// Tombstoned records that are still linked.
    zombies: Vec<StatementId>,
}

impl StatementTable {
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(initial_capacity),
            index: vec![EMPTY; (initial_capacity.max(8) * 3 / 2).next_power_of_two()],
            used: 0,
            live: 0,
            free: Vec::new(),
            zombies: Vec::new(),
        }
    }

    /// The number of live statements.
    pub fn live(&self) -> usize {
        self.live
    }

    /// The number of records, including tombstones and free records.
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, id: StatementId) -> &StatementRecord {
        &self.records[id as usize]
    }

    /// Returns the record holding exactly `terms`, if it is live.
    pub fn find(&self, terms: [HandleId; 4]) -> Option<StatementId> {
        self.probe(terms).ok().map(|(_, id)| id)
    }

    /// Adds a statement and links it at the head of its four position lists.
    ///
    /// Returns `false` if the statement is already present.
    pub fn insert(
        &mut self,
        terms: [HandleId; 4],
        handles: &mut HandleTable,
    ) -> Result<bool, StoreError> {
        let mut slot = match self.probe(terms) {
            Ok(_) => return Ok(false),
            Err(slot) => slot,
        };
        if self.index[slot] == EMPTY && (self.used + 1) * 3 > self.index.len() * 2 {
            self.rebuild_index();
            slot = self.vacant_slot(terms);
        }

        let id = match self.free.pop() {
            Some(id) => id,
            None => u32::try_from(self.records.len())
                .ok()
                .filter(|id| (*id as usize) < MAX_STATEMENTS)
                .ok_or(StoreError::CapacityExceeded {
                    what: "statements",
                    limit: MAX_STATEMENTS,
                })?,
        };

        let mut next = [NIL; 4];
        for (position, handle) in terms.iter().enumerate() {
            let handle = handles.get_mut(*handle);
            next[position] = handle.heads[position];
            handle.heads[position] = id;
            handle.counts[position] += 1;
        }
        let record = StatementRecord { terms, next };
        match self.records.get_mut(id as usize) {
            Some(reused) => *reused = record,
            None => self.records.push(record),
        }

        if self.index[slot] == EMPTY {
            self.used += 1;
        }
        self.index[slot] = id + 1;
        self.live += 1;
        Ok(true)
    }

    /// Tombstones the record `id`. Sweeps all tombstones once there are as many as live
    /// statements.
    pub fn remove(&mut self, id: StatementId, handles: &mut HandleTable) -> bool {
        let terms = self.get(id).terms;
        let slot = match self.probe(terms) {
            Ok((slot, found)) if found == id => slot,
            _ => return false,
        };

        self.index[slot] = DELETED;
        for (position, handle) in terms.iter().enumerate() {
            handles.get_mut(*handle).counts[position] -= 1;
        }
        self.records[id as usize].terms = [NIL; 4];
        self.live -= 1;
        self.zombies.push(id);

        if self.zombies.len() >= self.live {
            self.sweep(handles);
        }
        true
    }

    /// Drops every statement. Position lists of all handles are reset.
    pub fn clear(&mut self, handles: &mut HandleTable) {
        for handle in handles.iter_mut() {
            handle.heads = [NIL; 4];
            handle.counts = [0; 4];
        }
        self.records.clear();
        self.index.fill(EMPTY);
        self.used = 0;
        self.live = 0;
        self.free.clear();
        self.zombies.clear();
    }

    /// Checks that every position list only holds records that use the handle in this position,
    /// that the counters agree with the lists, and that the index knows every live record.
    pub fn validate(&self, handles: &HandleTable) -> Result<(), CorruptionError> {
        let mut listed = [0; 4];
        for (id, handle) in handles.iter() {
            for position in 0..4 {
                let mut live = 0;
                let mut length = 0;
                let mut current = handle.heads[position];
                while current != NIL {
                    let record = self.records.get(current as usize).ok_or_else(|| {
                        CorruptionError::msg("Position list points past the statements")
                    })?;
                    length += 1;
                    if length > self.records.len() {
                        return Err(CorruptionError::msg("Cycle in a position list"));
                    }
                    if record.is_live() {
                        if record.terms[position] != id {
                            return Err(CorruptionError::msg("Quad in wrong list"));
                        }
                        live += 1;
                    }
                    current = record.next[position];
                }
                if live != handle.counts[position] as usize {
                    return Err(CorruptionError::msg(format!(
                        "The counter of a handle is {} but its list holds {live} quads",
                        handle.counts[position]
                    )));
                }
                listed[position] += live;
            }
        }
        if listed.iter().any(|count| *count != self.live) {
            return Err(CorruptionError::msg("Too many quads in a chain"));
        }

        let mut indexed = 0;
        for (id, record) in (0..).zip(&self.records) {
            if record.is_live() {
                if self.find(record.terms) != Some(id) {
                    return Err(CorruptionError::msg(
                        "Quad in the statements but not in the index",
                    ));
                }
                indexed += 1;
            }
        }
        if indexed != self.live {
            return Err(CorruptionError::msg("Wrong number of live quads"));
        }
        Ok(())
    }

    /// Unlinks all tombstoned records from the position lists of every handle.
    ///
    /// Unlinked records keep their own links until they are reused, so a walk that stopped on
    /// one of them can still continue.
    fn sweep(&mut self, handles: &mut HandleTable) {
        let start = Instant::now();
        for handle in handles.iter_mut() {
            for position in 0..4 {
                let mut previous = NIL;
                let mut current = handle.heads[position];
                while current != NIL {
                    let next = self.get(current).next[position];
                    if self.get(current).is_live() {
                        previous = current;
                    } else if previous == NIL {
                        handle.heads[position] = next;
                    } else {
                        self.records[previous as usize].next[position] = next;
                    }
                    current = next;
                }
            }
        }
        let reclaimed = self.zombies.len();
        self.free.append(&mut self.zombies);
        debug!(
            "Swept {} removed statements ({} live) in {:?}",
            reclaimed,
            self.live,
            start.elapsed()
        );
    }

    /// Returns the slot holding `terms` together with their record, or the first slot where they
    /// could be inserted.
    fn probe(&self, terms: [HandleId; 4]) -> Result<(usize, StatementId), usize> {
        let mask = self.index.len() - 1;
        let mut position = slot_position(terms, mask);
        let mut reusable = None;
        loop {
            match self.index[position] {
                EMPTY => return Err(reusable.unwrap_or(position)),
                DELETED => {
                    reusable.get_or_insert(position);
                }
                slot => {
                    if self.get(slot - 1).terms == terms {
                        return Ok((position, slot - 1));
                    }
                }
            }
            position = (position + 1) & mask;
        }
    }

    fn vacant_slot(&self, terms: [HandleId; 4]) -> usize {
        let mask = self.index.len() - 1;
        let mut position = slot_position(terms, mask);
        while self.index[position] != EMPTY {
            position = (position + 1) & mask;
        }
        position
    }

    /// Rebuilds the index without deletion markers, doubling it if the live statements alone
    /// exceed a third of it.
    fn rebuild_index(&mut self) {
        let start = Instant::now();
        let old_len = self.index.len();
        let new_len = if (self.live + 1) * 3 > old_len {
            old_len * 2
        } else {
            old_len
        };
        self.index = vec![EMPTY; new_len];
        for (slot, record) in (1_u32..).zip(&self.records) {
            if record.is_live() {
                let position = self.vacant_slot(record.terms);
                self.index[position] = slot;
            }
        }
        self.used = self.live;
        debug!(
            "Rebuilt statement index from {} to {} slots ({} statements) in {:?}",
            old_len,
            new_len,
            self.live,
            start.elapsed()
        );
    }
}

#[allow(clippy::cast_possible_truncation, reason = "Only the low bits select the slot")]
fn slot_position(terms: [HandleId; 4], mask: usize) -> usize {
    let mut hasher = FxHasher::default();
    terms.hash(&mut hasher);
    hasher.finish() as usize & mask
}
