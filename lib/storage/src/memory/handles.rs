use crate::memory::statements::{StatementId, NIL};
use rdf_pipe_common::error::StoreError;
use rdf_pipe_model::{GraphNameRef, Term, TermRef};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;
use tracing::debug;

/// Identifies a [TermHandle] within one store.
pub(super) type HandleId = u32;

/// The handle standing in for the default graph. It exists from construction on.
pub(super) const DEFAULT_GRAPH: HandleId = 0;

/// The largest number of handles a store can hold. Slot values are `id + 1` and [NIL] is
/// reserved, so two values of the `u32` range are unavailable.
const MAX_HANDLES: usize = u32::MAX as usize - 1;

/// The hash-consed representation of a term within a store.
///
/// For each position of a quad, a handle knows the head of the list threading all statements
/// that use the term in this position, and how many of them are live.
#[derive(Debug)]
pub(super) struct TermHandle {
    /// [None] for the default graph.
    term: Option<Term>,
    hash: u64,
    pub heads: [StatementId; 4],
    pub counts: [u32; 4],
}

impl TermHandle {
    fn new(term: Option<Term>, hash: u64) -> Self {
        Self {
            term,
            hash,
            heads: [NIL; 4],
            counts: [0; 4],
        }
    }

    pub fn term(&self) -> Option<TermRef<'_>> {
        self.term.as_ref().map(Term::as_ref)
    }

    /// Returns the graph name this handle stands for, if it can be one.
    pub fn graph_name(&self) -> Option<GraphNameRef<'_>> {
        match &self.term {
            None => Some(GraphNameRef::DefaultGraph),
            Some(Term::NamedNode(node)) => Some(node.as_ref().into()),
            Some(Term::BlankNode(node)) => Some(node.as_ref().into()),
            Some(Term::Literal(_)) => None,
        }
    }
}

/// An open-addressed hash table mapping terms to their handles.
///
/// Slots hold `id + 1`, zero marks an empty slot. Handles are never removed, thus probing needs
/// no deletion markers and ids stay stable across rehashes.
#[derive(Debug)]
pub(super) struct HandleTable {
    handles: Vec<TermHandle>,
    slots: Vec<u32>,
}

impl HandleTable {
    pub fn new(initial_capacity: usize) -> Self {
        let mut handles = Vec::with_capacity(initial_capacity);
        handles.push(TermHandle::new(None, 0));
        Self {
            handles,
            slots: vec![0; (initial_capacity.max(8) * 3 / 2).next_power_of_two()],
        }
    }

    /// The number of handles, including the default graph.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn get(&self, id: HandleId) -> &TermHandle {
        &self.handles[id as usize]
    }

    pub fn get_mut(&mut self, id: HandleId) -> &mut TermHandle {
        &mut self.handles[id as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (HandleId, &TermHandle)> {
        (0..).zip(&self.handles)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TermHandle> {
        self.handles.iter_mut()
    }

    /// Returns the handle of `term` without creating one.
    pub fn lookup(&self, term: TermRef<'_>) -> Option<HandleId> {
        self.probe(term, hash_term(term)).ok()
    }

    pub fn lookup_graph(&self, graph_name: GraphNameRef<'_>) -> Option<HandleId> {
        match graph_name {
            GraphNameRef::NamedNode(node) => self.lookup(node.into()),
            GraphNameRef::BlankNode(node) => self.lookup(node.into()),
            GraphNameRef::DefaultGraph => Some(DEFAULT_GRAPH),
        }
    }

    /// Returns the handle of `term`, creating it on first use.
    pub fn get_or_insert(&mut self, term: TermRef<'_>) -> Result<HandleId, StoreError> {
        let hash = hash_term(term);
        let slot = match self.probe(term, hash) {
            Ok(id) => return Ok(id),
            Err(slot) => slot,
        };
        let id = u32::try_from(self.handles.len())
            .ok()
            .filter(|id| (*id as usize) < MAX_HANDLES)
            .ok_or(StoreError::CapacityExceeded {
                what: "terms",
                limit: MAX_HANDLES,
            })?;
        self.handles.push(TermHandle::new(Some(term.into_owned()), hash));
        let slot = if self.handles.len() * 3 > self.slots.len() * 2 {
            self.rehash();
            self.vacant_slot(hash)
        } else {
            slot
        };
        self.slots[slot] = id + 1;
        Ok(id)
    }

    pub fn get_or_insert_graph(
        &mut self,
        graph_name: GraphNameRef<'_>,
    ) -> Result<HandleId, StoreError> {
        match graph_name {
            GraphNameRef::NamedNode(node) => self.get_or_insert(node.into()),
            GraphNameRef::BlankNode(node) => self.get_or_insert(node.into()),
            GraphNameRef::DefaultGraph => Ok(DEFAULT_GRAPH),
        }
    }

    /// Returns the id of the handle for `term` or the empty slot where it belongs.
    fn probe(&self, term: TermRef<'_>, hash: u64) -> Result<HandleId, usize> {
        let mask = self.slots.len() - 1;
        let mut position = slot_position(hash, mask);
        loop {
            let id = match self.slots[position] {
                0 => return Err(position),
                slot => slot - 1,
            };
            let handle = self.get(id);
            if handle.hash == hash && handle.term() == Some(term) {
                return Ok(id);
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
        self.slots = vec![0; old_len * 2];
        // The default graph handle is never hashed.
        for (slot, handle) in (1_u32..).zip(&self.handles).skip(1) {
            let position = self.vacant_slot(handle.hash);
            self.slots[position] = slot;
        }
        debug!(
            "Rehashed term handle table from {} to {} slots ({} handles) in {:?}",
            old_len,
            self.slots.len(),
            self.handles.len(),
            start.elapsed()
        );
    }
}

fn hash_term(term: TermRef<'_>) -> u64 {
    let mut hasher = FxHasher::default();
    term.hash(&mut hasher);
    hasher.finish()
}

#[allow(clippy::cast_possible_truncation, reason = "Only the low bits select the slot")]
fn slot_position(hash: u64, mask: usize) -> usize {
    hash as usize & mask
}
