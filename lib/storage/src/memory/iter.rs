use crate::memory::planner::Walk;
use crate::memory::statements::StatementId;
use crate::memory::store::QuadStore;
use rdf_pipe_model::QuadRef;
use std::fmt::{Debug, Formatter};

/// An iterator over the statements of a [QuadStore] matching a pattern.
///
/// Created by [QuadStore::iter].
pub struct QuadIter<'a> {
    store: &'a QuadStore,
    walk: Walk,
}

impl<'a> QuadIter<'a> {
    pub(super) fn new(store: &'a QuadStore, walk: Walk) -> Self {
        Self { store, walk }
    }
}

impl<'a> Iterator for QuadIter<'a> {
    type Item = QuadRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self
            .walk
            .advance(&self.store.handles, &self.store.statements)?;
        Some(self.store.quad(id))
    }
}

impl Debug for QuadIter<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadIter")
            .field("walk", &self.walk)
            .finish_non_exhaustive()
    }
}

/// A walk over the statements of a [QuadStore] matching a pattern that can remove the statement
/// it stands on.
///
/// The cursor borrows the store mutably, hence nothing else can change the store during the
/// walk. Created by [QuadStore::cursor].
pub struct QuadCursor<'a> {
    store: &'a mut QuadStore,
    walk: Walk,
    current: Option<StatementId>,
}

impl<'a> QuadCursor<'a> {
    pub(super) fn new(store: &'a mut QuadStore, walk: Walk) -> Self {
        Self {
            store,
            walk,
            current: None,
        }
    }

    /// Moves to the next matching statement and returns it.
    pub fn next_quad(&mut self) -> Option<QuadRef<'_>> {
        self.current = self
            .walk
            .advance(&self.store.handles, &self.store.statements);
        self.current.map(|id| self.store.quad(id))
    }

    /// Removes the statement returned by the last call to [Self::next_quad].
    ///
    /// Returns `false` if there is no such statement or it has already been removed.
    pub fn remove(&mut self) -> bool {
        match self.current.take() {
            // The walk has already read the links of the removed record. Records unlinked by a
            // sweep keep their links and are not reused while the cursor exists.
            Some(id) => self.store.remove_statement(id),
            None => false,
        }
    }
}

impl Debug for QuadCursor<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadCursor")
            .field("walk", &self.walk)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
