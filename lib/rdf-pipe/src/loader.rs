use crate::error::PipelineError;
use rdf_pipe_dictionary::QuadHandler;
use rdf_pipe_model::QuadRef;
use rdf_pipe_storage::memory::QuadStore;
use tracing::debug;

/// A [`QuadHandler`] that inserts every quad it receives into a [`QuadStore`].
///
/// Put it behind a [`DecodingHandler`](crate::dictionary::DecodingHandler) to load coded quads.
#[derive(Debug)]
pub struct StoreLoader<'s> {
    store: &'s mut QuadStore,
    loaded: usize,
}

impl<'s> StoreLoader<'s> {
    pub fn new(store: &'s mut QuadStore) -> Self {
        Self { store, loaded: 0 }
    }

    /// The number of received quads that were not already in the store.
    pub fn loaded(&self) -> usize {
        self.loaded
    }
}

impl QuadHandler for StoreLoader<'_> {
    type Error = PipelineError;

    fn handle(&mut self, quad: QuadRef<'_>) -> Result<(), Self::Error> {
        if self.store.insert(quad)? {
            self.loaded += 1;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        debug!("Loaded {} new quads, the store now holds {}", self.loaded, self.store.len());
        Ok(())
    }
}
