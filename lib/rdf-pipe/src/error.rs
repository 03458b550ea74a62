pub use rdf_pipe_common::error::{CorruptionError, DictionaryError, StoreError};

/// An error raised while moving quads between a
/// [`TermDictionary`](crate::dictionary::TermDictionary) and a
/// [`QuadStore`](crate::storage::memory::QuadStore).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An error raised while encoding or decoding a term.
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    /// An error raised while inserting into the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Returns whether the component that raised this error can no longer accept new data.
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::Dictionary(error) => error.is_fatal(),
            PipelineError::Store(error) => error.is_fatal(),
        }
    }
}
