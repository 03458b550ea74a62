use crate::QuadComponent;

/// An error raised by the term dictionary.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DictionaryError {
    /// The byte arena of the given region cannot address more data. The dictionary cannot accept
    /// any more distinct terms.
    #[error("The {region} arena of the term dictionary is exhausted ({limit} bytes)")]
    Exhausted { region: &'static str, limit: u64 },
    /// An interning table reached its capacity.
    #[error("The {table} table of the term dictionary is full ({capacity} entries)")]
    TableFull {
        table: &'static str,
        capacity: usize,
    },
    /// The code was not issued by this dictionary.
    #[error("The code {0:#010x} was not issued by this dictionary")]
    UnknownCode(u32),
    /// A decoded term is not allowed at its position in a quad.
    #[error("Expected {expected} as the {component} of a quad, found {found}")]
    UnexpectedTerm {
        component: QuadComponent,
        expected: &'static str,
        found: String,
    },
    /// Error related to data corruption.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
}

impl DictionaryError {
    /// Returns whether the dictionary that raised this error can no longer accept new terms.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DictionaryError::Exhausted { .. } | DictionaryError::TableFull { .. }
        )
    }
}

/// An error raised by the in-memory quad store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The store cannot hold more terms or statements.
    #[error("The quad store cannot hold more than {limit} {what}")]
    CapacityExceeded { what: &'static str, limit: usize },
    /// A pattern that was expected to have at most one object has several.
    #[error("Expected at most one object, found {first} and {second}")]
    AmbiguousObject { first: String, second: String },
    /// The object of a pattern is not of the requested kind.
    #[error("Expected {expected} as object, found {found}")]
    UnexpectedObject {
        expected: &'static str,
        found: String,
    },
    /// Error related to data corruption.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
}

impl StoreError {
    /// Returns whether the store that raised this error can no longer accept new statements.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::CapacityExceeded { .. })
    }
}

/// An error return if some internal structure is corrupted.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CorruptionError(String);

impl CorruptionError {
    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
