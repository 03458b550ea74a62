/// Sizing of a [QuadStore](crate::memory::QuadStore).
///
/// Both tables grow on demand, the capacities only avoid rehashing while a store fills up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuadStoreConfig {
    initial_term_capacity: usize,
    initial_statement_capacity: usize,
}

impl Default for QuadStoreConfig {
    fn default() -> Self {
        Self {
            initial_term_capacity: 256,
            initial_statement_capacity: 256,
        }
    }
}

impl QuadStoreConfig {
    /// Sets the number of distinct terms the store can hold before it first rehashes.
    #[must_use]
    pub fn with_initial_term_capacity(mut self, capacity: usize) -> Self {
        self.initial_term_capacity = capacity;
        self
    }

    /// Sets the number of statements the store can hold before it first rehashes.
    #[must_use]
    pub fn with_initial_statement_capacity(mut self, capacity: usize) -> Self {
        self.initial_statement_capacity = capacity;
        self
    }

    pub fn initial_term_capacity(&self) -> usize {
        self.initial_term_capacity
    }

    pub fn initial_statement_capacity(&self) -> usize {
        self.initial_statement_capacity
    }
}
