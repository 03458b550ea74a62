use crate::code::Code;

/// Options for creating a [TermDictionary](crate::TermDictionary).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictionaryConfig {
    initial_table_capacity: usize,
    encode_cache_capacity: usize,
    decode_cache_capacity: usize,
    cache_lock_count: usize,
    inline_string_limit: usize,
    primary_limit: u64,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            initial_table_capacity: 512,
            encode_cache_capacity: 1023,
            decode_cache_capacity: 1023,
            cache_lock_count: 63,
            inline_string_limit: 127,
            primary_limit: Code::max_offset(),
        }
    }
}

impl DictionaryConfig {
    /// The initial number of slots of the term hash table, rounded up to a power of two.
    #[must_use]
    pub fn with_initial_table_capacity(mut self, capacity: usize) -> Self {
        self.initial_table_capacity = capacity;
        self
    }

    /// The number of slots of the encode cache. Zero disables the cache.
    #[must_use]
    pub fn with_encode_cache_capacity(mut self, capacity: usize) -> Self {
        self.encode_cache_capacity = capacity;
        self
    }

    /// The number of slots of the decode cache. Zero disables the cache.
    #[must_use]
    pub fn with_decode_cache_capacity(mut self, capacity: usize) -> Self {
        self.decode_cache_capacity = capacity;
        self
    }

    /// The number of locks guarding the slots of each cache.
    #[must_use]
    pub fn with_cache_lock_count(mut self, lock_count: usize) -> Self {
        self.cache_lock_count = lock_count;
        self
    }

    /// Strings of up to this many bytes are stored within their record. Longer strings are
    /// spilled into the secondary arena. At most 255.
    #[must_use]
    pub fn with_inline_string_limit(mut self, limit: usize) -> Self {
        self.inline_string_limit = limit.min(usize::from(u8::MAX));
        self
    }

    /// Caps the size of the primary arena. Once reached, encoding a new term fails.
    #[must_use]
    pub fn with_primary_limit(mut self, limit: u64) -> Self {
        self.primary_limit = limit;
        self
    }

    pub fn initial_table_capacity(&self) -> usize {
        self.initial_table_capacity
    }

    pub fn encode_cache_capacity(&self) -> usize {
        self.encode_cache_capacity
    }

    pub fn decode_cache_capacity(&self) -> usize {
        self.decode_cache_capacity
    }

    pub fn cache_lock_count(&self) -> usize {
        self.cache_lock_count
    }

    pub fn inline_string_limit(&self) -> usize {
        self.inline_string_limit
    }

    pub fn primary_limit(&self) -> u64 {
        self.primary_limit
    }
}
