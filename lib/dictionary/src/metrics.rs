use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// How a code or term was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Packed into or unpacked from the code itself.
    Embedded,
    /// Found in one of the caches.
    Cached,
    /// Looked up in (or added to) the indexed term table.
    Indexed,
}

/// Counters of encode and decode calls, broken down by [how they were resolved](Resolution).
///
/// The counters are handed to a [TermDictionary](crate::TermDictionary) at construction. Sharing
/// one instance between several dictionaries aggregates their calls.
#[derive(Debug, Default)]
pub struct DictionaryMetrics {
    encode: [AtomicU64; 3],
    decode: [AtomicU64; 3],
}

impl DictionaryMetrics {
    pub(crate) fn record_encode(&self, resolution: Resolution) {
        self.encode[resolution as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode(&self, resolution: Resolution) {
        self.decode[resolution as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            encode_embedded: load(&self.encode[Resolution::Embedded as usize]),
            encode_cached: load(&self.encode[Resolution::Cached as usize]),
            encode_indexed: load(&self.encode[Resolution::Indexed as usize]),
            decode_embedded: load(&self.decode[Resolution::Embedded as usize]),
            decode_cached: load(&self.decode[Resolution::Cached as usize]),
            decode_indexed: load(&self.decode[Resolution::Indexed as usize]),
        }
    }
}

/// A point-in-time copy of [DictionaryMetrics].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub encode_embedded: u64,
    pub encode_cached: u64,
    pub encode_indexed: u64,
    pub decode_embedded: u64,
    pub decode_cached: u64,
    pub decode_indexed: u64,
}

impl MetricsSnapshot {
    pub fn encode_calls(&self) -> u64 {
        self.encode_embedded + self.encode_cached + self.encode_indexed
    }

    pub fn decode_calls(&self) -> u64 {
        self.decode_embedded + self.decode_cached + self.decode_indexed
    }
}

impl Display for MetricsSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} encode calls ({} embedded, {} cached, {} indexed), \
             {} decode calls ({} embedded, {} cached, {} indexed)",
            self.encode_calls(),
            self.encode_embedded,
            self.encode_cached,
            self.encode_indexed,
            self.decode_calls(),
            self.decode_embedded,
            self.decode_cached,
            self.decode_indexed
        )
    }
}
