use rdf_pipe_model::TermRef;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

pub(crate) fn hash_str(value: &str) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

pub(crate) fn hash_term(term: TermRef<'_>) -> u64 {
    let mut hasher = FxHasher::default();
    term.hash(&mut hasher);
    hasher.finish()
}

/// Spreads the bits of a code so that consecutive codes land in distant cache slots.
pub(crate) fn hash_code(code: u32) -> u64 {
    let mut x = code;
    x = ((x >> 16) ^ x).wrapping_mul(0x045d_9f3b);
    x = ((x >> 16) ^ x).wrapping_mul(0x045d_9f3b);
    u64::from((x >> 16) ^ x)
}
