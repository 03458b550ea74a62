/// Returns the index at which the local name of `iri` starts.
///
/// The local name is whatever follows the last `#`. If there is none, it follows the last `/`,
/// and failing that the last `:`. An IRI without any of these separators has no namespace and
/// the returned index is `0`.
pub fn local_name_index(iri: &str) -> usize {
    iri.rfind('#')
        .or_else(|| iri.rfind('/'))
        .or_else(|| iri.rfind(':'))
        .map_or(0, |separator| separator + 1)
}

/// Splits `iri` into its namespace and local name.
///
/// Returns [None] if either part would be empty, in which case the IRI cannot profit from
/// namespace interning and should be stored as a whole.
pub fn split_iri(iri: &str) -> Option<(&str, &str)> {
    let index = local_name_index(iri);
    if index == 0 || index == iri.len() {
        return None;
    }
    Some(iri.split_at(index))
}
