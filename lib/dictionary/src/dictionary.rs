use crate::cache::ShardedCache;
use crate::code::{Code, CodedQuad};
use crate::config::DictionaryConfig;
use crate::hash::{hash_code, hash_term};
use crate::indexed::{IndexedTerms, PendingRecord, Record, TermKey, TermKind};
use crate::intern::{InternTable, INTERN_CAPACITY};
use crate::metrics::{DictionaryMetrics, MetricsSnapshot, Resolution};
use crate::packing::{datatype_for_index, pack, packable_datatype, unpack, PACKABLE_DATATYPES};
use rdf_pipe_common::error::{CorruptionError, DictionaryError};
use rdf_pipe_common::QuadComponent;
use rdf_pipe_model::vocab::xsd;
use rdf_pipe_model::{
    split_iri, BlankNode, GraphName, GraphNameRef, Literal, NamedNode, Quad, QuadRef, Subject,
    Term, TermRef,
};
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// A bidirectional mapping between RDF terms and 32-bit [codes](Code).
///
/// Encoding the same term twice yields the same code and decoding a code yields the term it was
/// created from. Codes are only meaningful for the dictionary that issued them.
///
/// # Encoding
///
/// Literals of numeric, boolean and date datatypes whose value fits into 24 bits are packed into
/// the code itself. All other terms are decomposed into a kind, an index into one of the
/// interning tables (namespaces, languages, datatypes) and a string. The decomposed term is
/// appended to an arena and its code is derived from the position of the record. Two caches
/// short-cut the work for hot terms and codes.
///
/// # Concurrency
///
/// All operations take `&self` and may be called from many threads. The caches are guarded by
/// a pool of locks and the arenas by a single [RwLock] that is only held for writing while a
/// record, serialized beforehand, is copied into place.
pub struct TermDictionary {
    config: DictionaryConfig,
    namespaces: RwLock<InternTable>,
    languages: RwLock<InternTable>,
    datatypes: RwLock<InternTable>,
    terms: RwLock<IndexedTerms>,
    encode_cache: ShardedCache<Term, Code>,
    decode_cache: ShardedCache<Code, Term>,
    metrics: Arc<DictionaryMetrics>,
    namespaces_exhausted: AtomicBool,
}

impl TermDictionary {
    /// Creates a dictionary with the default configuration and its own metrics.
    pub fn new() -> Self {
        Self::with_config(DictionaryConfig::default(), Arc::default())
    }

    /// Creates a dictionary that records its calls in `metrics`.
    pub fn with_config(config: DictionaryConfig, metrics: Arc<DictionaryMetrics>) -> Self {
        let datatypes = PACKABLE_DATATYPES
            .iter()
            .map(|(datatype, _)| datatype.as_str())
            .chain([xsd::STRING.as_str()]);
        let datatypes = InternTable::with_entries("datatype", datatypes)
            .unwrap_or_else(|_| unreachable!("The predefined datatypes fit into an empty table"));
        Self {
            namespaces: RwLock::new(InternTable::new("namespace")),
            languages: RwLock::new(InternTable::new("language")),
            datatypes: RwLock::new(datatypes),
            terms: RwLock::new(IndexedTerms::new(
                config.initial_table_capacity(),
                config.primary_limit(),
            )),
            encode_cache: ShardedCache::new(
                config.encode_cache_capacity(),
                config.cache_lock_count(),
            ),
            decode_cache: ShardedCache::new(
                config.decode_cache_capacity(),
                config.cache_lock_count(),
            ),
            config,
            metrics,
            namespaces_exhausted: AtomicBool::new(false),
        }
    }

    /// Returns the configuration of this dictionary.
    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    /// Returns the counters this dictionary records its calls in.
    pub fn metrics(&self) -> &Arc<DictionaryMetrics> {
        &self.metrics
    }

    /// Returns the code of `term`, assigning a new one if the term has not been seen yet.
    ///
    /// Fails only if the dictionary cannot hold any more terms, in which case every further
    /// attempt to add a term fails as well.
    pub fn encode(&self, term: TermRef<'_>) -> Result<Code, DictionaryError> {
        if let Some(code) = encode_embedded(term) {
            self.metrics.record_encode(Resolution::Embedded);
            return Ok(code);
        }

        let hash = hash_term(term);
        if let Some(code) = self.encode_cache.get(hash, |cached| cached.as_ref() == term) {
            self.metrics.record_encode(Resolution::Cached);
            return Ok(code);
        }

        let key = self.term_key(term)?;
        let key_hash = key.hash();
        let existing = read(&self.terms).find(&key, key_hash);
        let code = match existing {
            Some(code) => code,
            None => {
                let record = PendingRecord::new(&key, self.config.inline_string_limit())?;
                write(&self.terms).insert(&key, key_hash, &record)?
            }
        };

        self.encode_cache.insert(hash, term.into_owned(), code);
        self.metrics.record_encode(Resolution::Indexed);
        Ok(code)
    }

    /// Returns the code of `term` if it has one already. Never assigns a new code.
    pub fn try_encode(&self, term: TermRef<'_>) -> Option<Code> {
        if let Some(code) = encode_embedded(term) {
            self.metrics.record_encode(Resolution::Embedded);
            return Some(code);
        }

        let hash = hash_term(term);
        if let Some(code) = self.encode_cache.get(hash, |cached| cached.as_ref() == term) {
            self.metrics.record_encode(Resolution::Cached);
            return Some(code);
        }

        let key = self.existing_term_key(term)?;
        let code = read(&self.terms).find(&key, key.hash())?;
        self.encode_cache.insert(hash, term.into_owned(), code);
        self.metrics.record_encode(Resolution::Indexed);
        Some(code)
    }

    /// Returns the term `code` stands for.
    ///
    /// Returns [DictionaryError::UnknownCode] for [Code::NULL] and for codes not issued by this
    /// dictionary.
    pub fn decode(&self, code: Code) -> Result<Term, DictionaryError> {
        if code.is_embedded() {
            self.metrics.record_decode(Resolution::Embedded);
            return decode_embedded(code);
        }
        if !code.is_indexed() {
            return Err(DictionaryError::UnknownCode(code.as_u32()));
        }

        let hash = hash_code(code.as_u32());
        if let Some(term) = self.decode_cache.get(hash, |cached| *cached == code) {
            self.metrics.record_decode(Resolution::Cached);
            return Ok(term);
        }

        let record = read(&self.terms).read(code)?;
        let term = self.build_term(record)?;
        self.decode_cache.insert(hash, code, term.clone());
        self.metrics.record_decode(Resolution::Indexed);
        Ok(term)
    }

    /// Encodes a graph name, mapping the default graph to [Code::NULL].
    pub fn encode_graph_name(&self, graph_name: GraphNameRef<'_>) -> Result<Code, DictionaryError> {
        match graph_name {
            GraphNameRef::NamedNode(node) => self.encode(node.into()),
            GraphNameRef::BlankNode(node) => self.encode(node.into()),
            GraphNameRef::DefaultGraph => Ok(Code::NULL),
        }
    }

    /// Decodes a graph name, mapping [Code::NULL] to the default graph.
    pub fn decode_graph_name(&self, code: Code) -> Result<GraphName, DictionaryError> {
        if code.is_null() {
            return Ok(GraphName::DefaultGraph);
        }
        match self.decode(code)? {
            Term::NamedNode(node) => Ok(node.into()),
            Term::BlankNode(node) => Ok(node.into()),
            Term::Literal(literal) => Err(unexpected_term(
                QuadComponent::GraphName,
                "an IRI or a blank node",
                &literal.into(),
            )),
        }
    }

    pub fn encode_quad(&self, quad: QuadRef<'_>) -> Result<CodedQuad, DictionaryError> {
        Ok(CodedQuad {
            subject: self.encode(quad.subject.into())?,
            predicate: self.encode(quad.predicate.into())?,
            object: self.encode(quad.object)?,
            graph_name: self.encode_graph_name(quad.graph_name)?,
        })
    }

    /// Decodes the four components of `quad`, checking that each is allowed at its position.
    pub fn decode_quad(&self, quad: CodedQuad) -> Result<Quad, DictionaryError> {
        let subject = match self.decode(quad.subject)? {
            Term::NamedNode(node) => Subject::NamedNode(node),
            Term::BlankNode(node) => Subject::BlankNode(node),
            other => {
                return Err(unexpected_term(
                    QuadComponent::Subject,
                    "an IRI or a blank node",
                    &other,
                ))
            }
        };
        let predicate = match self.decode(quad.predicate)? {
            Term::NamedNode(node) => node,
            other => return Err(unexpected_term(QuadComponent::Predicate, "an IRI", &other)),
        };
        Ok(Quad {
            subject,
            predicate,
            object: self.decode(quad.object)?,
            graph_name: self.decode_graph_name(quad.graph_name)?,
        })
    }

    /// Returns whether `code` stands for a literal.
    pub fn is_literal(&self, code: Code) -> Result<bool, DictionaryError> {
        Ok(self.kind_of(code)?.is_some_and(TermKind::is_literal))
    }

    /// Returns whether `code` stands for an IRI.
    pub fn is_iri(&self, code: Code) -> Result<bool, DictionaryError> {
        Ok(self.kind_of(code)?.is_some_and(TermKind::is_iri))
    }

    /// Returns whether `code` stands for a blank node.
    pub fn is_blank_node(&self, code: Code) -> Result<bool, DictionaryError> {
        Ok(self.kind_of(code)? == Some(TermKind::BlankNode))
    }

    /// Returns whether `code` stands for an IRI or a blank node.
    pub fn is_resource(&self, code: Code) -> Result<bool, DictionaryError> {
        Ok(self.kind_of(code)?.is_some_and(|kind| !kind.is_literal()))
    }

    /// Creates an independent copy of this dictionary.
    ///
    /// Codes issued so far decode identically in both dictionaries. Afterwards, each dictionary
    /// assigns codes on its own. The arenas written so far are shared and copied lazily, chunk by
    /// chunk, once either side writes into a shared chunk. The fork starts with empty caches and
    /// its own metrics.
    #[must_use]
    pub fn fork(&self) -> Self {
        let terms = read(&self.terms).clone();
        debug!("Forking term dictionary with {} values", terms.len());
        Self {
            config: self.config.clone(),
            namespaces: RwLock::new(read(&self.namespaces).clone()),
            languages: RwLock::new(read(&self.languages).clone()),
            datatypes: RwLock::new(read(&self.datatypes).clone()),
            terms: RwLock::new(terms),
            encode_cache: ShardedCache::new(
                self.config.encode_cache_capacity(),
                self.config.cache_lock_count(),
            ),
            decode_cache: ShardedCache::new(
                self.config.decode_cache_capacity(),
                self.config.cache_lock_count(),
            ),
            metrics: Arc::default(),
            namespaces_exhausted: AtomicBool::new(
                self.namespaces_exhausted.load(Ordering::Relaxed),
            ),
        }
    }

    pub fn stats(&self) -> DictionaryStats {
        let terms = read(&self.terms);
        DictionaryStats {
            namespaces: read(&self.namespaces).len(),
            languages: read(&self.languages).len(),
            datatypes: read(&self.datatypes).len(),
            values: terms.len(),
            table_bytes: terms.table_bytes(),
            primary_bytes: terms.primary_bytes(),
            secondary_bytes: terms.secondary_bytes(),
            calls: self.metrics.snapshot(),
        }
    }

    fn kind_of(&self, code: Code) -> Result<Option<TermKind>, DictionaryError> {
        if code.is_null() {
            Ok(None)
        } else if code.is_embedded() {
            datatype_for_index(code.embedded_parts().0)
                .map(|_| Some(TermKind::TypedLiteral))
                .ok_or(DictionaryError::UnknownCode(code.as_u32()))
        } else {
            read(&self.terms).kind_of(code).map(Some)
        }
    }

    /// Decomposes `term`, interning its namespace, language or datatype as necessary.
    fn term_key<'a>(&self, term: TermRef<'a>) -> Result<TermKey<'a>, DictionaryError> {
        Ok(match term {
            TermRef::NamedNode(node) => {
                let iri = node.as_str();
                match split_iri(iri) {
                    Some((namespace, local_name)) => match self.intern_namespace(namespace) {
                        Some(index) => key(TermKind::NamespacedIri, index, local_name),
                        None => key(TermKind::Iri, 0, iri),
                    },
                    None => key(TermKind::Iri, 0, iri),
                }
            }
            TermRef::BlankNode(node) => key(TermKind::BlankNode, 0, node.as_str()),
            TermRef::Literal(literal) => {
                if let Some(language) = literal.language() {
                    let index = intern(&self.languages, language)?;
                    key(TermKind::LanguageLiteral, index, literal.value())
                } else if literal.datatype() == xsd::STRING {
                    key(TermKind::SimpleLiteral, 0, literal.value())
                } else {
                    let index = intern(&self.datatypes, literal.datatype().as_str())?;
                    key(TermKind::TypedLiteral, index, literal.value())
                }
            }
        })
    }

    /// Decomposes `term` without interning anything. Returns [None] if a part of the term is
    /// unknown, as the term cannot have been encoded then.
    fn existing_term_key<'a>(&self, term: TermRef<'a>) -> Option<TermKey<'a>> {
        Some(match term {
            TermRef::NamedNode(node) => {
                let iri = node.as_str();
                // An IRI whose namespace is unknown was stored as a whole, if at all.
                let namespaced = split_iri(iri).and_then(|(namespace, local_name)| {
                    Some((read(&self.namespaces).get(namespace)?, local_name))
                });
                match namespaced {
                    Some((index, local_name)) => key(TermKind::NamespacedIri, index, local_name),
                    None => key(TermKind::Iri, 0, iri),
                }
            }
            TermRef::BlankNode(node) => key(TermKind::BlankNode, 0, node.as_str()),
            TermRef::Literal(literal) => {
                if let Some(language) = literal.language() {
                    let index = read(&self.languages).get(language)?;
                    key(TermKind::LanguageLiteral, index, literal.value())
                } else if literal.datatype() == xsd::STRING {
                    key(TermKind::SimpleLiteral, 0, literal.value())
                } else {
                    let index = read(&self.datatypes).get(literal.datatype().as_str())?;
                    key(TermKind::TypedLiteral, index, literal.value())
                }
            }
        })
    }

    /// Interns a namespace. Once the namespace table is full, IRIs with a new namespace are
    /// stored as a whole.
    fn intern_namespace(&self, namespace: &str) -> Option<u16> {
        if let Some(index) = read(&self.namespaces).get(namespace) {
            return Some(index);
        }
        let index = write(&self.namespaces).try_insert(namespace);
        if index.is_none() && !self.namespaces_exhausted.swap(true, Ordering::Relaxed) {
            warn!(
                "The namespace table is full ({} entries), IRIs with new namespaces are stored as a whole",
                INTERN_CAPACITY
            );
        }
        index
    }

    fn build_term(&self, record: Record) -> Result<Term, DictionaryError> {
        let Record { kind, index, value } = record;
        Ok(match kind {
            TermKind::Iri => NamedNode::new_unchecked(value).into(),
            TermKind::NamespacedIri => {
                let namespace = resolve(&self.namespaces, index)?;
                NamedNode::new_unchecked(format!("{namespace}{value}")).into()
            }
            TermKind::BlankNode => BlankNode::new_unchecked(value).into(),
            TermKind::SimpleLiteral => Literal::new_simple_literal(value).into(),
            TermKind::LanguageLiteral => {
                let language = resolve(&self.languages, index)?;
                Literal::new_language_tagged_literal_unchecked(value, &*language).into()
            }
            TermKind::TypedLiteral => {
                let datatype = resolve(&self.datatypes, index)?;
                Literal::new_typed_literal(value, NamedNode::new_unchecked(&*datatype)).into()
            }
        })
    }
}

impl Default for TermDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TermDictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermDictionary")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Display for TermDictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.stats(), f)
    }
}

/// Sizes and call counts of a [TermDictionary].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DictionaryStats {
    pub namespaces: usize,
    pub languages: usize,
    /// Includes the datatypes every dictionary starts with.
    pub datatypes: usize,
    /// The number of terms in the indexed region.
    pub values: usize,
    pub table_bytes: usize,
    pub primary_bytes: u64,
    pub secondary_bytes: u64,
    pub calls: MetricsSnapshot,
}

impl Display for DictionaryStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} namespaces, {} languages, {} datatypes, {} values, {} table bytes, \
             {} primary bytes, {} secondary bytes, {}",
            self.namespaces,
            self.languages,
            self.datatypes,
            self.values,
            self.table_bytes,
            self.primary_bytes,
            self.secondary_bytes,
            self.calls
        )
    }
}

fn encode_embedded(term: TermRef<'_>) -> Option<Code> {
    let TermRef::Literal(literal) = term else {
        return None;
    };
    if literal.language().is_some() {
        return None;
    }
    let (index, kind) = packable_datatype(literal.datatype())?;
    pack(kind, literal.value()).map(|payload| Code::embedded(index, payload))
}

fn decode_embedded(code: Code) -> Result<Term, DictionaryError> {
    let (index, payload) = code.embedded_parts();
    let (datatype, kind) =
        datatype_for_index(index).ok_or(DictionaryError::UnknownCode(code.as_u32()))?;
    let label = unpack(kind, payload).ok_or(DictionaryError::UnknownCode(code.as_u32()))?;
    Ok(Literal::new_typed_literal(label, datatype).into())
}

fn key(kind: TermKind, index: u16, value: &str) -> TermKey<'_> {
    TermKey { kind, index, value }
}

fn intern(table: &RwLock<InternTable>, value: &str) -> Result<u16, DictionaryError> {
    if let Some(index) = read(table).get(value) {
        return Ok(index);
    }
    write(table).get_or_insert(value)
}

fn resolve(table: &RwLock<InternTable>, index: u16) -> Result<Arc<str>, DictionaryError> {
    read(table).resolve(index).cloned().ok_or_else(|| {
        CorruptionError::msg(format!("A record refers to the unknown table index {index}"))
            .into()
    })
}

fn unexpected_term(
    component: QuadComponent,
    expected: &'static str,
    found: &Term,
) -> DictionaryError {
    DictionaryError::UnexpectedTerm {
        component,
        expected,
        found: found.to_string(),
    }
}

// The guarded structures are only mutated after all fallible steps succeeded.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
