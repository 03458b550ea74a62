use crate::memory::config::QuadStoreConfig;
use crate::memory::handles::{HandleId, HandleTable};
use crate::memory::iter::{QuadCursor, QuadIter};
use crate::memory::planner::{estimate, resolve, QuadPattern, Walk};
use crate::memory::statements::{StatementId, StatementTable};
use itertools::Itertools;
use rdf_pipe_common::error::StoreError;
use rdf_pipe_model::{
    GraphNameRef, LiteralRef, NamedNodeRef, NamedOrBlankNodeRef, Quad, QuadRef, SubjectRef,
    TermRef,
};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

/// An in-memory store of quads, indexed by all four positions.
///
/// Every distinct term is stored once, as a *handle*. For each position, a handle threads the
/// statements using it in this position into a list and counts them. A pattern lookup walks
/// the shortest list among the bound components and checks each statement against the whole
/// pattern. Without bound components, all statements are scanned.
///
/// The store is meant to be populated and queried by a single thread. Mutations require
/// `&mut self`, and [QuadCursor] is the only way to remove statements during a walk.
///
/// ```
/// use rdf_pipe_model::{GraphNameRef, NamedNodeRef};
/// use rdf_pipe_storage::memory::{QuadPattern, QuadStore};
///
/// let ex = NamedNodeRef::new_unchecked("http://example.com/a");
/// let mut store = QuadStore::new();
/// assert!(store.add(ex, ex, ex.into(), &[]).unwrap());
/// assert_eq!(store.size(&QuadPattern::any().with_subject(ex)), 1);
/// assert_eq!(
///     store.size(&QuadPattern::any().in_contexts(&[GraphNameRef::DefaultGraph])),
///     1
/// );
/// ```
pub struct QuadStore {
    config: QuadStoreConfig,
    pub(super) handles: HandleTable,
    pub(super) statements: StatementTable,
    namespaces: BTreeMap<String, String>,
}

impl QuadStore {
    /// Creates a new, empty [QuadStore].
    pub fn new() -> Self {
        Self::with_config(QuadStoreConfig::default())
    }

    /// Creates a new, empty [QuadStore] sized according to `config`.
    pub fn with_config(config: QuadStoreConfig) -> Self {
        Self {
            handles: HandleTable::new(config.initial_term_capacity()),
            statements: StatementTable::new(config.initial_statement_capacity()),
            namespaces: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &QuadStoreConfig {
        &self.config
    }

    /// Adds the statement `(subject, predicate, object)` to each of `contexts`, or to the default
    /// graph if `contexts` is empty.
    ///
    /// Returns whether the store changed.
    pub fn add<'a>(
        &mut self,
        subject: impl Into<SubjectRef<'a>>,
        predicate: impl Into<NamedNodeRef<'a>>,
        object: TermRef<'_>,
        contexts: &[GraphNameRef<'_>],
    ) -> Result<bool, StoreError> {
        let subject = self.handles.get_or_insert(subject.into().into())?;
        let predicate = self.handles.get_or_insert(predicate.into().into())?;
        let object = self.handles.get_or_insert(object)?;

        if contexts.is_empty() {
            return self.link(subject, predicate, object, GraphNameRef::DefaultGraph);
        }
        let mut changed = false;
        for context in contexts {
            changed |= self.link(subject, predicate, object, *context)?;
        }
        Ok(changed)
    }

    /// Adds `quad` to the store. Returns whether it was not already present.
    pub fn insert(&mut self, quad: QuadRef<'_>) -> Result<bool, StoreError> {
        self.add(quad.subject, quad.predicate, quad.object, &[quad.graph_name])
    }

    /// Adds all `quads` and returns how many of them were new.
    pub fn extend(
        &mut self,
        quads: impl IntoIterator<Item = impl Into<Quad>>,
    ) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for quad in quads {
            if self.insert(quad.into().as_ref())? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Removes all statements matching `pattern`. A pattern without any bound component clears
    /// the store.
    ///
    /// Returns whether the store changed.
    pub fn remove(&mut self, pattern: &QuadPattern<'_>) -> bool {
        if pattern.is_wildcard() {
            let changed = !self.is_empty();
            self.clear();
            return changed;
        }
        let matches = self.matching_ids(pattern);
        matches
            .into_iter()
            .fold(false, |changed, id| self.remove_statement(id) | changed)
    }

    /// Removes `quad` from the store. Returns whether it was present.
    pub fn remove_quad(&mut self, quad: QuadRef<'_>) -> bool {
        match self.find(quad) {
            Some(id) => self.remove_statement(id),
            None => false,
        }
    }

    /// Drops all statements. Terms already seen keep their handles.
    pub fn clear(&mut self) {
        self.statements.clear(&mut self.handles);
    }

    /// The number of statements in the store.
    pub fn len(&self) -> usize {
        self.statements.live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of statements matching `pattern`.
    pub fn size(&self, pattern: &QuadPattern<'_>) -> usize {
        if pattern.is_wildcard() {
            return self.len();
        }
        self.iter(pattern).count()
    }

    /// An upper bound of [Self::size] computed without visiting any statement.
    pub fn size_estimate(&self, pattern: &QuadPattern<'_>) -> usize {
        resolve(pattern, &self.handles)
            .iter()
            .map(|bindings| estimate(bindings, &self.handles, &self.statements))
            .sum()
    }

    pub fn contains(&self, quad: QuadRef<'_>) -> bool {
        self.find(quad).is_some()
    }

    /// Returns the statements matching `pattern`, in no particular order.
    pub fn iter(&self, pattern: &QuadPattern<'_>) -> QuadIter<'_> {
        QuadIter::new(self, Walk::new(resolve(pattern, &self.handles)))
    }

    /// Returns a cursor over the statements matching `pattern` that can remove them on the way.
    pub fn cursor(&mut self, pattern: &QuadPattern<'_>) -> QuadCursor<'_> {
        let walk = Walk::new(resolve(pattern, &self.handles));
        QuadCursor::new(self, walk)
    }

    /// The distinct subjects of the statements matching `pattern`.
    pub fn subjects(&self, pattern: &QuadPattern<'_>) -> impl Iterator<Item = SubjectRef<'_>> {
        self.iter(pattern).map(|quad| quad.subject).unique()
    }

    /// The distinct predicates of the statements matching `pattern`.
    pub fn predicates(
        &self,
        pattern: &QuadPattern<'_>,
    ) -> impl Iterator<Item = NamedNodeRef<'_>> {
        self.iter(pattern).map(|quad| quad.predicate).unique()
    }

    /// The distinct objects of the statements matching `pattern`.
    pub fn objects(&self, pattern: &QuadPattern<'_>) -> impl Iterator<Item = TermRef<'_>> {
        self.iter(pattern).map(|quad| quad.object).unique()
    }

    /// The distinct graphs of the statements matching `pattern`.
    pub fn contexts(
        &self,
        pattern: &QuadPattern<'_>,
    ) -> impl Iterator<Item = GraphNameRef<'_>> {
        self.iter(pattern).map(|quad| quad.graph_name).unique()
    }

    /// Returns the only object among the statements matching `pattern`.
    ///
    /// Several statements may share the object. Distinct objects are an error.
    pub fn object_value(
        &self,
        pattern: &QuadPattern<'_>,
    ) -> Result<Option<TermRef<'_>>, StoreError> {
        let mut objects = self.objects(pattern);
        let Some(first) = objects.next() else {
            return Ok(None);
        };
        match objects.next() {
            Some(second) => Err(StoreError::AmbiguousObject {
                first: first.to_string(),
                second: second.to_string(),
            }),
            None => Ok(Some(first)),
        }
    }

    /// Like [Self::object_value], but the object must be a literal.
    pub fn object_literal(
        &self,
        pattern: &QuadPattern<'_>,
    ) -> Result<Option<LiteralRef<'_>>, StoreError> {
        self.object_value(pattern)?
            .map(|object| match object {
                TermRef::Literal(literal) => Ok(literal),
                other => Err(unexpected_object("a literal", other)),
            })
            .transpose()
    }

    /// Like [Self::object_value], but the object must be an IRI or a blank node.
    pub fn object_resource(
        &self,
        pattern: &QuadPattern<'_>,
    ) -> Result<Option<NamedOrBlankNodeRef<'_>>, StoreError> {
        self.object_value(pattern)?
            .map(|object| match object {
                TermRef::NamedNode(node) => Ok(node.into()),
                TermRef::BlankNode(node) => Ok(node.into()),
                other => Err(unexpected_object("an IRI or a blank node", other)),
            })
            .transpose()
    }

    /// Like [Self::object_value], but the object must be an IRI.
    pub fn object_iri(
        &self,
        pattern: &QuadPattern<'_>,
    ) -> Result<Option<NamedNodeRef<'_>>, StoreError> {
        self.object_value(pattern)?
            .map(|object| match object {
                TermRef::NamedNode(node) => Ok(node),
                other => Err(unexpected_object("an IRI", other)),
            })
            .transpose()
    }

    /// Like [Self::object_value], but returns the string value of the object: the IRI, the
    /// blank node identifier or the lexical form of the literal.
    pub fn object_string(&self, pattern: &QuadPattern<'_>) -> Result<Option<&str>, StoreError> {
        Ok(self.object_value(pattern)?.map(|object| match object {
            TermRef::NamedNode(node) => node.as_str(),
            TermRef::BlankNode(node) => node.as_str(),
            TermRef::Literal(literal) => literal.value(),
        }))
    }

    /// Returns a new store holding copies of the statements matching `pattern`. The namespaces
    /// are copied as well.
    pub fn filter(&self, pattern: &QuadPattern<'_>) -> Result<QuadStore, StoreError> {
        let mut result = QuadStore::with_config(self.config.clone());
        for quad in self.iter(pattern) {
            result.insert(quad)?;
        }
        result.namespaces.clone_from(&self.namespaces);
        Ok(result)
    }

    /// The prefix to namespace mappings, ordered by prefix.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Maps `prefix` to `namespace` and returns the namespace it was mapped to before.
    pub fn set_namespace(
        &mut self,
        prefix: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Option<String> {
        self.namespaces.insert(prefix.into(), namespace.into())
    }

    pub fn remove_namespace(&mut self, prefix: &str) -> Option<String> {
        self.namespaces.remove(prefix)
    }

    /// Validates that all the store invariants held in the data.
    pub fn validate(&self) -> Result<(), StoreError> {
        Ok(self.statements.validate(&self.handles)?)
    }

    pub(super) fn quad(&self, id: StatementId) -> QuadRef<'_> {
        let [subject, predicate, object, graph_name] = self.statements.get(id).terms;
        QuadRef {
            subject: match self.handles.get(subject).term() {
                Some(TermRef::NamedNode(node)) => node.into(),
                Some(TermRef::BlankNode(node)) => node.into(),
                _ => unreachable!("Subjects are added as IRIs or blank nodes"),
            },
            predicate: match self.handles.get(predicate).term() {
                Some(TermRef::NamedNode(node)) => node,
                _ => unreachable!("Predicates are added as IRIs"),
            },
            object: match self.handles.get(object).term() {
                Some(term) => term,
                None => unreachable!("The default graph is never an object"),
            },
            graph_name: match self.handles.get(graph_name).graph_name() {
                Some(graph_name) => graph_name,
                None => unreachable!("Graph names are added as graph names"),
            },
        }
    }

    pub(super) fn remove_statement(&mut self, id: StatementId) -> bool {
        self.statements.remove(id, &mut self.handles)
    }

    fn link(
        &mut self,
        subject: HandleId,
        predicate: HandleId,
        object: HandleId,
        context: GraphNameRef<'_>,
    ) -> Result<bool, StoreError> {
        let context = self.handles.get_or_insert_graph(context)?;
        self.statements
            .insert([subject, predicate, object, context], &mut self.handles)
    }

    fn find(&self, quad: QuadRef<'_>) -> Option<StatementId> {
        let terms = [
            self.handles.lookup(quad.subject.into())?,
            self.handles.lookup(quad.predicate.into())?,
            self.handles.lookup(quad.object)?,
            self.handles.lookup_graph(quad.graph_name)?,
        ];
        self.statements.find(terms)
    }

    fn matching_ids(&self, pattern: &QuadPattern<'_>) -> Vec<StatementId> {
        let mut walk = Walk::new(resolve(pattern, &self.handles));
        std::iter::from_fn(|| walk.advance(&self.handles, &self.statements)).collect()
    }
}

impl Default for QuadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for QuadStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadStore")
            .field("config", &self.config)
            .field("len", &self.len())
            .field("terms", &(self.handles.len() - 1))
            .field("namespaces", &self.namespaces)
            .finish_non_exhaustive()
    }
}

/// Writes the statements as N-Quads lines, sorted to be independent of the insertion order.
impl Display for QuadStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let lines = self
            .iter(&QuadPattern::any())
            .map(|quad| quad.to_string())
            .sorted_unstable();
        for line in lines {
            writeln!(f, "{line} .")?;
        }
        Ok(())
    }
}

fn unexpected_object(expected: &'static str, found: TermRef<'_>) -> StoreError {
    StoreError::UnexpectedObject {
        expected,
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_pipe_model::vocab::rdf;
    use rdf_pipe_model::{BlankNodeRef, GraphName, Literal, NamedNode};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn add_to_several_contexts() {
        let mut store = QuadStore::new();
        let (s, g1, g2) = (ex("s"), ex("g1"), ex("g2"));
        let contexts = [GraphNameRef::from(g1.as_ref()), g2.as_ref().into()];

        assert!(store
            .add(s.as_ref(), rdf::TYPE, ex("C").as_ref().into(), &contexts)
            .unwrap());
        assert!(!store
            .add(s.as_ref(), rdf::TYPE, ex("C").as_ref().into(), &contexts)
            .unwrap());
        assert_eq!(store.len(), 2);
        assert_eq!(store.contexts(&QuadPattern::any()).count(), 2);
        store.validate().unwrap();
    }

    #[test]
    fn remove_with_unknown_terms_is_a_no_op() {
        let mut store = QuadStore::new();
        let s = ex("s");
        store.add(s.as_ref(), rdf::TYPE, s.as_ref().into(), &[]).unwrap();

        let unknown = ex("unknown");
        assert!(!store.remove(&QuadPattern::any().with_object(unknown.as_ref())));
        assert_eq!(store.len(), 1);
        assert_eq!(store.handles.len(), 3);
    }

    #[test]
    fn cursor_removes_while_walking() {
        let mut store = QuadStore::new();
        let s = ex("s");
        for i in 0..10 {
            store
                .add(s.as_ref(), rdf::VALUE, Literal::from(i).as_ref().into(), &[])
                .unwrap();
        }

        let pattern = QuadPattern::any().with_subject(s.as_ref());
        let mut cursor = store.cursor(&pattern);
        let mut seen = 0;
        while let Some(quad) = cursor.next_quad() {
            let even = match quad.object {
                TermRef::Literal(literal) => literal.value().parse::<i32>().unwrap() % 2 == 0,
                _ => panic!("Unexpected object"),
            };
            seen += 1;
            if even {
                assert!(cursor.remove());
                assert!(!cursor.remove());
            }
        }

        assert_eq!(seen, 10);
        assert_eq!(store.len(), 5);
        store.validate().unwrap();
    }

    #[test]
    fn re_adding_allocates_a_fresh_record() {
        let mut store = QuadStore::new();
        let quad = Quad::new(ex("s"), ex("p"), ex("o"), GraphName::DefaultGraph);

        assert!(store.insert(quad.as_ref()).unwrap());
        assert!(store.remove_quad(quad.as_ref()));
        assert!(!store.remove_quad(quad.as_ref()));
        assert!(store.insert(quad.as_ref()).unwrap());

        assert!(store.contains(quad.as_ref()));
        assert_eq!(store.len(), 1);
        store.validate().unwrap();
    }

    #[test]
    fn clear_keeps_handles() {
        let mut store = QuadStore::new();
        let b = BlankNodeRef::new_unchecked("b");
        store.add(b, rdf::TYPE, b.into(), &[]).unwrap();

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.handles.len(), 3);
        assert_eq!(store.iter(&QuadPattern::any().with_subject(b)).count(), 0);
        store.validate().unwrap();
    }
}
