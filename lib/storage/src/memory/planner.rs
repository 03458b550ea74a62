use crate::memory::handles::{HandleId, HandleTable};
use crate::memory::statements::{StatementId, StatementTable, NIL};
use itertools::Itertools;
use rdf_pipe_model::{GraphNameRef, NamedNodeRef, QuadRef, SubjectRef, TermRef};

/// A quad pattern. Unbound components match anything.
///
/// An empty list of contexts matches any graph. Otherwise, the pattern matches the statements
/// in any of the given graphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuadPattern<'a> {
    pub subject: Option<SubjectRef<'a>>,
    pub predicate: Option<NamedNodeRef<'a>>,
    pub object: Option<TermRef<'a>>,
    pub contexts: &'a [GraphNameRef<'a>],
}

impl<'a> QuadPattern<'a> {
    /// A pattern matching every statement.
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<SubjectRef<'a>>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<NamedNodeRef<'a>>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<TermRef<'a>>) -> Self {
        self.object = Some(object.into());
        self
    }

    #[must_use]
    pub fn in_contexts(mut self, contexts: &'a [GraphNameRef<'a>]) -> Self {
        self.contexts = contexts;
        self
    }

    /// Returns whether no component is bound.
    pub fn is_wildcard(&self) -> bool {
        self.subject.is_none()
            && self.predicate.is_none()
            && self.object.is_none()
            && self.contexts.is_empty()
    }

    /// Returns whether `quad` matches this pattern.
    pub fn matches(&self, quad: QuadRef<'_>) -> bool {
        self.subject.map_or(true, |s| s == quad.subject)
            && self.predicate.map_or(true, |p| p == quad.predicate)
            && self.object.map_or(true, |o| o == quad.object)
            && (self.contexts.is_empty() || self.contexts.contains(&quad.graph_name))
    }
}

/// The handles of a pattern restricted to one context. [None] is unbound.
pub(super) type Bindings = [Option<HandleId>; 4];

/// Resolves a pattern into one [Bindings] per distinct context.
///
/// Terms are only looked up, never created. An unknown term in any position, or only unknown
/// contexts, yield no bindings at all, as no statement can match them.
pub(super) fn resolve(pattern: &QuadPattern<'_>, handles: &HandleTable) -> Vec<Bindings> {
    fn bind<T>(
        term: Option<T>,
        lookup: impl FnOnce(T) -> Option<HandleId>,
    ) -> Option<Option<HandleId>> {
        match term {
            Some(term) => lookup(term).map(Some),
            None => Some(None),
        }
    }

    let Some(subject) = bind(pattern.subject, |s| handles.lookup(s.into())) else {
        return Vec::new();
    };
    let Some(predicate) = bind(pattern.predicate, |p| handles.lookup(p.into())) else {
        return Vec::new();
    };
    let Some(object) = bind(pattern.object, |o| handles.lookup(o)) else {
        return Vec::new();
    };

    if pattern.contexts.is_empty() {
        return vec![[subject, predicate, object, None]];
    }
    pattern
        .contexts
        .iter()
        .filter_map(|context| handles.lookup_graph(*context))
        .unique()
        .map(|context| [subject, predicate, object, Some(context)])
        .collect()
}

/// How the statements of one [Bindings] are found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Access {
    /// Visit every record.
    Scan,
    /// Walk the list of `handle` in `position`.
    List { position: usize, head: StatementId },
}

/// Picks the bound position whose handle has the fewest live statements, or a full scan if
/// nothing is bound.
pub(super) fn choose_access(bindings: &Bindings, handles: &HandleTable) -> Access {
    bindings
        .iter()
        .enumerate()
        .filter_map(|(position, handle)| handle.map(|handle| (position, handles.get(handle))))
        .min_by_key(|(position, handle)| handle.counts[*position])
        .map_or(Access::Scan, |(position, handle)| Access::List {
            position,
            head: handle.heads[position],
        })
}

/// An upper bound of the statements matching `bindings`, computed from the position counters.
pub(super) fn estimate(
    bindings: &Bindings,
    handles: &HandleTable,
    statements: &StatementTable,
) -> usize {
    bindings
        .iter()
        .enumerate()
        .filter_map(|(position, handle)| handle.map(|handle| handles.get(handle).counts[position]))
        .min()
        .map_or(statements.live(), |count| count as usize)
}

/// The state of a walk over the statements matching a list of [Bindings], one after another.
///
/// The walk does not borrow the store. Callers pass the tables on every step, which allows a
/// cursor to remove statements between two steps.
#[derive(Debug)]
pub(super) struct Walk {
    legs: Vec<Bindings>,
    leg: usize,
    step: Step,
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Start,
    Scan { next: StatementId },
    List { position: usize, next: StatementId },
}

impl Walk {
    pub fn new(legs: Vec<Bindings>) -> Self {
        Self {
            legs,
            leg: 0,
            step: Step::Start,
        }
    }

    /// Returns the next matching statement.
    pub fn advance(
        &mut self,
        handles: &HandleTable,
        statements: &StatementTable,
    ) -> Option<StatementId> {
        loop {
            let bindings = self.legs.get(self.leg)?;
            let candidate = match &mut self.step {
                Step::Start => {
                    self.step = match choose_access(bindings, handles) {
                        Access::Scan => Step::Scan { next: 0 },
                        Access::List { position, head } => Step::List {
                            position,
                            next: head,
                        },
                    };
                    continue;
                }
                Step::Scan { next } => {
                    let current = *next;
                    ((current as usize) < statements.capacity()).then(|| {
                        *next += 1;
                        current
                    })
                }
                Step::List { position, next } => {
                    let current = *next;
                    (current != NIL).then(|| {
                        *next = statements.get(current).next[*position];
                        current
                    })
                }
            };
            match candidate {
                Some(id) => {
                    if statements.get(id).matches(bindings) {
                        return Some(id);
                    }
                }
                None => {
                    self.leg += 1;
                    self.step = Step::Start;
                }
            }
        }
    }
}
