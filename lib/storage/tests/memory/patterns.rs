use crate::{create_skewed_store, ex};
use insta::assert_snapshot;
use rdf_pipe_common::error::StoreError;
use rdf_pipe_model::vocab::rdf;
use rdf_pipe_model::{GraphNameRef, Literal, LiteralRef, NamedNodeRef, QuadRef, TermRef};
use rdf_pipe_storage::memory::{QuadPattern, QuadStore};

/// Collects the matches of `pattern` by filtering all statements, without any index.
fn brute_force<'a>(store: &'a QuadStore, pattern: &QuadPattern<'_>) -> Vec<QuadRef<'a>> {
    let mut result = store
        .iter(&QuadPattern::any())
        .filter(|quad| pattern.matches(*quad))
        .collect::<Vec<_>>();
    result.sort_by_key(ToString::to_string);
    result
}

fn sorted<'a>(quads: impl Iterator<Item = QuadRef<'a>>) -> Vec<QuadRef<'a>> {
    let mut result = quads.collect::<Vec<_>>();
    result.sort_by_key(ToString::to_string);
    result
}

#[test]
fn test_size_matches_iteration() {
    let store = create_skewed_store();
    let (s3, rare, common, o, g1, unknown) = (
        ex("s3"),
        ex("rare"),
        ex("common"),
        ex("o"),
        ex("g1"),
        ex("unknown"),
    );
    let seven = Literal::from(7);
    let g1_and_default = [GraphNameRef::from(g1.as_ref()), GraphNameRef::DefaultGraph];
    let only_unknown = [GraphNameRef::from(unknown.as_ref())];

    let patterns = [
        QuadPattern::any(),
        QuadPattern::any().with_subject(s3.as_ref()),
        QuadPattern::any().with_predicate(common.as_ref()),
        QuadPattern::any().with_object(seven.as_ref()),
        QuadPattern::any().with_object(o.as_ref()),
        QuadPattern::any().in_contexts(&g1_and_default),
        QuadPattern::any()
            .with_subject(s3.as_ref())
            .in_contexts(&g1_and_default),
        QuadPattern::any()
            .with_subject(rare.as_ref())
            .with_predicate(common.as_ref()),
        QuadPattern::any().with_subject(unknown.as_ref()),
        QuadPattern::any().in_contexts(&only_unknown),
    ];
    for pattern in &patterns {
        let expected = brute_force(&store, pattern);
        assert_eq!(store.size(pattern), expected.len(), "{pattern:?}");
        assert_eq!(sorted(store.iter(pattern)), expected, "{pattern:?}");
        assert!(store.size_estimate(pattern) >= expected.len(), "{pattern:?}");
    }
}

#[test]
fn test_entry_point_does_not_change_results() {
    let store = create_skewed_store();
    let (rare, common, uncommon, o) = (ex("rare"), ex("common"), ex("uncommon"), ex("o"));

    // The rare subject is the cheaper entry point.
    let by_subject = QuadPattern::any()
        .with_subject(rare.as_ref())
        .with_predicate(common.as_ref());
    // The uncommon predicate is the cheaper entry point.
    let by_predicate = QuadPattern::any()
        .with_subject(rare.as_ref())
        .with_predicate(uncommon.as_ref());
    // The object is as rare as the subject.
    let by_object = QuadPattern::any()
        .with_predicate(common.as_ref())
        .with_object(o.as_ref());

    assert_eq!(store.size_estimate(&by_subject), 2);
    assert_eq!(store.size_estimate(&by_predicate), 1);
    assert_eq!(sorted(store.iter(&by_subject)), brute_force(&store, &by_subject));
    assert_eq!(sorted(store.iter(&by_predicate)), brute_force(&store, &by_predicate));
    assert_eq!(sorted(store.iter(&by_subject)), sorted(store.iter(&by_object)));
    assert_eq!(store.size(&by_subject), 1);
}

#[test]
fn test_results_survive_removals() {
    let mut store = create_skewed_store();
    let common = ex("common");
    let s0 = ex("s0");

    assert!(store.remove(&QuadPattern::any().with_subject(s0.as_ref())));
    assert!(!store.remove(&QuadPattern::any().with_subject(s0.as_ref())));

    let by_predicate = QuadPattern::any().with_predicate(common.as_ref());
    assert_eq!(store.size(&by_predicate), 191);
    assert_eq!(sorted(store.iter(&by_predicate)), brute_force(&store, &by_predicate));
    store.validate().unwrap();
}

#[test]
fn test_distinct_positions() {
    let store = create_skewed_store();
    let rare = ex("rare");

    assert_eq!(store.subjects(&QuadPattern::any()).count(), 21);
    assert_eq!(store.predicates(&QuadPattern::any()).count(), 2);
    assert_eq!(
        store
            .predicates(&QuadPattern::any().with_subject(rare.as_ref()))
            .count(),
        2
    );
    assert_eq!(store.contexts(&QuadPattern::any()).count(), 3);
    assert_eq!(
        store
            .objects(&QuadPattern::any().with_subject(rare.as_ref()))
            .collect::<Vec<_>>(),
        [TermRef::from(ex("o").as_ref())]
    );
}

#[test]
fn test_unique_object() {
    let mut store = QuadStore::new();
    let (s, label) = (ex("s"), ex("label"));
    store
        .add(s.as_ref(), label.as_ref(), LiteralRef::new_simple_literal("Label").into(), &[])
        .unwrap();
    store.add(s.as_ref(), rdf::TYPE, ex("C").as_ref().into(), &[]).unwrap();
    store.add(s.as_ref(), rdf::TYPE, ex("D").as_ref().into(), &[]).unwrap();

    let labels = QuadPattern::any()
        .with_subject(s.as_ref())
        .with_predicate(label.as_ref());
    assert_eq!(
        store.object_literal(&labels).unwrap(),
        Some(LiteralRef::new_simple_literal("Label"))
    );
    assert_eq!(store.object_string(&labels).unwrap(), Some("Label"));
    assert!(matches!(
        store.object_iri(&labels),
        Err(StoreError::UnexpectedObject { .. })
    ));
    assert!(matches!(
        store.object_resource(&labels),
        Err(StoreError::UnexpectedObject { .. })
    ));

    let types = QuadPattern::any().with_predicate(rdf::TYPE);
    let error = store.object_value(&types).unwrap_err();
    assert!(matches!(error, StoreError::AmbiguousObject { .. }));
    assert!(!error.is_fatal());

    let nothing = QuadPattern::any().with_predicate(NamedNodeRef::new_unchecked(
        "http://example.com/nothing",
    ));
    assert_eq!(store.object_value(&nothing).unwrap(), None);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_filter_copies_matches() {
    let mut store = QuadStore::new();
    store.set_namespace("ex", "http://example.com/");
    let (a, b, g) = (ex("a"), ex("b"), ex("g"));
    store.add(a.as_ref(), rdf::TYPE, b.as_ref().into(), &[]).unwrap();
    store
        .add(
            b.as_ref(),
            rdf::VALUE,
            Literal::from(true).as_ref().into(),
            &[GraphNameRef::from(g.as_ref())],
        )
        .unwrap();
    store
        .add(b.as_ref(), rdf::TYPE, a.as_ref().into(), &[GraphNameRef::from(g.as_ref())])
        .unwrap();

    let filtered = store
        .filter(&QuadPattern::any().with_subject(b.as_ref()))
        .unwrap();

    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered.namespace("ex"), Some("http://example.com/"));
    filtered.validate().unwrap();
    assert_snapshot!(filtered, @r#"
    <http://example.com/b> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/a> <http://example.com/g> .
    <http://example.com/b> <http://www.w3.org/1999/02/22-rdf-syntax-ns#value> "true"^^<http://www.w3.org/2001/XMLSchema#boolean> <http://example.com/g> .
    "#);
}

#[test]
fn test_cursor_removal_across_sweeps() {
    let mut store = create_skewed_store();
    let common = ex("common");
    let g2 = ex("g2");
    let pattern = QuadPattern::any().with_predicate(common.as_ref());

    let mut visited = 0;
    let mut cursor = store.cursor(&pattern);
    while let Some(quad) = cursor.next_quad() {
        visited += 1;
        let in_g2 = quad.graph_name == GraphNameRef::from(g2.as_ref());
        if !in_g2 {
            assert!(cursor.remove());
        }
    }

    assert_eq!(visited, 201);
    assert_eq!(store.len(), 101);
    assert_eq!(store.size(&pattern), 100);
    let only_g2 = [GraphNameRef::from(g2.as_ref())];
    assert_eq!(store.size(&QuadPattern::any().in_contexts(&only_g2)), 100);
    store.validate().unwrap();
}
