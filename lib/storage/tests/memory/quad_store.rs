use crate::{ex, example_quad, example_quad_in_graph};
use rdf_pipe_model::vocab::rdf;
use rdf_pipe_model::{GraphNameRef, Literal, LiteralRef, NamedNodeRef};
use rdf_pipe_storage::memory::{QuadPattern, QuadStore, QuadStoreConfig};

#[test]
fn test_insert_quad() {
    let mut store = QuadStore::new();

    let inserted = store.extend(vec![example_quad()]).unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_insert_duplicate_quads_no_effect() {
    let mut store = QuadStore::new();

    store.extend(vec![example_quad()]).unwrap();

    let inserted = store.extend(vec![example_quad()]).unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_insert_duplicate_quads_in_same_operation() {
    let mut store = QuadStore::new();

    let inserted = store.extend(vec![example_quad(), example_quad()]).unwrap();

    assert_eq!(inserted, 1);
}

#[test]
fn test_remove_quad() {
    let mut store = QuadStore::new();
    let quad = example_quad_in_graph("http://example.com/g");

    store.extend(vec![quad.clone()]).unwrap();
    assert!(store.remove_quad(quad.as_ref()));
    assert!(!store.remove_quad(quad.as_ref()));

    assert_eq!(store.len(), 0);
    store.validate().unwrap();
}

#[test]
fn test_remove_missing_quad_is_unchanged() {
    let mut store = QuadStore::new();
    store.extend(vec![example_quad()]).unwrap();

    assert!(!store.remove_quad(example_quad_in_graph("http://example.com/g").as_ref()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_clear_graph() {
    let mut store = QuadStore::new();

    let g1 = "http://example.com/g1";
    let g2 = "http://example.com/g2";
    store
        .extend(vec![example_quad_in_graph(g1), example_quad_in_graph(g2)])
        .unwrap();

    let contexts = [GraphNameRef::from(NamedNodeRef::new_unchecked(g1))];
    assert!(store.remove(&QuadPattern::any().in_contexts(&contexts)));

    assert_eq!(store.len(), 1);
    assert!(store.contains(example_quad_in_graph(g2).as_ref()));
    store.validate().unwrap();
}

#[test]
fn test_wildcard_remove_clears() {
    let mut store = QuadStore::new();
    store
        .extend(vec![example_quad(), example_quad_in_graph("http://example.com/g")])
        .unwrap();

    assert!(store.remove(&QuadPattern::any()));
    assert!(!store.remove(&QuadPattern::any()));
    assert!(store.is_empty());
}

#[test]
fn test_concrete_scenario() {
    let mut store = QuadStore::new();
    let (a, g1, g2) = (ex("a"), ex("g1"), ex("g2"));
    store
        .add(
            a.as_ref(),
            rdf::TYPE,
            ex("Foo").as_ref().into(),
            &[GraphNameRef::from(g1.as_ref())],
        )
        .unwrap();
    store
        .add(
            a.as_ref(),
            rdf::TYPE,
            ex("Bar").as_ref().into(),
            &[GraphNameRef::from(g2.as_ref())],
        )
        .unwrap();

    let a_type = QuadPattern::any().with_subject(a.as_ref()).with_predicate(rdf::TYPE);
    assert_eq!(store.size(&a_type), 2);
    let in_g1 = [GraphNameRef::from(g1.as_ref())];
    assert_eq!(store.size(&QuadPattern::any().in_contexts(&in_g1)), 1);

    let foo = ex("Foo");
    let removed = store.remove(&a_type.with_object(foo.as_ref()).in_contexts(&in_g1));
    assert!(removed);
    assert_eq!(store.size(&QuadPattern::any()), 1);
    store.validate().unwrap();
}

#[test]
fn test_add_to_default_and_named_graph() {
    let mut store = QuadStore::new();
    let (s, g) = (ex("s"), ex("g"));
    let contexts = [GraphNameRef::DefaultGraph, g.as_ref().into()];

    assert!(store
        .add(
            s.as_ref(),
            rdf::VALUE,
            LiteralRef::new_simple_literal("v").into(),
            &contexts
        )
        .unwrap());

    assert_eq!(store.len(), 2);
    let default_graph = [GraphNameRef::DefaultGraph];
    assert_eq!(
        store.size(&QuadPattern::any().in_contexts(&default_graph)),
        1
    );
}

#[test]
fn test_many_quads_with_small_initial_capacity() {
    let config = QuadStoreConfig::default()
        .with_initial_term_capacity(1)
        .with_initial_statement_capacity(1);
    let mut store = QuadStore::with_config(config);
    for i in 0..5000 {
        store
            .add(
                ex(&format!("s{}", i % 100)).as_ref(),
                rdf::VALUE,
                Literal::from(i).as_ref().into(),
                &[],
            )
            .unwrap();
    }
    for i in (0..5000).step_by(3) {
        let object = Literal::from(i);
        let subject = ex(&format!("s{}", i % 100));
        let pattern = QuadPattern::any()
            .with_subject(subject.as_ref())
            .with_object(object.as_ref());
        assert!(store.remove(&pattern));
    }

    assert_eq!(store.len(), 5000 - 1667);
    store.validate().unwrap();
}

#[test]
fn test_namespaces() {
    let mut store = QuadStore::new();

    assert_eq!(store.set_namespace("ex", "http://example.com/"), None);
    assert_eq!(
        store.set_namespace("ex", "http://example.org/").as_deref(),
        Some("http://example.com/")
    );
    store.set_namespace("rdf", rdf::TYPE.as_str().trim_end_matches("type"));

    assert_eq!(store.namespace("ex"), Some("http://example.org/"));
    assert_eq!(
        store.namespaces().collect::<Vec<_>>(),
        [
            ("ex", "http://example.org/"),
            ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
        ]
    );
    assert_eq!(
        store.remove_namespace("ex").as_deref(),
        Some("http://example.org/")
    );
    assert_eq!(store.namespace("ex"), None);
    assert!(store.is_empty());
}
