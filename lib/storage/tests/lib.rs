use rdf_pipe_model::{GraphName, GraphNameRef, Literal, NamedNode, Quad, Subject, Term};
use rdf_pipe_storage::memory::QuadStore;

mod memory;

fn ex(local_name: &str) -> NamedNode {
    NamedNode::new(format!("http://example.com/{local_name}")).unwrap()
}

fn example_quad() -> Quad {
    Quad::new(
        Subject::NamedNode(ex("subject")),
        ex("predicate"),
        Term::Literal(Literal::new_simple_literal("value")),
        GraphName::DefaultGraph,
    )
}

fn example_quad_in_graph(graph: &str) -> Quad {
    Quad::new(
        Subject::NamedNode(ex("subject")),
        ex("predicate"),
        Term::Literal(Literal::new_simple_literal("value")),
        GraphName::NamedNode(NamedNode::new(graph).unwrap()),
    )
}

/// A store with a frequent predicate and a few rare subjects, spread over two graphs.
fn create_skewed_store() -> QuadStore {
    let mut store = QuadStore::new();
    let common = ex("common");
    for i in 0..200 {
        let subject = ex(&format!("s{}", i % 20));
        let graph = if i % 2 == 0 { ex("g1") } else { ex("g2") };
        store
            .add(
                subject.as_ref(),
                common.as_ref(),
                Literal::from(i).as_ref().into(),
                &[GraphNameRef::from(graph.as_ref())],
            )
            .unwrap();
    }
    store
        .add(
            ex("rare").as_ref(),
            common.as_ref(),
            ex("o").as_ref().into(),
            &[],
        )
        .unwrap();
    store
        .add(
            ex("rare").as_ref(),
            ex("uncommon").as_ref(),
            ex("o").as_ref().into(),
            &[],
        )
        .unwrap();
    store
}
