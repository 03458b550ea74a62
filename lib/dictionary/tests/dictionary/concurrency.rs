use crate::{example_iri, example_terms};
use rdf_pipe_dictionary::{Code, TermDictionary};
use rdf_pipe_model::{Literal, Term};
use std::thread;

fn worker_terms(worker: usize) -> Vec<Term> {
    (0..500)
        .map(|i| match i % 3 {
            0 => example_iri(&format!("shared/{i}")).into(),
            1 => Literal::new_simple_literal(format!("shared {i}")).into(),
            _ => Literal::new_language_tagged_literal_unchecked(format!("worker {worker}"), "en")
                .into(),
        })
        .collect()
}

#[test]
fn concurrent_encoders_agree_on_codes() {
    let dictionary = TermDictionary::new();

    let results: Vec<Vec<Code>> = thread::scope(|scope| {
        let handles = (0..8)
            .map(|worker| {
                let dictionary = &dictionary;
                scope.spawn(move || {
                    worker_terms(worker)
                        .iter()
                        .map(|term| dictionary.encode(term.as_ref()).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for (worker, codes) in results.iter().enumerate() {
        for (term, code) in worker_terms(worker).iter().zip(codes) {
            assert_eq!(&dictionary.decode(*code).unwrap(), term);
            assert_eq!(dictionary.try_encode(term.as_ref()), Some(*code));
        }
    }
    // 334 shared terms plus one language-tagged literal per worker.
    assert_eq!(dictionary.stats().values, 334 + 8);
}

#[test]
fn fork_keeps_existing_codes() {
    let parent = TermDictionary::new();
    let existing = example_terms()
        .iter()
        .map(|term| parent.encode(term.as_ref()).unwrap())
        .collect::<Vec<_>>();

    let fork = parent.fork();

    for (term, code) in example_terms().iter().zip(&existing) {
        assert_eq!(&fork.decode(*code).unwrap(), term);
        assert_eq!(fork.encode(term.as_ref()).unwrap(), *code);
    }
    assert_eq!(fork.stats().values, parent.stats().values);
    assert_eq!(fork.metrics().snapshot().decode_calls(), existing.len() as u64);
}

#[test]
fn forks_grow_independently() {
    let parent = TermDictionary::new();
    parent.encode(example_iri("base").as_ref().into()).unwrap();
    let fork = parent.fork();

    let only_in_fork = example_iri("fork");
    let fork_code = fork.encode(only_in_fork.as_ref().into()).unwrap();
    let parent_code = parent
        .encode(example_iri("parent").as_ref().into())
        .unwrap();

    assert_eq!(parent.try_encode(only_in_fork.as_ref().into()), None);
    assert_eq!(fork.try_encode(example_iri("parent").as_ref().into()), None);
    // Both sides assigned the next free code to their own term.
    assert_eq!(fork_code, parent_code);
    assert_eq!(
        fork.decode(fork_code).unwrap(),
        Term::from(only_in_fork)
    );
}

#[test]
fn forked_workers_run_in_parallel() {
    let parent = TermDictionary::new();
    for term in example_terms() {
        parent.encode(term.as_ref()).unwrap();
    }

    let forks = (0..4).map(|_| parent.fork()).collect::<Vec<_>>();
    thread::scope(|scope| {
        for (worker, fork) in forks.iter().enumerate() {
            scope.spawn(move || {
                for term in worker_terms(worker) {
                    let code = fork.encode(term.as_ref()).unwrap();
                    assert_eq!(fork.decode(code).unwrap(), term);
                }
            });
        }
    });

    let parent_values = parent.stats().values;
    for fork in &forks {
        assert_eq!(fork.stats().values, parent_values + 335);
    }
}
