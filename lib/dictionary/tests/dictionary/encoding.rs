use crate::{example_iri, example_quad, example_quad_in_graph, example_terms};
use insta::assert_snapshot;
use rdf_pipe_dictionary::{Code, CodedQuad, DictionaryError, TermDictionary};
use rdf_pipe_model::vocab::xsd;
use rdf_pipe_model::{GraphNameRef, Literal, LiteralRef, NamedNodeRef, Term, TermRef};

#[test]
fn encode_then_decode_all_kinds() {
    let dictionary = TermDictionary::new();
    for term in example_terms() {
        let code = dictionary.encode(term.as_ref()).unwrap();
        assert_eq!(dictionary.decode(code).unwrap(), term);
        assert_eq!(dictionary.encode(term.as_ref()).unwrap(), code);
    }
}

#[test]
fn distinct_terms_have_distinct_codes() {
    let dictionary = TermDictionary::new();
    let codes = example_terms()
        .iter()
        .map(|term| dictionary.encode(term.as_ref()).unwrap())
        .collect::<Vec<_>>();
    let mut unique = codes.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), codes.len());
}

#[test]
fn restricted_integer_is_packed() {
    let dictionary = TermDictionary::new();
    let term = LiteralRef::new_typed_literal("42", xsd::NON_NEGATIVE_INTEGER);

    let code = dictionary.encode(term.into()).unwrap();

    assert!(code.is_embedded());
    assert_eq!(dictionary.decode(code).unwrap(), Term::from(term.into_owned()));
    assert_eq!(dictionary.stats().values, 0);
}

#[test]
fn huge_integer_falls_back_to_the_arena() {
    let dictionary = TermDictionary::new();
    let term = LiteralRef::new_typed_literal("99999999999999999999", xsd::INTEGER);

    let code = dictionary.encode(term.into()).unwrap();

    assert!(code.is_indexed());
    assert_eq!(dictionary.decode(code).unwrap(), Term::from(term.into_owned()));
    assert_eq!(dictionary.stats().values, 1);
}

#[test]
fn language_tags_and_datatypes_distinguish_literals() {
    let dictionary = TermDictionary::new();
    let terms: [Term; 4] = [
        Literal::new_simple_literal("1").into(),
        Literal::new_language_tagged_literal_unchecked("1", "en").into(),
        Literal::new_language_tagged_literal_unchecked("1", "de").into(),
        Literal::new_typed_literal("1", NamedNodeRef::new_unchecked("http://example.com/dt"))
            .into(),
    ];
    let codes = terms.each_ref().map(|term| dictionary.encode(term.as_ref()).unwrap());
    for (i, code) in codes.iter().enumerate() {
        assert!(!codes[..i].contains(code));
        assert_eq!(dictionary.decode(*code).unwrap(), terms[i]);
    }
}

#[test]
fn long_values_round_trip() {
    let dictionary = TermDictionary::new();
    let value = "a very long literal ".repeat(1000);
    let term = Term::from(Literal::new_simple_literal(value));

    let code = dictionary.encode(term.as_ref()).unwrap();

    assert_eq!(dictionary.decode(code).unwrap(), term);
    assert!(dictionary.stats().secondary_bytes > 20_000);
}

#[test]
fn quads_round_trip() {
    let dictionary = TermDictionary::new();
    for quad in [example_quad(), example_quad_in_graph("graph")] {
        let coded = dictionary.encode_quad(quad.as_ref()).unwrap();
        assert_eq!(dictionary.decode_quad(coded).unwrap(), quad);
    }
}

#[test]
fn default_graph_is_encoded_as_null() {
    let dictionary = TermDictionary::new();
    let coded = dictionary.encode_quad(example_quad().as_ref()).unwrap();
    assert_eq!(coded.graph_name, Code::NULL);
    assert!(dictionary
        .encode_graph_name(GraphNameRef::NamedNode(example_iri("graph").as_ref()))
        .unwrap()
        .is_indexed());
}

#[test]
fn literal_predicate_is_rejected() {
    let dictionary = TermDictionary::new();
    let iri = dictionary.encode(example_iri("s").as_ref().into()).unwrap();
    let literal = dictionary
        .encode(LiteralRef::new_simple_literal("p").into())
        .unwrap();

    let result = dictionary.decode_quad(CodedQuad::new(iri, literal, iri, Code::NULL));

    assert_snapshot!(
        result.unwrap_err(),
        @r#"Expected an IRI as the predicate of a quad, found "p""#
    );
}

#[test]
fn codes_of_another_dictionary_are_rejected() {
    let first = TermDictionary::new();
    let second = TermDictionary::new();
    let code = first
        .encode(TermRef::from(example_iri("only-in-first").as_ref()))
        .unwrap();

    assert!(matches!(
        second.decode(code),
        Err(DictionaryError::UnknownCode(_))
    ));
}

#[test]
fn stats_report_sizes_and_calls() {
    let dictionary = TermDictionary::new();
    let iri = dictionary.encode(example_iri("a").as_ref().into()).unwrap();
    dictionary
        .encode(LiteralRef::new_language_tagged_literal_unchecked("hello", "en").into())
        .unwrap();
    let number = dictionary
        .encode(LiteralRef::new_typed_literal("42", xsd::INT).into())
        .unwrap();
    dictionary.decode(iri).unwrap();
    dictionary.decode(number).unwrap();

    assert_snapshot!(
        dictionary.stats(),
        @"1 namespaces, 1 languages, 26 datatypes, 2 values, 4096 table bytes, 21 primary bytes, 0 secondary bytes, 3 encode calls (1 embedded, 0 cached, 2 indexed), 2 decode calls (1 embedded, 0 cached, 1 indexed)"
    );
    assert_eq!(dictionary.to_string(), dictionary.stats().to_string());
}
