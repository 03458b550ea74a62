#![doc(test(attr(deny(warnings))))]

//! Contains the storage layer of RDF Pipe: an in-memory quad store indexed by all four
//! positions of a quad.

pub mod memory;

pub use rdf_pipe_common::error::StoreError;
