#![doc(test(attr(deny(warnings))))]

//! Maps RDF terms to compact 32-bit codes and back.
//!
//! The entry point is the [TermDictionary]. Small numeric, boolean and date literals are packed
//! directly into their [Code], all other terms are stored once in append-only arenas.

mod arena;
mod cache;
mod code;
mod config;
mod dictionary;
mod handler;
mod hash;
mod indexed;
mod intern;
mod metrics;
mod packing;

pub use code::{Code, CodedQuad};
pub use config::DictionaryConfig;
pub use dictionary::{DictionaryStats, TermDictionary};
pub use handler::{CodedQuadHandler, DecodingHandler, EncodingHandler, QuadHandler};
pub use metrics::{DictionaryMetrics, MetricsSnapshot};
pub use rdf_pipe_common::error::DictionaryError;
