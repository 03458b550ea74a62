#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod error;
mod loader;

pub use loader::StoreLoader;

pub mod model {
    pub use rdf_pipe_model::*;
}

pub mod dictionary {
    pub use rdf_pipe_dictionary::*;
}

pub mod storage {
    pub use rdf_pipe_storage::*;
}
