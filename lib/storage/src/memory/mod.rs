//! The in-memory quad store.
mod config;
mod handles;
mod iter;
mod planner;
mod statements;
mod store;

pub use config::QuadStoreConfig;
pub use iter::{QuadCursor, QuadIter};
pub use planner::QuadPattern;
pub use store::QuadStore;
