mod component;
pub mod error;

pub use component::QuadComponent;
