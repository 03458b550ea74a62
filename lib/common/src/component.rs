use std::fmt::{Display, Formatter};

/// One of the four positions of a quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QuadComponent {
    Subject,
    Predicate,
    Object,
    GraphName,
}

impl Display for QuadComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QuadComponent::Subject => "subject",
            QuadComponent::Predicate => "predicate",
            QuadComponent::Object => "object",
            QuadComponent::GraphName => "graph name",
        })
    }
}
