use serde::Serialize;

use crate::catalog::Dependency;

/// At most one node or one edge is selected at a time. Edges are held by their endpoint
/// pair since display ids like `e-a-b-c` can be shared by two different edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    Node(String),
    Edge(Dependency),
}

impl Selection {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn edge(&self) -> Option<&Dependency> {
        match self {
            Self::Edge(edge) => Some(edge),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
