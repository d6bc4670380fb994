use serde::{Deserialize, Serialize};

use crate::catalog::{Dependency, DiagramNode};

/// Viewport widths below this default to a left-to-right layout.
pub const NARROW_VIEWPORT_WIDTH: f32 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    #[serde(rename = "LR")]
    LeftRight,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" => Some(Self::TopBottom),
            "LR" => Some(Self::LeftRight),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::TopBottom => "TB",
            Self::LeftRight => "LR",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::TopBottom => Self::LeftRight,
            Self::LeftRight => Self::TopBottom,
        }
    }

    pub fn for_viewport_width(width: f32) -> Self {
        if width < NARROW_VIEWPORT_WIDTH {
            Self::LeftRight
        } else {
            Self::TopBottom
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    #[serde(flatten)]
    pub node: DiagramNode,
    pub layer: usize,
    pub position: Point,
}

impl PositionedNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }
}

/// One connected component after layering and coordinate assignment, in local coordinates.
#[derive(Debug, Clone, Default)]
pub struct SubgraphLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Dependency>,
    pub width: f32,
    pub height: f32,
}

/// Every component packed into one coordinate space.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub direction: Direction,
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Dependency>,
    pub width: f32,
    pub height: f32,
    pub component_count: usize,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }
}
