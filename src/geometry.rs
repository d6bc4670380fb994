//! Edge anchoring between node boxes.
//!
//! An edge leaves its source box and enters its target box on facing sides. The pair of
//! sides is chosen from the displacement between the two box centers: a mostly horizontal
//! displacement uses the left/right sides, anything else uses top/bottom.

use serde::Serialize;

use crate::layout::{Point, Size};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeBox {
    pub position: Point,
    pub size: Size,
}

impl NodeBox {
    pub fn new(position: Point, size: Size) -> Self {
        Self { position, size }
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.position.x
            && point.x <= self.right()
            && point.y >= self.position.y
            && point.y <= self.bottom()
    }

    /// Midpoint of one side.
    pub fn anchor(&self, side: Side) -> Point {
        let center = self.center();
        match side {
            Side::Left => Point::new(self.position.x, center.y),
            Side::Right => Point::new(self.right(), center.y),
            Side::Top => Point::new(center.x, self.position.y),
            Side::Bottom => Point::new(center.x, self.bottom()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeAnchors {
    pub source: Point,
    pub target: Point,
    pub source_side: Side,
    pub target_side: Side,
}

/// Picks facing sides of `source` and `target`. `tolerance` biases the choice towards
/// top/bottom anchoring: left/right is used only when `|dx| > |dy| * tolerance`.
pub fn edge_anchors(source: &NodeBox, target: &NodeBox, tolerance: f32) -> EdgeAnchors {
    let from = source.center();
    let to = target.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    let (source_side, target_side) = if dx.abs() > dy.abs() * tolerance {
        if dx > 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy > 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    };

    EdgeAnchors {
        source: source.anchor(source_side),
        target: target.anchor(target_side),
        source_side,
        target_side,
    }
}

/// Straight edge segment as drawn, already shortened at the target end for the arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgePath {
    pub start: Point,
    pub end: Point,
}

impl EdgePath {
    /// Pulls the target end back by `offset` along the segment. A zero-length segment is
    /// left untouched.
    pub fn shortened(anchors: &EdgeAnchors, offset: f32) -> Self {
        let dx = anchors.target.x - anchors.source.x;
        let dy = anchors.target.y - anchors.source.y;
        let length = dx.hypot(dy);
        let (ux, uy) = if length > 0.0 {
            (dx / length, dy / length)
        } else {
            (0.0, 0.0)
        };
        Self {
            start: anchors.source,
            end: Point::new(anchors.target.x - ux * offset, anchors.target.y - uy * offset),
        }
    }

    pub fn svg_d(&self) -> String {
        format!(
            "M {:.2} {:.2} L {:.2} {:.2}",
            self.start.x, self.start.y, self.end.x, self.end.y
        )
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Shortest distance from `point` to the segment.
    pub fn distance_to(&self, point: Point) -> f32 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.start.distance(point);
        }
        let t = (((point.x - self.start.x) * dx + (point.y - self.start.y) * dy) / len_sq)
            .clamp(0.0, 1.0);
        Point::new(self.start.x + t * dx, self.start.y + t * dy).distance(point)
    }

    /// Whether `point` lies under a stroke of `stroke_width` drawn along the segment.
    pub fn hit_test(&self, point: Point, stroke_width: f32) -> bool {
        self.distance_to(point) <= stroke_width / 2.0
    }
}
