use std::cmp::Ordering;

use super::types::{Direction, Layout, Point, SubgraphLayout};

/// Tiles independently laid out subgraphs into one coordinate space, widest first.
/// Top-bottom layouts place subgraphs side by side; left-right layouts stack them.
pub(crate) fn pack_subgraphs(
    mut subgraphs: Vec<SubgraphLayout>,
    direction: Direction,
    gap: f32,
) -> Layout {
    let component_count = subgraphs.len();
    subgraphs.sort_by(|a, b| b.width.partial_cmp(&a.width).unwrap_or(Ordering::Equal));

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut cursor = 0.0f32;
    let mut cross_extent = 0.0f32;
    let mut placed = 0usize;

    for subgraph in subgraphs {
        if subgraph.width <= 0.0 {
            continue;
        }
        let offset = match direction {
            Direction::TopBottom => Point::new(cursor, 0.0),
            Direction::LeftRight => Point::new(0.0, cursor),
        };
        let (main, cross) = match direction {
            Direction::TopBottom => (subgraph.width, subgraph.height),
            Direction::LeftRight => (subgraph.height, subgraph.width),
        };
        nodes.extend(subgraph.nodes.into_iter().map(|mut node| {
            node.position = node.position.offset(offset.x, offset.y);
            node
        }));
        edges.extend(subgraph.edges);
        cursor += main + gap;
        cross_extent = cross_extent.max(cross);
        placed += 1;
    }

    let main_extent = if placed > 0 { cursor - gap } else { 0.0 };
    let (width, height) = match direction {
        Direction::TopBottom => (main_extent, cross_extent),
        Direction::LeftRight => (cross_extent, main_extent),
    };

    Layout {
        direction,
        nodes,
        edges,
        width,
        height,
        component_count,
    }
}
