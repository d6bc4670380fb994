mod components;
mod packing;
mod position;
mod ranking;
pub(crate) mod types;

pub use components::{Component, split_components};
pub use types::*;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::catalog::{Dependency, DependencyGraph, DiagramNode};
use crate::config::LayoutConfig;
use packing::pack_subgraphs;
use position::assign_coordinates;
use ranking::{RankGraph, layer_buckets, order_layers};

/// Lays out a whole catalog graph: components are laid out independently and then packed
/// side by side (top-bottom) or stacked (left-right).
pub fn compute_layout(graph: &DependencyGraph, direction: Direction, config: &LayoutConfig) -> Layout {
    let edges = graph.resolved_edges();
    let dropped = graph.edges.len() - edges.len();
    if dropped > 0 {
        debug!(dropped, "ignoring edges with unknown endpoints");
    }

    let components = split_components(&graph.nodes, &edges);
    debug!(
        nodes = graph.nodes.len(),
        edges = edges.len(),
        components = components.len(),
        direction = direction.token(),
        "computing layout"
    );

    let subgraphs: Vec<SubgraphLayout> = components
        .into_iter()
        .map(|component| layout_subgraph(&component.nodes, &component.edges, direction, config))
        .collect();
    let layout = pack_subgraphs(subgraphs, direction, config.component_gap);
    debug!(
        width = layout.width,
        height = layout.height,
        "packed components"
    );
    layout
}

/// Lays out a graph as a single block without component packing. Used for the focused view
/// of one entity, which is connected by construction.
pub fn compute_focus_layout(
    graph: &DependencyGraph,
    direction: Direction,
    config: &LayoutConfig,
) -> Layout {
    let edges = graph.resolved_edges();
    let subgraph = layout_subgraph(&graph.nodes, &edges, direction, config);
    Layout {
        direction,
        nodes: subgraph.nodes,
        edges: subgraph.edges,
        width: subgraph.width,
        height: subgraph.height,
        component_count: usize::from(!graph.nodes.is_empty()),
    }
}

/// Layered placement of one subgraph in local coordinates: longest-path layering,
/// barycenter ordering, then centered rows or columns.
pub fn layout_subgraph(
    nodes: &[DiagramNode],
    edges: &[Dependency],
    direction: Direction,
    config: &LayoutConfig,
) -> SubgraphLayout {
    if nodes.is_empty() {
        return SubgraphLayout::default();
    }

    let mut graph = RankGraph::build(nodes, edges);
    let layers = graph.assign_layers();
    let mut buckets = layer_buckets(&layers);
    order_layers(&graph, &mut buckets, config.order_passes);
    trace!(layers = buckets.len(), nodes = nodes.len(), "ordered layers");

    let placement = assign_coordinates(&buckets, nodes.len(), direction, config);
    let positioned = nodes
        .iter()
        .zip(layers)
        .zip(placement.positions)
        .map(|((node, layer), position)| PositionedNode {
            node: node.clone(),
            layer,
            position,
        })
        .collect();

    SubgraphLayout {
        nodes: positioned,
        edges: edges.to_vec(),
        width: placement.width,
        height: placement.height,
    }
}

/// Which layout entry point a cached result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutMode {
    #[default]
    Packed,
    Focus,
}

/// Single-entry memo keyed on graph identity, direction and layout constants. Repeated
/// requests for the same input return the previous layout without recomputing it.
#[derive(Debug, Default)]
pub struct LayoutCache {
    key: Option<u64>,
    layout: Layout,
    hits: usize,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        graph: &DependencyGraph,
        direction: Direction,
        mode: LayoutMode,
        config: &LayoutConfig,
    ) -> &Layout {
        let key = layout_key(graph, direction, mode, config);
        if self.key == Some(key) {
            self.hits += 1;
            trace!(hits = self.hits, "layout cache hit");
        } else {
            self.layout = match mode {
                LayoutMode::Packed => compute_layout(graph, direction, config),
                LayoutMode::Focus => compute_focus_layout(graph, direction, config),
            };
            self.key = Some(key);
        }
        &self.layout
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

fn layout_key(
    graph: &DependencyGraph,
    direction: Direction,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    graph.hash(&mut hasher);
    direction.hash(&mut hasher);
    mode.hash(&mut hasher);
    for value in [
        config.node_width,
        config.node_height,
        config.horizontal_gap,
        config.vertical_gap,
        config.component_gap,
    ] {
        value.to_bits().hash(&mut hasher);
    }
    config.order_passes.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityKind;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        DependencyGraph::new(
            ids.iter()
                .map(|id| DiagramNode::new(*id, EntityKind::Component))
                .collect(),
            edges
                .iter()
                .map(|(from, to)| Dependency::new(*from, *to))
                .collect(),
        )
    }

    fn diamond() -> DependencyGraph {
        graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        )
    }

    #[test]
    fn diamond_layers_and_distinct_positions() {
        let layout = compute_layout(&diamond(), Direction::TopBottom, &LayoutConfig::default());
        let layer = |id: &str| layout.node(id).map(|node| node.layer);
        assert_eq!(layer("A"), Some(0));
        assert_eq!(layer("B"), Some(1));
        assert_eq!(layer("C"), Some(1));
        assert_eq!(layer("D"), Some(2));
        let b = layout.node("B").map(|node| node.position);
        let c = layout.node("C").map(|node| node.position);
        assert_ne!(b, c);
        assert_eq!(layout.component_count, 1);
    }

    #[test]
    fn coordinates_stay_inside_bounds() {
        let config = LayoutConfig::default();
        for direction in [Direction::TopBottom, Direction::LeftRight] {
            let layout = compute_layout(&diamond(), direction, &config);
            for node in &layout.nodes {
                assert!(node.position.x >= 0.0 && node.position.y >= 0.0);
                assert!(node.position.x + config.node_width <= layout.width + 0.01);
                assert!(node.position.y + config.node_height <= layout.height + 0.01);
            }
        }
    }

    #[test]
    fn left_right_spreads_layers_horizontally() {
        let layout = compute_layout(&diamond(), Direction::LeftRight, &LayoutConfig::default());
        let x = |id: &str| layout.node(id).map(|node| node.position.x).unwrap_or(-1.0);
        assert!(x("A") < x("B"));
        assert_eq!(x("B"), x("C"));
        assert!(x("C") < x("D"));
    }

    #[test]
    fn disjoint_pairs_are_packed_side_by_side() {
        let config = LayoutConfig::default();
        let layout = compute_layout(
            &graph(&["X", "Y", "Z", "W"], &[("X", "Y"), ("Z", "W")]),
            Direction::TopBottom,
            &config,
        );
        assert_eq!(layout.component_count, 2);
        assert_eq!(layout.edges.len(), 2);
        assert_eq!(layout.width, 2.0 * config.node_width + config.component_gap);
        let z = layout.node("Z").map(|node| node.position.x);
        assert_eq!(z, Some(config.node_width + config.component_gap));
    }

    #[test]
    fn dangling_edges_are_dropped_before_layout() {
        let layout = compute_layout(
            &graph(&["a"], &[("a", "ghost")]),
            Direction::TopBottom,
            &LayoutConfig::default(),
        );
        assert_eq!(layout.nodes.len(), 1);
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn empty_graph_is_empty_layout() {
        let layout = compute_layout(
            &DependencyGraph::default(),
            Direction::TopBottom,
            &LayoutConfig::default(),
        );
        assert!(layout.is_empty());
        assert_eq!((layout.width, layout.height), (0.0, 0.0));
    }

    #[test]
    fn focus_layout_is_a_single_block() {
        let layout = compute_focus_layout(
            &graph(&["center", "a", "b"], &[("center", "a"), ("b", "center")]),
            Direction::TopBottom,
            &LayoutConfig::default(),
        );
        assert_eq!(layout.component_count, 1);
        assert_eq!(layout.node("b").map(|node| node.layer), Some(0));
        assert_eq!(layout.node("a").map(|node| node.layer), Some(2));
    }

    #[test]
    fn cache_reuses_layout_until_input_changes() {
        let config = LayoutConfig::default();
        let mut cache = LayoutCache::new();
        let graph = diamond();
        let first = cache
            .get(&graph, Direction::TopBottom, LayoutMode::Packed, &config)
            .clone();
        let second = cache
            .get(&graph, Direction::TopBottom, LayoutMode::Packed, &config)
            .clone();
        assert_eq!(cache.hits(), 1);
        assert_eq!(first.nodes, second.nodes);

        let flipped = cache.get(&graph, Direction::LeftRight, LayoutMode::Packed, &config);
        assert_eq!(flipped.direction, Direction::LeftRight);
        assert_eq!(cache.hits(), 1);
    }
}
