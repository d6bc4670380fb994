use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use crate::catalog::{Dependency, DiagramNode};

#[derive(Debug, Clone, Default)]
pub(crate) struct GraphNode {
    pub(crate) incoming: Vec<usize>,
    pub(crate) outgoing: Vec<usize>,
    /// `None` until the node is reached by layering.
    pub(crate) layer: Option<usize>,
    in_degree: usize,
}

/// Index-based graph built fresh for every layout call and dropped afterwards.
#[derive(Debug, Clone, Default)]
pub(crate) struct RankGraph {
    pub(crate) nodes: Vec<GraphNode>,
}

impl RankGraph {
    /// Node indices follow the order of `nodes`. Edges with an unknown endpoint, self loops
    /// and repeated edges are ignored.
    pub(crate) fn build(nodes: &[DiagramNode], edges: &[Dependency]) -> Self {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect();
        let mut graph = vec![GraphNode::default(); nodes.len()];
        for edge in edges {
            let (Some(&from), Some(&to)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                continue;
            };
            if from == to || graph[from].outgoing.contains(&to) {
                continue;
            }
            graph[from].outgoing.push(to);
            graph[to].incoming.push(from);
            graph[to].in_degree += 1;
        }
        Self { nodes: graph }
    }

    /// Longest-path layering (Kahn's algorithm on in-degree). Nodes never reached because
    /// they sit on a cycle are placed one layer below the deepest reached node.
    pub(crate) fn assign_layers(&mut self) -> Vec<usize> {
        let mut queue: VecDeque<usize> = VecDeque::new();
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            if node.in_degree == 0 {
                node.layer = Some(0);
                queue.push_back(idx);
            }
        }

        while let Some(current) = queue.pop_front() {
            let next_layer = self.nodes[current].layer.unwrap_or(0) + 1;
            let outgoing = self.nodes[current].outgoing.clone();
            for next in outgoing {
                let node = &mut self.nodes[next];
                node.layer = Some(node.layer.map_or(next_layer, |layer| layer.max(next_layer)));
                node.in_degree = node.in_degree.saturating_sub(1);
                if node.in_degree == 0 {
                    queue.push_back(next);
                }
            }
        }

        let deepest = self.nodes.iter().filter_map(|node| node.layer).max();
        let cycle_layer = deepest.map_or(0, |layer| layer + 1);
        for node in &mut self.nodes {
            if node.layer.is_none() {
                node.layer = Some(cycle_layer);
            }
        }

        self.nodes
            .iter()
            .map(|node| node.layer.unwrap_or(cycle_layer))
            .collect()
    }
}

/// Groups node indices into layer buckets (lowest layer first, empty layers skipped)
/// keeping input order inside each bucket.
pub(crate) fn layer_buckets(layers: &[usize]) -> Vec<Vec<usize>> {
    let Some(max_layer) = layers.iter().copied().max() else {
        return Vec::new();
    };
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); max_layer + 1];
    for (idx, layer) in layers.iter().enumerate() {
        buckets[*layer].push(idx);
    }
    buckets.retain(|bucket| !bucket.is_empty());
    buckets
}

/// Barycenter crossing reduction. Each pass sweeps down (keys from predecessors) and
/// then up (keys from successors); buckets are stably sorted by key after every layer.
pub(crate) fn order_layers(graph: &RankGraph, buckets: &mut [Vec<usize>], passes: usize) {
    let mut positions: Vec<Option<usize>> = vec![None; graph.nodes.len()];
    if let Some(first) = buckets.first() {
        for (pos, idx) in first.iter().enumerate() {
            positions[*idx] = Some(pos);
        }
    }
    if buckets.len() <= 1 {
        return;
    }

    for _ in 0..passes {
        for rank in 1..buckets.len() {
            sort_bucket(graph, &mut buckets[rank], &mut positions, Sweep::Down);
        }
        for rank in (0..buckets.len() - 1).rev() {
            sort_bucket(graph, &mut buckets[rank], &mut positions, Sweep::Up);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Sweep {
    Down,
    Up,
}

fn sort_bucket(
    graph: &RankGraph,
    bucket: &mut Vec<usize>,
    positions: &mut [Option<usize>],
    sweep: Sweep,
) {
    let mut keyed: Vec<(f32, usize)> = bucket
        .iter()
        .map(|idx| {
            let node = &graph.nodes[*idx];
            let neighbors = match sweep {
                Sweep::Down => &node.incoming,
                Sweep::Up => &node.outgoing,
            };
            (barycenter(neighbors, positions), *idx)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    bucket.clear();
    bucket.extend(keyed.into_iter().map(|(_, idx)| idx));
    for (pos, idx) in bucket.iter().enumerate() {
        positions[*idx] = Some(pos);
    }
}

/// Mean position of the already placed neighbors, or -1 when none is placed.
fn barycenter(neighbors: &[usize], positions: &[Option<usize>]) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for neighbor in neighbors {
        if let Some(pos) = positions[*neighbor] {
            sum += pos as f32;
            count += 1;
        }
    }
    if count == 0 { -1.0 } else { sum / count as f32 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EntityKind;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> RankGraph {
        let nodes: Vec<DiagramNode> = ids
            .iter()
            .map(|id| DiagramNode::new(*id, EntityKind::Component))
            .collect();
        let edges: Vec<Dependency> = edges
            .iter()
            .map(|(from, to)| Dependency::new(*from, *to))
            .collect();
        RankGraph::build(&nodes, &edges)
    }

    #[test]
    fn diamond_layers() {
        let mut g = graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        assert_eq!(g.assign_layers(), vec![0, 1, 1, 2]);
    }

    #[test]
    fn longest_path_wins_over_short_edge() {
        let mut g = graph(&["a", "b", "c"], &[("a", "c"), ("a", "b"), ("b", "c")]);
        assert_eq!(g.assign_layers(), vec![0, 1, 2]);
    }

    #[test]
    fn cycles_terminate_with_a_layer_for_every_node() {
        let mut g = graph(
            &["R", "A", "B", "C"],
            &[("R", "A"), ("A", "B"), ("B", "C"), ("C", "A")],
        );
        let layers = g.assign_layers();
        assert_eq!(layers, vec![0, 1, 2, 2]);
    }

    #[test]
    fn pure_cycle_starts_at_layer_zero() {
        let mut g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert_eq!(g.assign_layers(), vec![0, 0]);
    }

    #[test]
    fn duplicate_edges_do_not_stall_layering() {
        let mut g = graph(&["a", "b"], &[("a", "b"), ("a", "b")]);
        assert_eq!(g.assign_layers(), vec![0, 1]);
    }

    #[test]
    fn barycenter_untangles_crossed_pair() {
        let mut g = graph(&["a", "b", "x", "y"], &[("a", "y"), ("b", "x")]);
        let layers = g.assign_layers();
        let mut buckets = layer_buckets(&layers);
        assert_eq!(buckets, vec![vec![0, 1], vec![2, 3]]);
        order_layers(&g, &mut buckets, 8);
        assert_eq!(buckets, vec![vec![0, 1], vec![3, 2]]);
    }

    #[test]
    fn ordering_is_deterministic() {
        let ids = ["r", "a", "b", "c", "d", "e", "f"];
        let edges = [
            ("r", "a"),
            ("r", "b"),
            ("r", "c"),
            ("a", "f"),
            ("b", "d"),
            ("c", "e"),
            ("a", "d"),
            ("c", "f"),
        ];
        let run = || {
            let mut g = graph(&ids, &edges);
            let layers = g.assign_layers();
            let mut buckets = layer_buckets(&layers);
            order_layers(&g, &mut buckets, 8);
            buckets
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn nodes_without_predecessors_sort_first() {
        let mut g = graph(&["a", "b", "c", "d"], &[("a", "c"), ("b", "d"), ("c", "d")]);
        let layers = g.assign_layers();
        assert_eq!(layers, vec![0, 0, 1, 2]);
        let mut buckets = layer_buckets(&layers);
        order_layers(&g, &mut buckets, 1);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[1], vec![2]);

        // C's only predecessor B is unplaced during the first down sweep, so C keys at -1
        // and moves ahead of B.
        let mut g = graph(
            &["R", "A", "B", "C"],
            &[("R", "A"), ("A", "B"), ("B", "C"), ("C", "A")],
        );
        let layers = g.assign_layers();
        let mut buckets = layer_buckets(&layers);
        assert_eq!(buckets, vec![vec![0], vec![1], vec![2, 3]]);
        order_layers(&g, &mut buckets, 1);
        assert_eq!(buckets, vec![vec![0], vec![1], vec![3, 2]]);
    }
}
